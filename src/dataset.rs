// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! LIAR corpus loading and label handling
//!
//! The LIAR dataset ships as tab-separated files with a fixed 14-column
//! schema. A missing file or a first line with the wrong arity is fatal;
//! individually malformed lines are skipped with a warning.

use anyhow::{bail, Context, Result};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Column count of the LIAR schema.
pub const EXPECTED_COLUMNS: usize = 14;

/// One labeled statement from the corpus.
#[derive(Debug, Clone)]
pub struct Record {
    /// Statement identifier (e.g. `2635.json`).
    pub id: String,
    /// Six-way truthfulness label.
    pub label: String,
    /// Claim text to classify.
    pub statement: String,
    pub subject: String,
    pub speaker: String,
    pub job: String,
    pub state: String,
    pub party: String,
    /// Speaker history counts, in schema order.
    pub barely_true_counts: u32,
    pub false_counts: u32,
    pub half_true_counts: u32,
    pub mostly_true_counts: u32,
    pub pants_on_fire_counts: u32,
    pub context: String,
}

/// Bidirectional mapping between label strings and dense codes `0..k-1`.
///
/// Codes follow the sorted order of the distinct labels, which also fixes
/// the confusion-matrix row/column order.
#[derive(Debug, Clone)]
pub struct LabelSpace {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelSpace {
    /// Build the label space from the distinct labels observed in `records`.
    pub fn from_records(records: &[Record]) -> Self {
        let names: Vec<&str> = records.iter().map(|r| r.label.as_str()).collect();
        Self::from_names(&names)
    }

    /// Build a label space from explicit names (sorted, deduplicated).
    pub fn from_names(names: &[&str]) -> Self {
        let set: BTreeSet<&str> = names.iter().copied().collect();
        let names: Vec<String> = set.into_iter().map(str::to_string).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self { names, index }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.names.get(code).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Labels in canonical (sorted) order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A loaded corpus plus its label space.
#[derive(Debug, Clone)]
pub struct Corpus {
    pub records: Vec<Record>,
    pub labels: LabelSpace,
}

impl Corpus {
    /// Count records per label string, sorted by label.
    pub fn label_distribution(records: &[Record]) -> BTreeMap<String, usize> {
        let mut dist = BTreeMap::new();
        for record in records {
            *dist.entry(record.label.clone()).or_insert(0) += 1;
        }
        dist
    }
}

/// Load a LIAR-format TSV corpus.
///
/// The first line fixes the table arity and must have exactly
/// [`EXPECTED_COLUMNS`] fields. Later lines that deviate, or whose history
/// counts fail to parse, are skipped with a warning.
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let file =
        File::open(path).with_context(|| format!("failed to open dataset: {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut arity_checked = false;

    for (idx, line) in reader.lines().enumerate() {
        let line =
            line.with_context(|| format!("failed to read line {} in {}", idx + 1, path.display()))?;
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();

        if !arity_checked {
            if fields.len() != EXPECTED_COLUMNS {
                bail!(
                    "schema mismatch in {}: expected {} columns, found {}",
                    path.display(),
                    EXPECTED_COLUMNS,
                    fields.len()
                );
            }
            arity_checked = true;
        } else if fields.len() != EXPECTED_COLUMNS {
            tracing::warn!(
                "skipping malformed line {} in {}: {} fields",
                idx + 1,
                path.display(),
                fields.len()
            );
            continue;
        }

        match parse_record(&fields) {
            Some(record) => records.push(record),
            None => {
                tracing::warn!(
                    "skipping malformed line {} in {}: unparseable history counts",
                    idx + 1,
                    path.display()
                );
            }
        }
    }

    if records.is_empty() {
        bail!("dataset {} contains no usable rows", path.display());
    }

    let labels = LabelSpace::from_records(&records);
    Ok(Corpus { records, labels })
}

fn parse_record(fields: &[&str]) -> Option<Record> {
    Some(Record {
        id: fields[0].to_string(),
        label: fields[1].to_string(),
        statement: fields[2].to_string(),
        subject: fields[3].to_string(),
        speaker: fields[4].to_string(),
        job: fields[5].to_string(),
        state: fields[6].to_string(),
        party: fields[7].to_string(),
        barely_true_counts: fields[8].parse().ok()?,
        false_counts: fields[9].parse().ok()?,
        half_true_counts: fields[10].parse().ok()?,
        mostly_true_counts: fields[11].parse().ok()?,
        pants_on_fire_counts: fields[12].parse().ok()?,
        context: fields[13].to_string(),
    })
}

/// Seeded stratified train/test split over encoded labels.
///
/// Returns `(train_indices, test_indices)`, both sorted. Each label
/// contributes `round(count * test_fraction)` indices to the test side, so
/// label proportions are preserved within rounding.
pub fn stratified_split(
    labels: &[usize],
    test_fraction: f64,
    seed: u64,
) -> (Vec<usize>, Vec<usize>) {
    let mut by_label: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in labels.iter().enumerate() {
        by_label.entry(label).or_default().push(idx);
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for (_, mut group) in by_label {
        group.shuffle(&mut rng);
        let n_test = (group.len() as f64 * test_fraction).round() as usize;
        for (pos, idx) in group.into_iter().enumerate() {
            if pos < n_test {
                test.push(idx);
            } else {
                train.push(idx);
            }
        }
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn liar_row(id: &str, label: &str, statement: &str) -> String {
        format!(
            "{}\t{}\t{}\tsubject\tspeaker\tjob\tstate\tparty\t1\t2\t3\t4\t0\tcontext",
            id, label, statement
        )
    }

    fn write_corpus(lines: &[String]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("train.tsv");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        (dir, path)
    }

    #[test]
    fn test_load_well_formed_corpus() {
        let lines = vec![
            liar_row("1.json", "true", "the sky is blue"),
            liar_row("2.json", "false", "the moon is cheese"),
            liar_row("3.json", "half-true", "it rains sometimes"),
        ];
        let (_dir, path) = write_corpus(&lines);

        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus.records.len(), 3);
        assert_eq!(corpus.records[0].id, "1.json");
        assert_eq!(corpus.records[1].statement, "the moon is cheese");
        assert_eq!(corpus.records[2].barely_true_counts, 1);
        assert_eq!(corpus.labels.len(), 3);
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = tempdir().unwrap();
        let result = load_corpus(&dir.path().join("absent.tsv"));
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_arity_is_fatal() {
        let (_dir, path) = write_corpus(&["a\tb\tc".to_string()]);
        let err = load_corpus(&path).unwrap_err();
        assert!(err.to_string().contains("schema mismatch"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let lines = vec![
            liar_row("1.json", "true", "first"),
            "short\tline".to_string(),
            "x\ttrue\ty\ts\ts\tj\ts\tp\tnot-a-number\t2\t3\t4\t0\tc".to_string(),
            liar_row("4.json", "false", "last"),
        ];
        let (_dir, path) = write_corpus(&lines);

        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus.records.len(), 2);
        assert_eq!(corpus.records[1].id, "4.json");
    }

    #[test]
    fn test_label_space_roundtrip() {
        let lines = vec![
            liar_row("1.json", "mostly-true", "a"),
            liar_row("2.json", "pants-fire", "b"),
            liar_row("3.json", "false", "c"),
        ];
        let (_dir, path) = write_corpus(&lines);
        let corpus = load_corpus(&path).unwrap();

        for record in &corpus.records {
            let code = corpus.labels.encode(&record.label).unwrap();
            assert_eq!(corpus.labels.decode(code).unwrap(), record.label);
        }
        // Sorted canonical order.
        assert_eq!(corpus.labels.names(), &["false", "mostly-true", "pants-fire"]);
        assert_eq!(corpus.labels.encode("unseen"), None);
    }

    #[test]
    fn test_stratified_split_preserves_proportions() {
        // 60 of label 0, 40 of label 1.
        let labels: Vec<usize> = std::iter::repeat(0)
            .take(60)
            .chain(std::iter::repeat(1).take(40))
            .collect();

        let (train, test) = stratified_split(&labels, 0.2, 42);
        assert_eq!(train.len() + test.len(), 100);

        let test_zeros = test.iter().filter(|&&i| labels[i] == 0).count();
        let test_ones = test.iter().filter(|&&i| labels[i] == 1).count();
        assert_eq!(test_zeros, 12);
        assert_eq!(test_ones, 8);
    }

    #[test]
    fn test_stratified_split_is_seeded() {
        let labels: Vec<usize> = (0..50).map(|i| i % 2).collect();
        let first = stratified_split(&labels, 0.2, 7);
        let second = stratified_split(&labels, 0.2, 7);
        assert_eq!(first, second);
    }
}
