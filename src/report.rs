// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! Report generation
//!
//! Serializes a finished comparison into the run artifacts: the markdown
//! table, a pretty-JSON dump, and the accuracy bar chart. Reporting
//! failures are logged and never change the process exit status; the
//! metrics have already been computed and printed by then.

use crate::charts::{self, BarData, BAR_PALETTE};
use crate::pipeline::{ComparisonReport, TrialStatus};
use anyhow::{Context, Result};
use std::path::Path;

/// Markdown report file name.
pub const MARKDOWN_FILE: &str = "model_comparison.md";
/// JSON dump file name.
pub const JSON_FILE: &str = "comparison.json";
/// Accuracy bar chart file name.
pub const CHART_FILE: &str = "comparison.svg";

/// Render the markdown comparison table.
///
/// One row per model in training order, metric values to 4 decimal places.
pub fn render_markdown(report: &ComparisonReport) -> String {
    let mut out = String::new();
    out.push_str("# Model Comparison Results\n\n");
    out.push_str("| Model | Accuracy | Precision | F1 |\n");
    out.push_str("|-------|----------|-----------|----|\n");
    for outcome in &report.outcomes {
        out.push_str(&format!(
            "| {} | {:.4} | {:.4} | {:.4} |\n",
            outcome.name,
            outcome.result.accuracy,
            outcome.result.macro_precision,
            outcome.result.macro_f1
        ));
    }

    out.push_str(&format!(
        "\nGenerated {} from {} ({} train / {} test records, seed {}).\n",
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        report.dataset.path,
        report.dataset.train_records,
        report.dataset.test_records,
        report.config.seed
    ));

    for outcome in &report.outcomes {
        if let TrialStatus::Failed { error } = &outcome.status {
            out.push_str(&format!(
                "\n> **{}** failed and is reported with zeroed metrics: {}\n",
                outcome.name, error
            ));
        }
    }

    out
}

fn write_markdown(report: &ComparisonReport, output_dir: &Path) -> Result<()> {
    let path = output_dir.join(MARKDOWN_FILE);
    std::fs::write(&path, render_markdown(report))
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("markdown report saved to {}", path.display());
    Ok(())
}

fn write_json(report: &ComparisonReport, output_dir: &Path) -> Result<()> {
    let path = output_dir.join(JSON_FILE);
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!("JSON results saved to {}", path.display());
    Ok(())
}

fn write_chart(report: &ComparisonReport, output_dir: &Path) -> Result<()> {
    let bars: Vec<BarData> = report
        .outcomes
        .iter()
        .enumerate()
        .map(|(idx, outcome)| BarData {
            label: outcome.name.clone(),
            value: outcome.result.accuracy,
            color: BAR_PALETTE[idx % BAR_PALETTE.len()].to_string(),
        })
        .collect();
    let path = output_dir.join(CHART_FILE);
    charts::render_bar_chart("Model Accuracy Comparison", "Accuracy", &bars, &path)?;
    tracing::info!("accuracy chart saved to {}", path.display());
    Ok(())
}

/// Write every report artifact, logging (not propagating) failures.
///
/// Each artifact is attempted independently so one unwritable file does
/// not suppress the others.
pub fn write_artifacts(report: &ComparisonReport, output_dir: &Path) {
    if let Err(err) = std::fs::create_dir_all(output_dir) {
        tracing::error!(
            "failed to create output dir {}: {}",
            output_dir.display(),
            err
        );
    }
    if let Err(err) = write_markdown(report, output_dir) {
        tracing::error!("markdown report failed: {:#}", err);
    }
    if let Err(err) = write_json(report, output_dir) {
        tracing::error!("JSON report failed: {:#}", err);
    }
    if let Err(err) = write_chart(report, output_dir) {
        tracing::error!("accuracy chart failed: {:#}", err);
    }
}

/// Print the comparison table to the console.
pub fn print_summary(report: &ComparisonReport) {
    println!("\n{}", "=".repeat(64));
    println!("MODEL COMPARISON SUMMARY");
    println!("{}", "=".repeat(64));
    println!(
        "{:<22} {:>10} {:>10} {:>10} {:>8}",
        "Model", "Accuracy", "Precision", "F1", "Status"
    );
    println!("{:-<64}", "");
    for outcome in &report.outcomes {
        let status = match &outcome.status {
            TrialStatus::Trained => "ok",
            TrialStatus::Failed { .. } => "FAILED",
        };
        println!(
            "{:<22} {:>10.4} {:>10.4} {:>10.4} {:>8}",
            outcome.name,
            outcome.result.accuracy,
            outcome.result.macro_precision,
            outcome.result.macro_f1,
            status
        );
    }
    println!("{:-<64}", "");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{ConfusionMatrix, TrialResult};
    use crate::pipeline::{CompareConfig, DatasetSummary, ModelOutcome};
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn trial(accuracy: f64, precision: f64, f1: f64) -> TrialResult {
        TrialResult {
            accuracy,
            macro_precision: precision,
            macro_f1: f1,
            confusion: ConfusionMatrix::new(2),
        }
    }

    fn sample_report() -> ComparisonReport {
        ComparisonReport {
            config: CompareConfig::default(),
            dataset: DatasetSummary {
                path: "train.tsv".to_string(),
                total_records: 20,
                train_records: 16,
                test_records: 4,
                labels: vec!["false".to_string(), "true".to_string()],
                label_distribution: BTreeMap::new(),
            },
            outcomes: vec![
                ModelOutcome {
                    name: "Naive Bayes".to_string(),
                    status: TrialStatus::Trained,
                    result: trial(0.5, 0.25, 1.0 / 3.0),
                },
                ModelOutcome {
                    name: "Random Forest".to_string(),
                    status: TrialStatus::Failed {
                        error: "out of cheese".to_string(),
                    },
                    result: TrialResult::zeroed(2),
                },
            ],
            timestamp: chrono::Utc::now(),
            version: "0.0.0-test".to_string(),
        }
    }

    #[test]
    fn test_markdown_format() {
        let markdown = render_markdown(&sample_report());

        assert!(markdown.starts_with("# Model Comparison Results\n\n"));
        assert!(markdown.contains("| Model | Accuracy | Precision | F1 |\n"));
        assert!(markdown.contains("|-------|----------|-----------|----|\n"));
        assert!(markdown.contains("| Naive Bayes | 0.5000 | 0.2500 | 0.3333 |\n"));
        assert!(markdown.contains("| Random Forest | 0.0000 | 0.0000 | 0.0000 |\n"));
    }

    #[test]
    fn test_markdown_row_order_follows_outcomes() {
        let markdown = render_markdown(&sample_report());
        let nb = markdown.find("| Naive Bayes |").unwrap();
        let rf = markdown.find("| Random Forest |").unwrap();
        assert!(nb < rf);

        let data_rows = markdown
            .lines()
            .filter(|line| line.starts_with("| ") && !line.starts_with("| Model"))
            .count();
        assert_eq!(data_rows, 2);
    }

    #[test]
    fn test_failed_outcome_is_footnoted() {
        let markdown = render_markdown(&sample_report());
        assert!(markdown.contains("out of cheese"));
    }

    #[test]
    fn test_write_artifacts_creates_files() {
        let dir = tempdir().unwrap();
        let report = sample_report();

        write_artifacts(&report, dir.path());

        assert!(dir.path().join(MARKDOWN_FILE).is_file());
        assert!(dir.path().join(JSON_FILE).is_file());
        assert!(dir.path().join(CHART_FILE).is_file());

        let json = std::fs::read_to_string(dir.path().join(JSON_FILE)).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["outcomes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_artifacts_survives_bad_directory() {
        // A file where the directory should be: every write fails, none panic.
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("occupied");
        std::fs::write(&blocker, "not a directory").unwrap();

        write_artifacts(&sample_report(), &blocker);
        assert!(blocker.is_file());
    }
}
