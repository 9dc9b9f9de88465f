// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! Corpus diagnostics CLI
//!
//! Loads a LIAR-format corpus and prints the statistics worth checking
//! before a comparison run: label distribution, statement lengths, and the
//! split sizes a given seed would produce.

use anyhow::Result;
use clap::Parser;
use quickfact_eval::dataset::{load_corpus, stratified_split, Corpus};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "corpus-stats")]
#[command(about = "Inspect a LIAR-format corpus file")]
#[command(version)]
struct Args {
    /// Path to the corpus TSV
    #[arg(short, long)]
    dataset: PathBuf,

    /// Seed used for the split preview
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Held-out test fraction for the split preview
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let corpus = load_corpus(&args.dataset)?;

    println!("Corpus: {}", args.dataset.display());
    println!("  Records: {}", corpus.records.len());
    println!("  Labels:  {}", corpus.labels.len());

    let total = corpus.records.len() as f64;
    println!("\nLabel distribution:");
    for (label, count) in Corpus::label_distribution(&corpus.records) {
        println!(
            "  {:<14} {:>6}  ({:.1}%)",
            label,
            count,
            count as f64 / total * 100.0
        );
    }

    let word_counts: Vec<usize> = corpus
        .records
        .iter()
        .map(|record| record.statement.split_whitespace().count())
        .collect();
    let avg_words = word_counts.iter().sum::<usize>() as f64 / total;
    let max_words = word_counts.iter().copied().max().unwrap_or(0);
    println!("\nStatement length (words): avg {:.1}, max {}", avg_words, max_words);

    let encoded: Vec<usize> = corpus
        .records
        .iter()
        .map(|record| {
            corpus
                .labels
                .encode(&record.label)
                .expect("label space was built from this corpus")
        })
        .collect();
    let (train, test) = stratified_split(&encoded, args.test_fraction, args.seed);
    println!(
        "\nSplit preview (seed {}, {:.0}% held out): {} train / {} test",
        args.seed,
        args.test_fraction * 100.0,
        train.len(),
        test.len()
    );

    println!("\nTest-side label distribution:");
    for (label, count) in test.iter().fold(
        std::collections::BTreeMap::<&str, usize>::new(),
        |mut dist, &idx| {
            *dist.entry(corpus.records[idx].label.as_str()).or_insert(0) += 1;
            dist
        },
    ) {
        println!(
            "  {:<14} {:>6}  ({:.1}%)",
            label,
            count,
            count as f64 / test.len() as f64 * 100.0
        );
    }

    Ok(())
}
