// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! Model comparison CLI
//!
//! Usage:
//!   compare-models --dataset dataset/liar/train.tsv
//!   compare-models --dataset train.tsv --remote --cap 100 --output results
//!
//! Only a missing or malformed dataset exits non-zero; per-model failures
//! and reporting failures are logged and the process still exits cleanly.

use anyhow::{Context, Result};
use clap::Parser;
use quickfact_eval::pipeline::{run_comparison, CompareConfig};
use quickfact_eval::remote::{RemoteConfig, DEFAULT_CAP, DEFAULT_ENDPOINT};
use quickfact_eval::report;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the remote bearer token.
const TOKEN_ENV: &str = "REMOTE_API_TOKEN";

#[derive(Parser, Debug)]
#[command(name = "compare-models")]
#[command(about = "Train and compare fake-news classifiers on a LIAR corpus")]
#[command(version)]
struct Args {
    /// Path to the LIAR-format train.tsv corpus
    #[arg(short, long)]
    dataset: PathBuf,

    /// Output directory for report artifacts
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Random seed for the split and the seeded models
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Held-out test fraction
    #[arg(long, default_value_t = 0.2)]
    test_fraction: f64,

    /// TF-IDF vocabulary cap
    #[arg(long, default_value_t = 5000)]
    max_features: usize,

    /// Specific models to run (comma-separated display names, empty = all)
    #[arg(short, long)]
    models: Option<String>,

    /// Also query the hosted remote classifier
    #[arg(long)]
    remote: bool,

    /// Remote endpoint URL
    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Cap on remotely classified test statements
    #[arg(long, default_value_t = DEFAULT_CAP)]
    cap: usize,

    /// JSON file overriding the remote label mapping table
    /// (an array of [remote, local] string pairs)
    #[arg(long)]
    mapping: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    tracing::info!("Fake-News Model Comparison Pipeline");
    tracing::info!("Dataset: {}", args.dataset.display());
    tracing::info!("Seed: {}", args.seed);

    let model_names: Vec<String> = args
        .models
        .map(|models| models.split(',').map(|name| name.trim().to_string()).collect())
        .unwrap_or_default();

    let remote = if args.remote {
        let mut remote_config = RemoteConfig {
            endpoint: args.endpoint.clone(),
            cap: args.cap,
            ..RemoteConfig::default()
        };
        if let Some(path) = &args.mapping {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read mapping file {}", path.display()))?;
            remote_config.mapping = serde_json::from_str(&raw)
                .with_context(|| format!("invalid mapping file {}", path.display()))?;
        }
        Some(remote_config)
    } else {
        None
    };

    let token = std::env::var(TOKEN_ENV).ok();
    if args.remote && token.is_none() {
        tracing::warn!(
            "{} is not set; the remote trial will be recorded as failed",
            TOKEN_ENV
        );
    }

    let config = CompareConfig {
        dataset_path: args.dataset.to_string_lossy().to_string(),
        output_dir: args.output.to_string_lossy().to_string(),
        seed: args.seed,
        test_fraction: args.test_fraction,
        max_features: args.max_features,
        model_names,
        remote,
    };

    // Fatal startup errors (missing dataset, schema mismatch) propagate and
    // exit non-zero; everything after this degrades gracefully.
    let results = run_comparison(&config, token)?;

    report::print_summary(&results);
    report::write_artifacts(&results, &args.output);

    println!("\nComparison complete.");
    Ok(())
}
