// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! Model-comparison pipeline
//!
//! Orchestrates one batch run: load the corpus, stratify the split, fit the
//! TF-IDF vocabulary on the training partition, train and evaluate every
//! candidate, optionally query the remote classifier, and collect the
//! outcomes for reporting.
//!
//! Only corpus loading and splitting are fatal. A candidate that fails to
//! train is recorded as a zeroed outcome and the run continues; the outcome
//! list is an explicit accumulator owned by [`run_comparison`].

use crate::charts;
use crate::dataset::{load_corpus, stratified_split, Corpus, LabelSpace};
use crate::features::{SparseVector, TfidfVectorizer, DEFAULT_MAX_FEATURES};
use crate::metrics::TrialResult;
use crate::models::{candidate_models, Classifier, TrainData};
use crate::remote::{RemoteClassifier, RemoteConfig};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for one comparison run, echoed into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Path to the LIAR-format TSV corpus.
    pub dataset_path: String,
    /// Directory receiving the markdown/JSON/SVG artifacts.
    pub output_dir: String,
    /// Seed for the split and the seeded candidates.
    pub seed: u64,
    /// Held-out fraction of the corpus.
    pub test_fraction: f64,
    /// TF-IDF vocabulary cap.
    pub max_features: usize,
    /// Display-name filter; empty runs every candidate.
    pub model_names: Vec<String>,
    /// Remote adapter settings; `None` disables the adapter.
    pub remote: Option<RemoteConfig>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            dataset_path: "dataset/liar/train.tsv".to_string(),
            output_dir: "results".to_string(),
            seed: 42,
            test_fraction: 0.2,
            max_features: DEFAULT_MAX_FEATURES,
            model_names: Vec::new(),
            remote: None,
        }
    }
}

/// Whether a candidate trained or was recorded as a failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrialStatus {
    Trained,
    Failed { error: String },
}

/// Per-candidate outcome: metrics are zeroed when the status is `Failed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: TrialStatus,
    pub result: TrialResult,
}

impl ModelOutcome {
    pub fn is_trained(&self) -> bool {
        matches!(self.status, TrialStatus::Trained)
    }
}

/// Corpus statistics echoed into the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub path: String,
    pub total_records: usize,
    pub train_records: usize,
    pub test_records: usize,
    pub labels: Vec<String>,
    pub label_distribution: BTreeMap<String, usize>,
}

/// Complete results of one comparison run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub config: CompareConfig,
    pub dataset: DatasetSummary,
    /// One entry per candidate, in training order.
    pub outcomes: Vec<ModelOutcome>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

/// Run the full comparison.
///
/// `remote_token` is only consulted when the config enables the remote
/// adapter; a missing token is recorded as that adapter's failure rather
/// than aborting the run.
pub fn run_comparison(
    config: &CompareConfig,
    remote_token: Option<String>,
) -> Result<ComparisonReport> {
    let corpus = load_corpus(Path::new(&config.dataset_path))?;
    let labels = &corpus.labels;
    tracing::info!(
        "corpus loaded: {} records, {} labels",
        corpus.records.len(),
        labels.len()
    );

    let encoded: Vec<usize> = corpus
        .records
        .iter()
        .map(|record| {
            labels
                .encode(&record.label)
                .expect("label space was built from this corpus")
        })
        .collect();

    let (train_idx, test_idx) = stratified_split(&encoded, config.test_fraction, config.seed);
    if train_idx.is_empty() || test_idx.is_empty() {
        bail!(
            "corpus too small to split: {} train / {} test records",
            train_idx.len(),
            test_idx.len()
        );
    }
    tracing::info!(
        "split: {} train / {} test (seed {})",
        train_idx.len(),
        test_idx.len(),
        config.seed
    );

    // Vocabulary and IDF weights come from the training partition only.
    let train_statements: Vec<&str> = train_idx
        .iter()
        .map(|&idx| corpus.records[idx].statement.as_str())
        .collect();
    let mut vectorizer = TfidfVectorizer::new(config.max_features);
    let x_train = vectorizer.fit_transform(&train_statements);
    tracing::info!("vocabulary fitted: {} features", vectorizer.n_features());

    let x_test: Vec<SparseVector> = test_idx
        .iter()
        .map(|&idx| vectorizer.transform(&corpus.records[idx].statement))
        .collect();
    let y_train: Vec<usize> = train_idx.iter().map(|&idx| encoded[idx]).collect();
    let y_test: Vec<usize> = test_idx.iter().map(|&idx| encoded[idx]).collect();

    let output_dir = Path::new(&config.output_dir);
    if let Err(err) = std::fs::create_dir_all(output_dir) {
        // Reporting artifacts will fail to write; the metrics still run.
        tracing::error!("failed to create output dir {}: {}", output_dir.display(), err);
    }

    let train_data = TrainData {
        x: &x_train,
        y: &y_train,
        n_classes: labels.len(),
        n_features: vectorizer.n_features(),
    };

    let models: Vec<Box<dyn Classifier>> = candidate_models(config.seed)
        .into_iter()
        .filter(|model| {
            config.model_names.is_empty()
                || config.model_names.iter().any(|name| name == model.name())
        })
        .collect();

    let mut outcomes = evaluate_candidates(models, &train_data, &x_test, &y_test, labels, output_dir);

    if let Some(remote_config) = &config.remote {
        outcomes.push(run_remote_trial(
            remote_config.clone(),
            remote_token,
            &test_idx,
            &corpus,
            &y_test,
        ));
    }

    Ok(ComparisonReport {
        config: config.clone(),
        dataset: DatasetSummary {
            path: config.dataset_path.clone(),
            total_records: corpus.records.len(),
            train_records: train_idx.len(),
            test_records: test_idx.len(),
            labels: labels.names().to_vec(),
            label_distribution: Corpus::label_distribution(&corpus.records),
        },
        outcomes,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Train and evaluate each candidate, accumulating one outcome per model.
///
/// A failed candidate is logged and recorded with zeroed metrics; its
/// confusion heatmap is rendered before the next candidate starts.
fn evaluate_candidates(
    models: Vec<Box<dyn Classifier>>,
    train_data: &TrainData,
    x_test: &[SparseVector],
    y_test: &[usize],
    labels: &LabelSpace,
    output_dir: &Path,
) -> Vec<ModelOutcome> {
    let mut outcomes = Vec::with_capacity(models.len());

    for mut model in models {
        let name = model.name().to_string();
        tracing::info!("training candidate: {}", name);

        let outcome = match run_trial(model.as_mut(), train_data, x_test, y_test) {
            Ok(result) => {
                tracing::info!(
                    "  {} - accuracy: {:.4}, precision: {:.4}, f1: {:.4}",
                    name,
                    result.accuracy,
                    result.macro_precision,
                    result.macro_f1
                );
                let heatmap_path =
                    output_dir.join(format!("confusion_{}.svg", charts::file_slug(&name)));
                if let Err(err) = charts::render_confusion_heatmap(
                    &format!("Confusion Matrix: {}", name),
                    labels.names(),
                    &result.confusion,
                    &heatmap_path,
                ) {
                    tracing::error!("failed to render heatmap for {}: {:#}", name, err);
                }
                ModelOutcome {
                    name,
                    status: TrialStatus::Trained,
                    result,
                }
            }
            Err(err) => {
                tracing::error!("candidate {} failed: {:#}", name, err);
                ModelOutcome {
                    name,
                    status: TrialStatus::Failed {
                        error: format!("{:#}", err),
                    },
                    result: TrialResult::zeroed(labels.len()),
                }
            }
        };
        outcomes.push(outcome);
    }

    outcomes
}

fn run_trial(
    model: &mut dyn Classifier,
    train_data: &TrainData,
    x_test: &[SparseVector],
    y_test: &[usize],
) -> Result<TrialResult> {
    model.fit(train_data)?;
    let predictions: Vec<Option<usize>> = model
        .predict_batch(x_test)
        .into_iter()
        .map(Some)
        .collect();
    Ok(TrialResult::from_predictions(
        y_test,
        &predictions,
        train_data.n_classes,
    ))
}

/// Run the remote adapter as one all-or-nothing trial.
fn run_remote_trial(
    remote_config: RemoteConfig,
    remote_token: Option<String>,
    test_idx: &[usize],
    corpus: &Corpus,
    y_test: &[usize],
) -> ModelOutcome {
    let statements: Vec<&str> = test_idx
        .iter()
        .map(|&idx| corpus.records[idx].statement.as_str())
        .collect();

    let cap = remote_config.cap;
    let attempt = match remote_token {
        Some(token) => RemoteClassifier::new(remote_config, token).and_then(|classifier| {
            tracing::info!("querying remote classifier (up to {} statements)", cap);
            classifier.evaluate(&statements, y_test, &corpus.labels)
        }),
        None => Err(anyhow::anyhow!("no remote API token provided")),
    };

    match attempt {
        Ok(result) => {
            tracing::info!(
                "  Remote Transformer - accuracy: {:.4}, precision: {:.4}, f1: {:.4}",
                result.accuracy,
                result.macro_precision,
                result.macro_f1
            );
            ModelOutcome {
                name: "Remote Transformer".to_string(),
                status: TrialStatus::Trained,
                result,
            }
        }
        Err(err) => {
            tracing::error!("remote adapter failed: {:#}", err);
            ModelOutcome {
                name: "Remote Transformer".to_string(),
                status: TrialStatus::Failed {
                    error: format!("{:#}", err),
                },
                result: TrialResult::zeroed(corpus.labels.len()),
            }
        }
    }
}
