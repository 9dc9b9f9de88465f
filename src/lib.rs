// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! Model comparison pipeline for fake-news classification on the LIAR dataset
//!
//! This crate provides:
//! - LIAR corpus loading with schema validation (14-column TSV)
//! - TF-IDF feature extraction with a train-only vocabulary
//! - Candidate classifiers (Naive Bayes, Logistic Regression, Random Forest)
//! - Evaluation metrics (accuracy, macro precision, macro F1, confusion matrix)
//! - An optional adapter for a remotely hosted transformer classifier
//! - Markdown / JSON / SVG report generation with seeded, reproducible runs

pub mod charts;
pub mod dataset;
pub mod features;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod report;

pub use dataset::{load_corpus, stratified_split, Corpus, LabelSpace, Record};
pub use features::{SparseVector, TfidfVectorizer};
pub use metrics::{ConfusionMatrix, TrialResult};
pub use models::{candidate_models, Classifier, TrainData};
pub use pipeline::{run_comparison, CompareConfig, ComparisonReport, ModelOutcome, TrialStatus};
pub use remote::{RemoteClassifier, RemoteConfig};
