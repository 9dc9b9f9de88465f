// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! Evaluation metrics for multi-class classification
//!
//! Implements the per-trial metrics used in the comparison report:
//! - k-way confusion matrix (rows = truth, columns = predicted)
//! - Accuracy
//! - Macro-averaged precision and F1 (zero-division contributes 0)

use serde::{Deserialize, Serialize};

/// Confusion matrix for a `k`-class classifier.
///
/// Counts are row-major, `truth * k + predicted`, ordered by the label
/// space's canonical order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub n_classes: usize,
    pub counts: Vec<u32>,
}

impl ConfusionMatrix {
    pub fn new(n_classes: usize) -> Self {
        Self {
            n_classes,
            counts: vec![0; n_classes * n_classes],
        }
    }

    pub fn add(&mut self, truth: usize, predicted: usize) {
        if truth >= self.n_classes || predicted >= self.n_classes {
            return;
        }
        self.counts[truth * self.n_classes + predicted] += 1;
    }

    pub fn get(&self, truth: usize, predicted: usize) -> u32 {
        self.counts[truth * self.n_classes + predicted]
    }

    /// Sum of all entries.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// Count of true instances of `label`.
    pub fn row_sum(&self, label: usize) -> u32 {
        (0..self.n_classes).map(|j| self.get(label, j)).sum()
    }

    /// Count of predictions of `label`.
    pub fn column_sum(&self, label: usize) -> u32 {
        (0..self.n_classes).map(|i| self.get(i, label)).sum()
    }
}

/// Precision/recall/F1 for one class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerClassStats {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u32,
}

/// Per-class statistics from a confusion matrix, in label order.
///
/// A class with no predicted instances gets precision 0, not an error.
pub fn per_class_stats(cm: &ConfusionMatrix) -> Vec<PerClassStats> {
    let k = cm.n_classes;
    let mut stats = Vec::with_capacity(k);
    for class in 0..k {
        let tp = cm.get(class, class) as f64;
        let predicted = cm.column_sum(class) as f64;
        let support = cm.row_sum(class);

        let precision = if predicted == 0.0 { 0.0 } else { tp / predicted };
        let recall = if support == 0 { 0.0 } else { tp / support as f64 };
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        stats.push(PerClassStats {
            precision,
            recall,
            f1,
            support,
        });
    }
    stats
}

/// Immutable per-model outcome metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialResult {
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_f1: f64,
    pub confusion: ConfusionMatrix,
}

impl TrialResult {
    /// All-zero metrics, recorded when a candidate fails.
    pub fn zeroed(n_classes: usize) -> Self {
        Self {
            accuracy: 0.0,
            macro_precision: 0.0,
            macro_f1: 0.0,
            confusion: ConfusionMatrix::new(n_classes),
        }
    }

    /// Compute metrics from encoded truth/prediction pairs.
    ///
    /// A `None` prediction (a label outside the local label space, as the
    /// remote adapter can produce) counts against accuracy but cannot be
    /// placed in the confusion matrix.
    pub fn from_predictions(
        truth: &[usize],
        predicted: &[Option<usize>],
        n_classes: usize,
    ) -> Self {
        assert_eq!(
            truth.len(),
            predicted.len(),
            "truth and prediction lengths must match"
        );

        let mut confusion = ConfusionMatrix::new(n_classes);
        let mut correct = 0usize;
        for (&t, p) in truth.iter().zip(predicted.iter()) {
            if let Some(p) = p {
                confusion.add(t, *p);
                if t == *p {
                    correct += 1;
                }
            }
        }

        let accuracy = if truth.is_empty() {
            0.0
        } else {
            correct as f64 / truth.len() as f64
        };

        let stats = per_class_stats(&confusion);
        let k = stats.len().max(1) as f64;
        let macro_precision = stats.iter().map(|s| s.precision).sum::<f64>() / k;
        let macro_f1 = stats.iter().map(|s| s.f1).sum::<f64>() / k;

        Self {
            accuracy,
            macro_precision,
            macro_f1,
            confusion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn some(values: &[usize]) -> Vec<Option<usize>> {
        values.iter().map(|&v| Some(v)).collect()
    }

    #[test]
    fn test_perfect_predictions() {
        let truth = vec![0, 1, 2, 0, 1, 2];
        let result = TrialResult::from_predictions(&truth, &some(&truth), 3);

        assert!((result.accuracy - 1.0).abs() < 1e-9);
        assert!((result.macro_precision - 1.0).abs() < 1e-9);
        assert!((result.macro_f1 - 1.0).abs() < 1e-9);
        assert_eq!(result.confusion.get(2, 2), 2);
    }

    #[test]
    fn test_confusion_matrix_sums() {
        let truth = vec![0, 0, 0, 1, 1, 2];
        let predicted = some(&[0, 1, 2, 1, 1, 0]);
        let result = TrialResult::from_predictions(&truth, &predicted, 3);

        assert_eq!(result.confusion.total() as usize, truth.len());
        assert_eq!(result.confusion.row_sum(0), 3);
        assert_eq!(result.confusion.row_sum(1), 2);
        assert_eq!(result.confusion.row_sum(2), 1);
    }

    #[test]
    fn test_zero_division_contributes_zero() {
        // Class 2 is never predicted and never true; class 1 never predicted.
        let truth = vec![0, 0, 1];
        let predicted = some(&[0, 0, 0]);
        let result = TrialResult::from_predictions(&truth, &predicted, 3);

        let stats = per_class_stats(&result.confusion);
        assert_eq!(stats[1].precision, 0.0);
        assert_eq!(stats[2].precision, 0.0);
        assert!(result.macro_precision >= 0.0 && result.macro_precision <= 1.0);
        assert!(result.macro_f1 >= 0.0 && result.macro_f1 <= 1.0);
    }

    #[test]
    fn test_metrics_stay_in_unit_range() {
        let truth = vec![0, 1, 2, 1, 0, 2, 2, 1];
        let predicted = some(&[1, 1, 0, 2, 0, 2, 1, 1]);
        let result = TrialResult::from_predictions(&truth, &predicted, 3);

        assert!(result.accuracy >= 0.0 && result.accuracy <= 1.0);
        assert!(result.macro_precision >= 0.0 && result.macro_precision <= 1.0);
        assert!(result.macro_f1 >= 0.0 && result.macro_f1 <= 1.0);
    }

    #[test]
    fn test_out_of_space_prediction_counts_as_error() {
        let truth = vec![0, 1];
        let predicted = vec![Some(0), None];
        let result = TrialResult::from_predictions(&truth, &predicted, 2);

        assert!((result.accuracy - 0.5).abs() < 1e-9);
        // The unmappable prediction is absent from the matrix.
        assert_eq!(result.confusion.total(), 1);
    }

    #[test]
    fn test_zeroed_result() {
        let result = TrialResult::zeroed(6);
        assert_eq!(result.accuracy, 0.0);
        assert_eq!(result.macro_f1, 0.0);
        assert_eq!(result.confusion.total(), 0);
        assert_eq!(result.confusion.n_classes, 6);
    }
}
