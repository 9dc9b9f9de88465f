// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! Candidate classifiers for the comparison pipeline
//!
//! Implements:
//! - Multinomial Naive Bayes with Laplace smoothing
//! - Multinomial logistic regression (softmax, seeded SGD, L2)
//! - Random forest (gini splits, bootstrap resampling, feature subsampling)
//!
//! All candidates consume sparse TF-IDF vectors through the shared
//! [`Classifier`] trait and are deterministic for a fixed seed.

use crate::features::SparseVector;
use anyhow::{bail, Result};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Borrowed training inputs shared by all candidates.
#[derive(Debug, Clone, Copy)]
pub struct TrainData<'a> {
    pub x: &'a [SparseVector],
    pub y: &'a [usize],
    pub n_classes: usize,
    pub n_features: usize,
}

impl TrainData<'_> {
    fn validate(&self) -> Result<()> {
        if self.x.is_empty() {
            bail!("empty training set");
        }
        if self.x.len() != self.y.len() {
            bail!(
                "mismatched training inputs/labels: {} vs {}",
                self.x.len(),
                self.y.len()
            );
        }
        if self.n_classes == 0 {
            bail!("no classes available for training");
        }
        if let Some(&bad) = self.y.iter().find(|&&label| label >= self.n_classes) {
            bail!("label {} out of range for {} classes", bad, self.n_classes);
        }
        for vector in self.x {
            // Indices are sorted, so the last one is the largest.
            if let Some(&feature) = vector.indices.last() {
                if feature as usize >= self.n_features {
                    bail!(
                        "feature index {} out of range for {} features",
                        feature,
                        self.n_features
                    );
                }
            }
        }
        Ok(())
    }
}

/// Trait for all candidate models.
pub trait Classifier {
    /// Display name used in the report.
    fn name(&self) -> &str;

    /// One-line model description.
    fn description(&self) -> &str;

    /// Fit the model on the training partition.
    fn fit(&mut self, data: &TrainData) -> Result<()>;

    /// Predict the encoded class for a single vector.
    fn predict(&self, x: &SparseVector) -> usize;

    /// Predict classes for a batch of vectors.
    fn predict_batch(&self, xs: &[SparseVector]) -> Vec<usize> {
        xs.iter().map(|x| self.predict(x)).collect()
    }
}

/// Numerically stable softmax over a logit slice.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    if sum == 0.0 {
        vec![1.0 / logits.len() as f64; logits.len()]
    } else {
        exps.into_iter().map(|e| e / sum).collect()
    }
}

fn argmax(scores: &[f64]) -> usize {
    let mut best = 0usize;
    let mut best_val = f64::NEG_INFINITY;
    for (idx, &score) in scores.iter().enumerate() {
        if score > best_val {
            best_val = score;
            best = idx;
        }
    }
    best
}

/// Multinomial Naive Bayes over TF-IDF weights.
#[derive(Debug, Clone)]
pub struct MultinomialNb {
    /// Laplace smoothing strength.
    pub alpha: f64,
    log_priors: Vec<f64>,
    /// Flattened `n_classes x n_features` log feature probabilities.
    feature_log_prob: Vec<f64>,
    n_classes: usize,
    n_features: usize,
}

impl MultinomialNb {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            log_priors: Vec::new(),
            feature_log_prob: Vec::new(),
            n_classes: 0,
            n_features: 0,
        }
    }

    fn scores(&self, x: &SparseVector) -> Vec<f64> {
        let mut scores = self.log_priors.clone();
        for (class, score) in scores.iter_mut().enumerate() {
            let base = class * self.n_features;
            for (feature, value) in x.iter() {
                *score += value * self.feature_log_prob[base + feature as usize];
            }
        }
        scores
    }
}

impl Classifier for MultinomialNb {
    fn name(&self) -> &str {
        "Naive Bayes"
    }

    fn description(&self) -> &str {
        "Multinomial Naive Bayes with Laplace smoothing"
    }

    fn fit(&mut self, data: &TrainData) -> Result<()> {
        data.validate()?;
        self.n_classes = data.n_classes;
        self.n_features = data.n_features;

        let mut class_counts = vec![0usize; data.n_classes];
        let mut feature_sums = vec![0.0f64; data.n_classes * data.n_features];
        for (x, &y) in data.x.iter().zip(data.y.iter()) {
            class_counts[y] += 1;
            let base = y * data.n_features;
            for (feature, value) in x.iter() {
                feature_sums[base + feature as usize] += value;
            }
        }

        let n = data.x.len() as f64;
        self.log_priors = class_counts
            .iter()
            .map(|&count| {
                if count == 0 {
                    f64::NEG_INFINITY
                } else {
                    (count as f64 / n).ln()
                }
            })
            .collect();

        self.feature_log_prob = vec![0.0; data.n_classes * data.n_features];
        for class in 0..data.n_classes {
            let base = class * data.n_features;
            let total: f64 = feature_sums[base..base + data.n_features].iter().sum();
            let denom = total + self.alpha * data.n_features as f64;
            for feature in 0..data.n_features {
                self.feature_log_prob[base + feature] =
                    ((feature_sums[base + feature] + self.alpha) / denom).ln();
            }
        }
        Ok(())
    }

    fn predict(&self, x: &SparseVector) -> usize {
        if self.n_classes == 0 {
            return 0;
        }
        argmax(&self.scores(x))
    }
}

/// Multinomial logistic regression trained with seeded SGD.
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    pub epochs: usize,
    pub learning_rate: f64,
    pub l2: f64,
    pub seed: u64,
    /// Flattened `n_classes x n_features` weights.
    weights: Vec<f64>,
    bias: Vec<f64>,
    n_classes: usize,
    n_features: usize,
}

impl LogisticRegression {
    pub fn new(seed: u64) -> Self {
        Self {
            epochs: 30,
            learning_rate: 0.5,
            l2: 1e-4,
            seed,
            weights: Vec::new(),
            bias: Vec::new(),
            n_classes: 0,
            n_features: 0,
        }
    }

    fn logits(&self, x: &SparseVector) -> Vec<f64> {
        let mut logits = self.bias.clone();
        for (class, logit) in logits.iter_mut().enumerate() {
            let base = class * self.n_features;
            for (feature, value) in x.iter() {
                *logit += value * self.weights[base + feature as usize];
            }
        }
        logits
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "Logistic Regression"
    }

    fn description(&self) -> &str {
        "Multinomial logistic regression (softmax SGD, L2 regularized)"
    }

    fn fit(&mut self, data: &TrainData) -> Result<()> {
        data.validate()?;
        self.n_classes = data.n_classes;
        self.n_features = data.n_features;

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.weights = (0..data.n_classes * data.n_features)
            .map(|_| (rng.gen::<f64>() - 0.5) * 0.01)
            .collect();
        self.bias = vec![0.0; data.n_classes];

        let mut indices: Vec<usize> = (0..data.x.len()).collect();
        let lr = self.learning_rate;
        let l2 = self.l2.max(0.0);

        for _epoch in 0..self.epochs {
            indices.shuffle(&mut rng);
            for &idx in &indices {
                let x = &data.x[idx];
                let y = data.y[idx];
                let probs = softmax(&self.logits(x));
                for class in 0..self.n_classes {
                    let diff = probs[class] - if class == y { 1.0 } else { 0.0 };
                    let base = class * self.n_features;
                    for (feature, value) in x.iter() {
                        let w = base + feature as usize;
                        self.weights[w] -= lr * (diff * value + l2 * self.weights[w]);
                    }
                    self.bias[class] -= lr * diff;
                }
            }
        }
        Ok(())
    }

    fn predict(&self, x: &SparseVector) -> usize {
        if self.n_classes == 0 {
            return 0;
        }
        argmax(&self.logits(x))
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        class: usize,
    },
    Split {
        feature: u32,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single gini-impurity decision tree over sparse vectors.
#[derive(Debug, Clone)]
struct DecisionTree {
    nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn grow(
        x: &[SparseVector],
        y: &[usize],
        indices: &[usize],
        n_classes: usize,
        n_candidates: usize,
        max_depth: usize,
        min_samples_split: usize,
        rng: &mut ChaCha8Rng,
    ) -> Self {
        let mut tree = Self { nodes: Vec::new() };
        tree.grow_node(x, y, indices, n_classes, n_candidates, max_depth, min_samples_split, rng);
        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn grow_node(
        &mut self,
        x: &[SparseVector],
        y: &[usize],
        indices: &[usize],
        n_classes: usize,
        n_candidates: usize,
        depth_left: usize,
        min_samples_split: usize,
        rng: &mut ChaCha8Rng,
    ) -> usize {
        let counts = class_counts(y, indices, n_classes);
        let majority = argmax_counts(&counts);

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        if pure || depth_left == 0 || indices.len() < min_samples_split {
            self.nodes.push(TreeNode::Leaf { class: majority });
            return self.nodes.len() - 1;
        }

        match best_split(x, y, indices, n_classes, n_candidates, rng) {
            Some((feature, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|&idx| x[idx].get(feature) <= threshold);
                if left_idx.is_empty() || right_idx.is_empty() {
                    self.nodes.push(TreeNode::Leaf { class: majority });
                    return self.nodes.len() - 1;
                }
                let left = self.grow_node(
                    x,
                    y,
                    &left_idx,
                    n_classes,
                    n_candidates,
                    depth_left - 1,
                    min_samples_split,
                    rng,
                );
                let right = self.grow_node(
                    x,
                    y,
                    &right_idx,
                    n_classes,
                    n_candidates,
                    depth_left - 1,
                    min_samples_split,
                    rng,
                );
                self.nodes.push(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                });
                self.nodes.len() - 1
            }
            None => {
                self.nodes.push(TreeNode::Leaf { class: majority });
                self.nodes.len() - 1
            }
        }
    }

    fn predict(&self, x: &SparseVector) -> usize {
        // The root is the last node pushed.
        let mut node = self.nodes.len() - 1;
        loop {
            match &self.nodes[node] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if x.get(*feature) <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

fn class_counts(y: &[usize], indices: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &idx in indices {
        counts[y[idx]] += 1;
    }
    counts
}

fn argmax_counts(counts: &[usize]) -> usize {
    let mut best = 0usize;
    let mut best_count = 0usize;
    for (class, &count) in counts.iter().enumerate() {
        if count > best_count {
            best_count = count;
            best = class;
        }
    }
    best
}

fn gini(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Pick the gini-best `(feature, threshold)` among a random feature subset.
fn best_split(
    x: &[SparseVector],
    y: &[usize],
    indices: &[usize],
    n_classes: usize,
    n_candidates: usize,
    rng: &mut ChaCha8Rng,
) -> Option<(u32, f64)> {
    // Candidate features are those present at this node, plus the implicit
    // zero value every sparse vector carries for them.
    let mut present: Vec<u32> = indices
        .iter()
        .flat_map(|&idx| x[idx].indices.iter().copied())
        .collect();
    present.sort_unstable();
    present.dedup();
    if present.is_empty() {
        return None;
    }
    present.shuffle(rng);
    present.truncate(n_candidates.max(1));

    let parent_gini = gini(&class_counts(y, indices, n_classes));
    let total = indices.len() as f64;

    let mut best: Option<(u32, f64)> = None;
    let mut best_gain = 1e-12;

    for &feature in &present {
        let mut values: Vec<f64> = indices.iter().map(|&idx| x[idx].get(feature)).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        values.dedup();
        if values.len() < 2 {
            continue;
        }

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let mut left = vec![0usize; n_classes];
            let mut right = vec![0usize; n_classes];
            for &idx in indices {
                if x[idx].get(feature) <= threshold {
                    left[y[idx]] += 1;
                } else {
                    right[y[idx]] += 1;
                }
            }
            let n_left: usize = left.iter().sum();
            let n_right: usize = right.iter().sum();
            if n_left == 0 || n_right == 0 {
                continue;
            }
            let weighted =
                (n_left as f64 / total) * gini(&left) + (n_right as f64 / total) * gini(&right);
            let gain = parent_gini - weighted;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, threshold));
            }
        }
    }
    best
}

/// Random forest of gini decision trees.
#[derive(Debug, Clone)]
pub struct RandomForest {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub seed: u64,
    trees: Vec<DecisionTree>,
    n_classes: usize,
}

impl RandomForest {
    pub fn new(seed: u64) -> Self {
        Self {
            n_trees: 100,
            max_depth: 20,
            min_samples_split: 2,
            seed,
            trees: Vec::new(),
            n_classes: 0,
        }
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        "Random Forest"
    }

    fn description(&self) -> &str {
        "Random forest (gini splits, bootstrap sampling, sqrt feature subsets)"
    }

    fn fit(&mut self, data: &TrainData) -> Result<()> {
        data.validate()?;
        self.n_classes = data.n_classes;
        self.trees.clear();

        let n_candidates = (data.n_features as f64).sqrt().ceil() as usize;
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        for _ in 0..self.n_trees {
            let bootstrap: Vec<usize> = (0..data.x.len())
                .map(|_| rng.gen_range(0..data.x.len()))
                .collect();
            let tree = DecisionTree::grow(
                data.x,
                data.y,
                &bootstrap,
                data.n_classes,
                n_candidates,
                self.max_depth,
                self.min_samples_split,
                &mut rng,
            );
            self.trees.push(tree);
        }
        Ok(())
    }

    fn predict(&self, x: &SparseVector) -> usize {
        if self.trees.is_empty() {
            return 0;
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            votes[tree.predict(x)] += 1;
        }
        argmax_counts(&votes)
    }
}

/// The fixed candidate set, in report order.
pub fn candidate_models(seed: u64) -> Vec<Box<dyn Classifier>> {
    vec![
        Box::new(MultinomialNb::new(1.0)),
        Box::new(LogisticRegression::new(seed)),
        Box::new(RandomForest::new(seed)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(indices: &[u32]) -> SparseVector {
        let norm = (indices.len() as f64).sqrt();
        SparseVector {
            indices: indices.to_vec(),
            values: vec![1.0 / norm; indices.len()],
        }
    }

    /// Two cleanly separable classes over four features.
    fn toy_data() -> (Vec<SparseVector>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for _ in 0..8 {
            x.push(unit(&[0, 1]));
            y.push(0);
            x.push(unit(&[2, 3]));
            y.push(1);
        }
        (x, y)
    }

    fn check_learns_toy_data(model: &mut dyn Classifier) {
        let (x, y) = toy_data();
        let data = TrainData {
            x: &x,
            y: &y,
            n_classes: 2,
            n_features: 4,
        };
        model.fit(&data).unwrap();

        assert_eq!(model.predict(&unit(&[0, 1])), 0, "{} failed", model.name());
        assert_eq!(model.predict(&unit(&[2, 3])), 1, "{} failed", model.name());
    }

    #[test]
    fn test_naive_bayes_learns_separable_data() {
        check_learns_toy_data(&mut MultinomialNb::new(1.0));
    }

    #[test]
    fn test_logistic_regression_learns_separable_data() {
        check_learns_toy_data(&mut LogisticRegression::new(42));
    }

    #[test]
    fn test_random_forest_learns_separable_data() {
        check_learns_toy_data(&mut RandomForest::new(42));
    }

    #[test]
    fn test_empty_training_set_is_error() {
        let data = TrainData {
            x: &[],
            y: &[],
            n_classes: 2,
            n_features: 4,
        };
        assert!(MultinomialNb::new(1.0).fit(&data).is_err());
    }

    #[test]
    fn test_out_of_range_label_is_error() {
        let (x, _) = toy_data();
        let y = vec![5; x.len()];
        let data = TrainData {
            x: &x,
            y: &y,
            n_classes: 2,
            n_features: 4,
        };
        assert!(LogisticRegression::new(42).fit(&data).is_err());
    }

    #[test]
    fn test_forest_is_seeded() {
        let (x, y) = toy_data();
        let data = TrainData {
            x: &x,
            y: &y,
            n_classes: 2,
            n_features: 4,
        };

        let mut first = RandomForest::new(7);
        first.fit(&data).unwrap();
        let mut second = RandomForest::new(7);
        second.fit(&data).unwrap();

        let probe = unit(&[0, 3]);
        assert_eq!(first.predict(&probe), second.predict(&probe));
    }

    #[test]
    fn test_candidate_models_roster() {
        let models = candidate_models(42);
        let names: Vec<&str> = models.iter().map(|m| m.name()).collect();
        assert_eq!(names, vec!["Naive Bayes", "Logistic Regression", "Random Forest"]);
    }

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[1.0, 2.0, 3.0]);
        let sum: f64 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        assert!(probs[2] > probs[1] && probs[1] > probs[0]);
    }
}
