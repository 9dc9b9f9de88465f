// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Quickfact Contributors

//! TF-IDF feature extraction
//!
//! Converts statement text into sparse, L2-normalized TF-IDF vectors over a
//! vocabulary of the most frequent terms. The vocabulary and IDF weights are
//! fit on the training partition only; terms outside the vocabulary are
//! ignored at transform time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 5000;

/// English stopwords removed before counting terms.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "cannot", "could", "did", "do", "does", "doing", "down", "during", "each",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here",
    "hers", "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

/// A sparse feature vector with indices sorted ascending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Value at `feature`, 0.0 when absent.
    pub fn get(&self, feature: u32) -> f64 {
        match self.indices.binary_search(&feature) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Iterate `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn l2_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }
}

/// TF-IDF vectorizer with a frequency-capped vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Term to feature index mapping.
    pub vocabulary: HashMap<String, usize>,
    /// Smoothed inverse document frequency per feature index.
    pub idf: Vec<f64>,
    /// Maximum number of features to keep.
    pub max_features: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            max_features,
        }
    }

    /// Number of features after fitting.
    pub fn n_features(&self) -> usize {
        self.vocabulary.len()
    }

    /// Lowercase and split on non-alphanumeric characters, dropping
    /// stopwords and single-character tokens.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|token| token.len() >= 2 && !STOPWORDS.contains(token))
            .map(str::to_string)
            .collect()
    }

    /// Build the vocabulary and IDF weights from training documents.
    ///
    /// The top `max_features` terms by collection frequency are kept, ties
    /// broken alphabetically, so fitting is deterministic for a fixed corpus.
    pub fn fit(&mut self, documents: &[&str]) {
        let mut term_freq: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = Self::tokenize(doc);
            let unique: std::collections::HashSet<&String> = tokens.iter().collect();
            for token in &unique {
                *doc_freq.entry((*token).clone()).or_insert(0) += 1;
            }
            for token in tokens {
                *term_freq.entry(token).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(&String, &usize)> = term_freq.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        let mut selected: Vec<&String> =
            ranked.iter().take(self.max_features).map(|(term, _)| *term).collect();
        selected.sort();

        self.vocabulary = selected
            .iter()
            .enumerate()
            .map(|(idx, term)| ((*term).clone(), idx))
            .collect();

        let n_docs = documents.len() as f64;
        self.idf = vec![0.0; self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            let df = *doc_freq.get(term).unwrap_or(&0) as f64;
            self.idf[idx] = ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0;
        }
    }

    /// Transform a document into an L2-normalized sparse TF-IDF vector.
    pub fn transform(&self, document: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in Self::tokenize(document) {
            if let Some(&idx) = self.vocabulary.get(&token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut pairs: Vec<(u32, f64)> = counts
            .into_iter()
            .map(|(idx, tf)| (idx as u32, tf * self.idf[idx]))
            .collect();
        pairs.sort_unstable_by_key(|(idx, _)| *idx);

        let norm = pairs.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, value) in &mut pairs {
                *value /= norm;
            }
        }

        let (indices, values) = pairs.into_iter().unzip();
        SparseVector { indices, values }
    }

    /// Fit on `documents` and transform each of them.
    pub fn fit_transform(&mut self, documents: &[&str]) -> Vec<SparseVector> {
        self.fit(documents);
        documents.iter().map(|doc| self.transform(doc)).collect()
    }
}
