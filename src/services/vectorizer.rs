//! TF-IDF vectors over short texts such as titles.
//!
//! Tokens are lowercase runs of two or more word characters. Weights use raw
//! term counts times a smoothed IDF, `ln((1 + n) / (1 + df)) + 1`, and every
//! vector is scaled to unit length so cosine similarity is a dot product.

use std::collections::{HashMap, HashSet};

/// Sparse unit-length vector: vocabulary index to weight
pub type SparseVector = HashMap<usize, f64>;

#[derive(Debug, Clone, Default)]
pub struct TfIdfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Learns vocabulary and IDF weights from `documents`
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Self {
        let n_docs = documents.len() as f64;
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: Vec<usize> = Vec::new();

        for doc in documents {
            let unique: HashSet<String> = tokenize(doc.as_ref()).into_iter().collect();
            for term in unique {
                let next = vocabulary.len();
                let index = *vocabulary.entry(term).or_insert(next);
                if index == doc_freq.len() {
                    doc_freq.push(0);
                }
                doc_freq[index] += 1;
            }
        }

        let idf = doc_freq
            .iter()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Self { vocabulary, idf }
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Vectorizes `text` against the fitted vocabulary; unknown terms are ignored
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(text) {
            if let Some(&index) = self.vocabulary.get(&token) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut vector: SparseVector = counts
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();

        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }

    /// Fits on `documents` and returns one vector per document, in order
    pub fn fit_transform<S: AsRef<str>>(documents: &[S]) -> (Self, Vec<SparseVector>) {
        let vectorizer = Self::fit(documents);
        let vectors = documents
            .iter()
            .map(|doc| vectorizer.transform(doc.as_ref()))
            .collect();
        (vectorizer, vectors)
    }
}

/// Cosine similarity of two unit-length sparse vectors
pub fn cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(index, weight)| large.get(index).map(|other| weight * other))
        .sum()
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .map(str::to_string)
        .collect()
}
