//! TF-IDF vectorization of caption batches.
//!
//! Converts a batch of raw captions into a sparse feature matrix of TF-IDF
//! weights plus the vocabulary defining its columns. The vocabulary is built
//! fresh per batch; nothing is persisted across calls, so column indices are
//! only meaningful within a single batch.
//!
//! Weighting follows the common smoothed formulation: raw term count times
//! `ln((1 + n) / (1 + df)) + 1`, with each row L2-normalized afterwards.

use std::collections::{BTreeMap, HashMap, HashSet};

use sprs::{CsMat, TriMat};

use crate::config::VectorizerConfig;

/// TF-IDF vectorizer over unigrams/bigrams with document-frequency filtering.
///
/// Stateless between calls: [`fit_transform`](Self::fit_transform) derives
/// the vocabulary from its input batch alone.
#[derive(Debug, Clone, Default)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
}

impl TfidfVectorizer {
    /// Create a vectorizer with the given configuration.
    pub fn new(config: VectorizerConfig) -> Self {
        Self { config }
    }

    /// Set the maximum document-frequency ratio.
    pub fn with_max_df(mut self, max_df: f32) -> Self {
        self.config.max_df = max_df;
        self
    }

    /// Set the minimum document count.
    pub fn with_min_df(mut self, min_df: usize) -> Self {
        self.config.min_df = min_df;
        self
    }

    /// Set the inclusive n-gram size range.
    pub fn with_ngram_range(mut self, ngram_range: (usize, usize)) -> Self {
        self.config.ngram_range = ngram_range;
        self
    }

    /// Vectorize a batch of documents.
    ///
    /// Returns the sparse TF-IDF matrix (one row per document, rows
    /// L2-normalized) and the vocabulary, index-aligned with matrix columns
    /// and sorted lexicographically.
    ///
    /// A batch where filtering eliminates every candidate term produces a
    /// matrix with zero columns and an empty vocabulary; an empty batch
    /// produces a 0x0 matrix. Neither is an error.
    pub fn fit_transform(&self, documents: &[String]) -> (CsMat<f32>, Vec<String>) {
        let n_docs = documents.len();
        if n_docs == 0 {
            return (TriMat::new((0, 0)).to_csr(), Vec::new());
        }

        let doc_ngrams: Vec<Vec<String>> = documents
            .iter()
            .map(|doc| self.ngrams(doc))
            .collect();

        // Document frequency per term (each term counted once per document).
        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for ngrams in &doc_ngrams {
            let unique: HashSet<&str> = ngrams.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.config.max_df * n_docs as f32;
        let vocabulary: Vec<String> = doc_freq
            .iter()
            .filter(|(_, &df)| df >= self.config.min_df && df as f32 <= max_doc_count)
            .map(|(&term, _)| term.to_string())
            .collect();

        if vocabulary.is_empty() {
            return (TriMat::new((n_docs, 0)).to_csr(), vocabulary);
        }

        let term_index: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let idf: Vec<f32> = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq[term.as_str()] as f32;
                ((1.0 + n_docs as f32) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let mut matrix = TriMat::new((n_docs, vocabulary.len()));
        for (row, ngrams) in doc_ngrams.iter().enumerate() {
            let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
            for term in ngrams {
                if let Some(&col) = term_index.get(term.as_str()) {
                    *counts.entry(col).or_insert(0) += 1;
                }
            }

            let weighted: Vec<(usize, f32)> = counts
                .into_iter()
                .map(|(col, count)| (col, count as f32 * idf[col]))
                .collect();
            let norm = weighted
                .iter()
                .map(|(_, w)| w * w)
                .sum::<f32>()
                .sqrt();
            if norm == 0.0 {
                continue;
            }
            for (col, weight) in weighted {
                matrix.add_triplet(row, col, weight / norm);
            }
        }

        (matrix.to_csr(), vocabulary)
    }

    /// All n-grams of the configured sizes, in document order.
    fn ngrams(&self, document: &str) -> Vec<String> {
        let tokens = tokenize(document);
        let (lo, hi) = self.config.ngram_range;
        let mut out = Vec::new();
        for n in lo..=hi.max(lo) {
            if n == 0 || n > tokens.len() {
                continue;
            }
            for window in tokens.windows(n) {
                out.push(window.join(" "));
            }
        }
        out
    }
}

/// Lowercase word tokens of at least two characters.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2)
        .map(String::from)
        .collect()
}
