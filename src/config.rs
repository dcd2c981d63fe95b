//! Pipeline configuration.
//!
//! One immutable [`TrendConfig`] value is built at startup and passed into
//! [`TrendPipeline::new`](crate::pipeline::TrendPipeline::new). Components
//! never read process-wide state.

/// Configuration for the TF-IDF vectorizer stage.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorizerConfig {
    /// Drop terms appearing in more than this fraction of documents.
    pub max_df: f32,
    /// Drop terms appearing in fewer than this many documents.
    pub min_df: usize,
    /// Inclusive n-gram size range, e.g. `(1, 2)` for unigrams and bigrams.
    pub ngram_range: (usize, usize),
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            max_df: 0.9,
            min_df: 2,
            ngram_range: (1, 2),
        }
    }
}

/// Configuration for the whole trend clustering pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    /// Vectorizer settings.
    pub vectorizer: VectorizerConfig,
    /// Minimum number of documents for a cluster to form.
    pub min_cluster_size: usize,
    /// k for core distance estimation. `None` falls back to
    /// `min_cluster_size`.
    pub min_samples: Option<usize>,
    /// Number of terms to report per cluster.
    pub top_terms: usize,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            vectorizer: VectorizerConfig::default(),
            min_cluster_size: 2,
            min_samples: None,
            top_terms: 8,
        }
    }
}

impl TrendConfig {
    /// Set the minimum cluster size.
    pub fn with_min_cluster_size(mut self, min_cluster_size: usize) -> Self {
        self.min_cluster_size = min_cluster_size;
        self
    }

    /// Set `min_samples` explicitly instead of the `min_cluster_size` fallback.
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = Some(min_samples);
        self
    }

    /// Set the number of top terms reported per cluster.
    pub fn with_top_terms(mut self, top_terms: usize) -> Self {
        self.top_terms = top_terms;
        self
    }

    /// Set the vectorizer settings.
    pub fn with_vectorizer(mut self, vectorizer: VectorizerConfig) -> Self {
        self.vectorizer = vectorizer;
        self
    }
}
