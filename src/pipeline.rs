//! The three-stage trend detection pipeline.
//!
//! Documents flow strictly forward: captions -> TF-IDF matrix -> cluster
//! labels -> per-cluster term summaries. A [`TrendPipeline`] holds only
//! configuration; every call to [`detect`](TrendPipeline::detect) builds and
//! discards its own matrix and label array, so one pipeline value can serve
//! concurrent requests without coordination.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cluster::{Clustering, Hdbscan, NOISE};
use crate::config::TrendConfig;
use crate::error::{Error, Result};
use crate::summarize::{top_terms_per_cluster, ClusterSummary};
use crate::vectorize::TfidfVectorizer;

/// A batch of captions to cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendRequest {
    /// Raw caption texts, order-significant.
    pub texts: Vec<String>,
}

impl TrendRequest {
    /// Parse a request from its JSON wire form.
    ///
    /// Malformed payloads (missing `texts`, non-string entries) surface as
    /// [`Error::InvalidInput`]; no partial processing is attempted.
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload).map_err(|e| Error::InvalidInput(e.to_string()))
    }
}

/// Cluster labels and summaries for one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendResponse {
    /// One label per input text, aligned by position. `-1` is noise.
    pub labels: Vec<i32>,
    /// One entry per distinct non-noise label, ascending by cluster id.
    pub clusters: Vec<ClusterSummary>,
}

/// Stateless trend detection over caption batches.
#[derive(Debug, Clone)]
pub struct TrendPipeline {
    vectorizer: TfidfVectorizer,
    clusterer: Hdbscan,
    top_terms: usize,
}

impl TrendPipeline {
    /// Build a pipeline from an immutable configuration value.
    pub fn new(config: TrendConfig) -> Self {
        let mut clusterer = Hdbscan::new().with_min_cluster_size(config.min_cluster_size);
        if let Some(min_samples) = config.min_samples {
            clusterer = clusterer.with_min_samples(min_samples);
        }
        Self {
            vectorizer: TfidfVectorizer::new(config.vectorizer),
            clusterer,
            top_terms: config.top_terms,
        }
    }

    /// Run the full pipeline over one batch of captions.
    ///
    /// The output `labels` always has the same length as `texts`; an empty
    /// batch short-circuits to empty labels and clusters. A batch with no
    /// discoverable structure comes back all-noise with no clusters, which is
    /// a valid outcome rather than an error.
    pub fn detect(&self, texts: &[String]) -> Result<TrendResponse> {
        let started = Instant::now();
        if texts.is_empty() {
            return Ok(TrendResponse {
                labels: Vec::new(),
                clusters: Vec::new(),
            });
        }

        let (matrix, vocabulary) = self.vectorizer.fit_transform(texts);
        if matrix.rows() != texts.len() {
            return Err(Error::Clustering {
                rows: matrix.rows(),
                documents: texts.len(),
            });
        }
        debug!(
            documents = texts.len(),
            vocabulary = vocabulary.len(),
            "vectorized caption batch"
        );

        let labels = self.clusterer.fit_predict(&matrix)?;
        let clusters = top_terms_per_cluster(&matrix, &vocabulary, &labels, self.top_terms);

        info!(
            documents = texts.len(),
            clusters = clusters.len(),
            noise = labels.iter().filter(|&&l| l == NOISE).count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "trend detection complete"
        );
        Ok(TrendResponse { labels, clusters })
    }

    /// Convenience wrapper over [`detect`](Self::detect) for a parsed request.
    pub fn handle(&self, request: &TrendRequest) -> Result<TrendResponse> {
        self.detect(&request.texts)
    }
}

impl Default for TrendPipeline {
    fn default() -> Self {
        Self::new(TrendConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn empty_batch_short_circuits() {
        let response = TrendPipeline::default().detect(&[]).unwrap();
        assert!(response.labels.is_empty());
        assert!(response.clusters.is_empty());
    }

    #[test]
    fn single_document_is_noise() {
        let response = TrendPipeline::default()
            .detect(&batch(&["great charcoal grill night"]))
            .unwrap();
        assert_eq!(response.labels, vec![NOISE]);
        assert!(response.clusters.is_empty());
    }

    #[test]
    fn from_json_accepts_wire_form() {
        let request = TrendRequest::from_json(r#"{"texts": ["one post", "two post"]}"#).unwrap();
        assert_eq!(request.texts.len(), 2);
    }

    #[test]
    fn from_json_rejects_non_string_entries() {
        let err = TrendRequest::from_json(r#"{"texts": ["one post", 2]}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn from_json_rejects_missing_field() {
        let err = TrendRequest::from_json(r#"{"captions": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn response_serializes_to_wire_contract() {
        let response = TrendResponse {
            labels: vec![0, 0, -1],
            clusters: vec![ClusterSummary {
                cluster: 0,
                top_terms: vec!["grill".to_string()],
            }],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["labels"][2], -1);
        assert_eq!(json["clusters"][0]["cluster"], 0);
        assert_eq!(json["clusters"][0]["top_terms"][0], "grill");
    }
}
