//! Caption trend clustering.
//!
//! `captrend` turns a batch of free-text social-media captions into trend
//! clusters with human-readable labels. The pipeline has three stages:
//!
//! 1. [`vectorize`] — TF-IDF over unigrams and bigrams with
//!    document-frequency filtering, producing a sparse feature matrix.
//! 2. [`cluster`] — HDBSCAN density clustering; captions outside any dense
//!    region are labeled noise (`-1`) instead of being forced into a group.
//! 3. [`summarize`] — per-cluster centroids computed over the raw feature
//!    rows, with the top-weighted vocabulary terms as the cluster label.
//!
//! Everything is batch-local: no vocabulary, matrix, or label survives a
//! call, so [`pipeline::TrendPipeline`] is freely shareable across threads.
//!
//! ```rust
//! use captrend::{TrendConfig, TrendPipeline};
//!
//! let pipeline = TrendPipeline::new(TrendConfig::default());
//! let texts: Vec<String> = [
//!     "great charcoal grill night",
//!     "great charcoal grill night",
//!     "totally unrelated topic",
//! ]
//! .iter()
//! .map(|t| t.to_string())
//! .collect();
//!
//! let response = pipeline.detect(&texts).unwrap();
//! assert_eq!(response.labels.len(), 3);
//! assert_eq!(response.labels[0], response.labels[1]);
//! ```

#![forbid(unsafe_code)]

pub mod cluster;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod summarize;
pub mod vectorize;

pub use cluster::{Clustering, Hdbscan, NOISE};
pub use config::{TrendConfig, VectorizerConfig};
pub use error::{Error, Result};
pub use pipeline::{TrendPipeline, TrendRequest, TrendResponse};
pub use summarize::ClusterSummary;
pub use vectorize::TfidfVectorizer;
