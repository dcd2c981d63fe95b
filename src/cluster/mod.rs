//! Density-based clustering of caption feature vectors.
//!
//! The cluster engine groups sparse TF-IDF rows into trends without a
//! predetermined cluster count. It is deliberately noise-tolerant: captions
//! that sit in no dense region of feature space are labeled [`NOISE`] rather
//! than forced into the nearest group.
//!
//! The single implemented algorithm is HDBSCAN, chosen because trend batches
//! have unknown cluster counts and varying densities, and because its
//! stability-based extraction is deterministic for a fixed input ordering.
//!
//! ## Usage
//!
//! ```rust
//! use captrend::cluster::{Clustering, Hdbscan, NOISE};
//! use sprs::TriMat;
//!
//! let mut tri = TriMat::new((3, 2));
//! tri.add_triplet(0, 0, 1.0f32);
//! tri.add_triplet(1, 0, 1.0);
//! tri.add_triplet(2, 1, 1.0);
//! let matrix = tri.to_csr();
//!
//! let labels = Hdbscan::new().fit_predict(&matrix).unwrap();
//! assert_eq!(labels.len(), 3);
//! assert_eq!(labels[0], labels[1]); // identical rows cluster together
//! ```
//!
//! The clustering step produces only a partition; it has no centroids to
//! report. Descriptive output (top terms per cluster) is derived afterwards
//! in [`crate::summarize`] from the raw feature rows grouped by label.

mod hdbscan;
mod traits;
mod util;

pub use hdbscan::{Hdbscan, NOISE};
pub use traits::Clustering;
