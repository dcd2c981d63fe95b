//! From cluster partitions to human-readable trend labels.
//!
//! The cluster engine only partitions rows; it produces no centroids. This
//! stage recomputes them externally: for each non-noise label it averages the
//! member rows of the TF-IDF matrix componentwise and reads off the
//! highest-weighted vocabulary terms.

use serde::{Deserialize, Serialize};
use sprs::CsMat;

use crate::cluster::NOISE;

/// One detected trend: its cluster id and top terms, weight-descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster id as found in the label assignment.
    pub cluster: i32,
    /// Highest-weighted vocabulary terms of the cluster centroid.
    pub top_terms: Vec<String>,
}

/// Summarize every non-noise cluster in `labels`, ascending by cluster id.
///
/// For each cluster the centroid is the componentwise arithmetic mean of its
/// member rows. Terms are ranked by centroid weight descending; ties break by
/// vocabulary index ascending, so output is deterministic for identical
/// input. At most `top_k` terms are reported, fewer when the vocabulary is
/// smaller.
///
/// An all-noise assignment (or an empty batch) yields an empty vector.
/// Vocabulary entries beyond the matrix width have no weights to rank and
/// are ignored.
pub fn top_terms_per_cluster(
    matrix: &CsMat<f32>,
    vocabulary: &[String],
    labels: &[i32],
    top_k: usize,
) -> Vec<ClusterSummary> {
    let n_terms = vocabulary.len().min(matrix.cols());

    let mut cluster_ids: Vec<i32> = labels.iter().copied().filter(|&l| l != NOISE).collect();
    cluster_ids.sort_unstable();
    cluster_ids.dedup();

    cluster_ids
        .into_iter()
        .map(|cluster| {
            let members: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, &l)| l == cluster)
                .map(|(row, _)| row)
                .collect();

            let centroid = centroid(matrix, &members);

            let mut order: Vec<usize> = (0..n_terms).collect();
            order.sort_by(|&a, &b| centroid[b].total_cmp(&centroid[a]).then(a.cmp(&b)));

            let top_terms = order
                .into_iter()
                .take(top_k)
                .map(|i| vocabulary[i].clone())
                .collect();

            ClusterSummary { cluster, top_terms }
        })
        .collect()
}

/// Componentwise mean of the given matrix rows, densified.
fn centroid(matrix: &CsMat<f32>, members: &[usize]) -> Vec<f32> {
    let mut sums = vec![0.0f32; matrix.cols()];
    for &row in members {
        if let Some(row_vec) = matrix.outer_view(row) {
            for (col, &value) in row_vec.iter() {
                sums[col] += value;
            }
        }
    }
    let count = members.len() as f32;
    if count > 0.0 {
        for value in &mut sums {
            *value /= count;
        }
    }
    sums
}
