use sprs::CsMat;

use crate::error::Result;

/// Common interface for hard clustering over sparse feature matrices.
pub trait Clustering {
    /// Return one cluster label per matrix row.
    ///
    /// Non-negative labels are cluster ids; [`NOISE`](super::NOISE) marks
    /// rows that belong to no cluster.
    fn fit_predict(&self, matrix: &CsMat<f32>) -> Result<Vec<i32>>;
}
