use thiserror::Error;

/// Errors returned by the trend clustering pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed request payload (missing field, non-string entries).
    ///
    /// A client error: the request was never processed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The feature matrix does not line up with the document batch.
    ///
    /// A server error: this indicates a bug at the vectorizer/clustering
    /// boundary, not a recoverable condition.
    #[error("clustering error: feature matrix has {rows} rows, batch has {documents} documents")]
    Clustering {
        /// Row count of the feature matrix.
        rows: usize,
        /// Number of documents in the batch.
        documents: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter {name}: {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Human-readable explanation.
        message: &'static str,
    },
}

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, Error>;
