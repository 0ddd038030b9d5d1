//! Cluster accessor errors

use thiserror::Error;

/// Errors that can occur when accessing the cluster.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// The object does not exist (404). Benign when deleting.
    #[error("not found: {0}")]
    NotFound(String),

    /// Concurrent modification was detected (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request was rejected by authorization (401/403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The API server rejected the request for another reason.
    #[error("API error: {0}")]
    Api(String),

    /// The API server could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClusterError {
    /// Whether this error means the object is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }

    /// Whether this error is worth retrying within a wait loop's
    /// timeout budget.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClusterError::Transport(_))
    }
}
