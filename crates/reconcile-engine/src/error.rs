//! Engine error types

use cluster_client::ClusterError;
use thiserror::Error;

/// Errors raised while reconciling resource definitions.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Conflicting or invalid caller options. Always raised before any
    /// cluster access.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A resource definition is unusable (missing name, unparseable
    /// body, ...).
    #[error("invalid resource definition: {0}")]
    Definition(String),

    /// No configured merge type produced a valid patch.
    #[error("cannot compute a patch for {id}: none of the merge types [{attempted}] apply")]
    Planning {
        /// Identity of the object being patched.
        id: String,
        /// Comma-separated merge types that were attempted.
        attempted: String,
    },

    /// Schema validation reported issues under a fail-on-error policy.
    #[error("validation failed for {id}: {}", issues.join("; "))]
    Validation {
        /// Identity of the object that failed validation.
        id: String,
        /// Messages from the validator.
        issues: Vec<String>,
    },

    /// Cluster accessor failure (not found, conflict, forbidden,
    /// transport).
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    /// A requested wait did not complete within its timeout budget.
    /// The applied change is kept; only the wait itself failed.
    #[error("timed out after {elapsed_seconds}s waiting for {id}")]
    WaitTimeout {
        /// Identity of the object being waited on.
        id: String,
        /// Seconds spent polling before giving up.
        elapsed_seconds: u64,
    },
}
