//! ClusterClientTrait for mocking
//!
//! This trait abstracts cluster access to enable mocking in unit tests.
//! The concrete [`crate::KubeClusterClient`] implements this trait, and
//! tests use the in-memory mock implementation.

use crate::error::ClusterError;
use resource_model::{ObjectRef, ResourceObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Wire format of a patch request.
///
/// When more than one merge type is configured, the planner tries them
/// in order; these are the types a patch can ultimately be sent with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeType {
    /// Kubernetes strategic merge patch: lists with merge-key metadata
    /// are merged by key rather than by position.
    StrategicMerge,
    /// RFC 7386 JSON merge patch: null values delete keys, lists are
    /// replaced whole.
    #[serde(rename = "merge")]
    Merge,
}

impl fmt::Display for MergeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeType::StrategicMerge => f.write_str("strategic-merge"),
            MergeType::Merge => f.write_str("merge"),
        }
    }
}

/// Trait for cluster access operations.
///
/// All async methods must be `Send` to work with Tokio's work-stealing
/// runtime.
#[async_trait::async_trait]
pub trait ClusterClientTrait: Send + Sync {
    /// Fetches the live object for an identity, `None` when absent.
    async fn get(&self, id: &ObjectRef) -> Result<Option<ResourceObject>, ClusterError>;

    /// Creates the object and returns the server's view of it.
    async fn create(&self, obj: &ResourceObject) -> Result<ResourceObject, ClusterError>;

    /// Patches the object with the given merge type and returns the
    /// server's view of the result.
    async fn patch(
        &self,
        id: &ObjectRef,
        patch: &Value,
        merge_type: MergeType,
    ) -> Result<ResourceObject, ClusterError>;

    /// Deletes the object. Surfaces [`ClusterError::NotFound`] when it
    /// was already absent; callers decide whether that is benign.
    async fn delete(&self, id: &ObjectRef) -> Result<(), ClusterError>;
}
