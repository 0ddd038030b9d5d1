//! Cluster accessor abstraction
//!
//! The reconciliation engine talks to the cluster exclusively through
//! [`ClusterClientTrait`]: get, create, patch, delete, with structured
//! errors distinguishing not-found, conflict, authorization, and
//! transport failures. Two implementations are provided:
//!
//! - [`KubeClusterClient`]: the real accessor, backed by `kube`'s
//!   dynamic API so arbitrary (including custom) kinds work without
//!   generated types.
//! - [`MockClusterClient`] (behind the `test-util` feature): an
//!   in-memory store with an operation log and scriptable error
//!   injection, for unit-testing reconciliation logic without a
//!   cluster.

pub mod error;
pub mod kube_client;
#[path = "trait.rs"]
pub mod accessor_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use accessor_trait::{ClusterClientTrait, MergeType};
pub use error::ClusterError;
pub use kube_client::KubeClusterClient;
#[cfg(feature = "test-util")]
pub use mock::MockClusterClient;
