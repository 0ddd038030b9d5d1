//! Reconciliation options
//!
//! The caller-facing knobs: desired state, merge strategy selection,
//! wait behavior, check mode, and failure policy. Conflicting options
//! are rejected here, before any cluster access happens.

use crate::error::EngineError;
use cluster_client::MergeType;
use resource_model::Condition;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Whether the desired object should exist on the cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Converge to the desired definition.
    #[default]
    Present,
    /// Remove the object if it exists.
    Absent,
}

/// Wait behavior after an object is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitSpec {
    /// Whether to wait at all.
    pub enabled: bool,
    /// Explicit condition to wait for; falls back to the built-in
    /// per-kind readiness predicate when unset.
    pub condition: Option<Condition>,
    /// Total wait budget in seconds.
    pub timeout_seconds: u64,
    /// Seconds to sleep between polls.
    pub sleep_seconds: u64,
}

impl Default for WaitSpec {
    fn default() -> Self {
        Self {
            enabled: false,
            condition: None,
            timeout_seconds: 120,
            sleep_seconds: 5,
        }
    }
}

impl WaitSpec {
    /// Total wait budget.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Sleep between polls. A zero sleep would spin, so it is clamped
    /// to one second; a sleep above the timeout degenerates to a
    /// single poll in the waiter.
    pub fn sleep(&self) -> Duration {
        Duration::from_secs(self.sleep_seconds.max(1))
    }
}

/// Policy for the optional schema validator collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPolicy {
    /// Whether a non-empty issue list fails the object (otherwise
    /// issues are recorded as warnings).
    pub fail_on_error: bool,
    /// Kubernetes version to validate against; validator picks a
    /// default when unset.
    pub version: Option<String>,
    /// Whether unexpected properties are issues.
    pub strict: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            fail_on_error: false,
            version: None,
            strict: true,
        }
    }
}

/// Options for one reconciliation invocation.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOptions {
    /// Desired state for every object in the batch.
    pub state: State,
    /// Compute and report what would change without writing.
    pub check_mode: bool,
    /// Three-way apply mode: diff desired against the last-applied
    /// definition rather than full live state. Mutually exclusive with
    /// an explicit `merge_types` list.
    pub apply: bool,
    /// Ordered merge-type preference for patches. Defaults to
    /// strategic merge first, then JSON merge.
    pub merge_types: Option<Vec<MergeType>>,
    /// Append a content-hash suffix to ConfigMap/Secret names.
    pub append_hash: bool,
    /// Wait behavior after each object is applied.
    pub wait: WaitSpec,
    /// Abort the batch at the first failed object instead of recording
    /// the failure and continuing.
    pub fail_fast: bool,
    /// Schema validation policy; validation runs only when a validator
    /// collaborator is configured on the reconciler.
    pub validation: Option<ValidationPolicy>,
}

impl ReconcileOptions {
    /// Rejects conflicting options. Must pass before the engine makes
    /// any cluster call.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.apply && self.merge_types.is_some() {
            return Err(EngineError::Config(
                "apply and merge_type are mutually exclusive".to_owned(),
            ));
        }
        Ok(())
    }

    /// Merge types to attempt, in order. Mirrors the default of trying
    /// strategic merge first and falling back to JSON merge, which
    /// covers batches mixing built-in kinds and custom resources.
    pub fn merge_type_order(&self) -> Vec<MergeType> {
        self.merge_types
            .clone()
            .unwrap_or_else(|| vec![MergeType::StrategicMerge, MergeType::Merge])
    }
}
