//! Status condition matching
//!
//! Kubernetes resources report progress through `status.conditions`
//! entries of the form `{type, status, reason, ...}`. A [`Condition`]
//! describes the entry a caller wants to see before a wait completes.

use crate::object::ResourceObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Value of a condition's `status` field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    /// The condition holds.
    #[default]
    True,
    /// The condition does not hold.
    False,
    /// The controller cannot determine the condition.
    Unknown,
}

impl ConditionStatus {
    fn as_str(self) -> &'static str {
        match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A desired `status.conditions` entry.
///
/// The reason participates in matching only when set; type and status
/// always do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition type, e.g. `Available` or `Ready`.
    #[serde(rename = "type")]
    pub condition_type: String,

    /// Desired status value, defaults to `True`.
    #[serde(default)]
    pub status: ConditionStatus,

    /// Optional reason the condition must carry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Condition {
    /// Condition on a type with the default `True` status.
    pub fn new(condition_type: impl Into<String>) -> Self {
        Self {
            condition_type: condition_type.into(),
            status: ConditionStatus::True,
            reason: None,
        }
    }

    /// Same condition with an explicit status.
    #[must_use]
    pub fn with_status(mut self, status: ConditionStatus) -> Self {
        self.status = status;
        self
    }

    /// Same condition with a required reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Whether the live object's `status.conditions` contains a matching
    /// entry.
    pub fn is_met_by(&self, obj: &ResourceObject) -> bool {
        obj.status_conditions().iter().any(|entry| self.matches(entry))
    }

    fn matches(&self, entry: &Value) -> bool {
        let matching_type = entry
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| t == self.condition_type);
        let matching_status = entry
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s == self.status.as_str());
        let matching_reason = match &self.reason {
            Some(reason) => entry
                .get("reason")
                .and_then(Value::as_str)
                .is_some_and(|r| r == reason),
            None => true,
        };
        matching_type && matching_status && matching_reason
    }
}
