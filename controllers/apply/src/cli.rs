//! Command-line surface
//!
//! Mirrors the option matrix of the reconciliation engine: definition
//! source, desired state, merge strategy, wait behavior, check mode.
//! Option conflicts that clap cannot express (apply vs. merge-type)
//! are validated by the engine before any cluster access.

use clap::{Parser, ValueEnum};
use cluster_client::MergeType;
use reconcile_engine::{ReconcileOptions, State, WaitSpec};
use resource_model::{Condition, ConditionStatus};
use std::path::PathBuf;

/// Declaratively reconcile Kubernetes resource objects.
#[derive(Debug, Parser)]
#[command(name = "kapply", version, about)]
pub struct Cli {
    /// Path to a (possibly multi-document) YAML definition file.
    #[arg(long, conflicts_with = "definition")]
    pub src: Option<PathBuf>,

    /// Inline YAML definition (single or multi-document).
    #[arg(long)]
    pub definition: Option<String>,

    /// Desired state for every object.
    #[arg(long, value_enum, default_value_t = StateArg::Present)]
    pub state: StateArg,

    /// Merge type preference, repeatable; tried in the given order.
    /// Defaults to strategic-merge then merge.
    #[arg(long = "merge-type", value_enum)]
    pub merge_type: Vec<MergeTypeArg>,

    /// Three-way apply against the last-applied definition.
    /// Mutually exclusive with --merge-type.
    #[arg(long)]
    pub apply: bool,

    /// Report what would change without writing.
    #[arg(long)]
    pub check: bool,

    /// Append a content-hash suffix to ConfigMap/Secret names.
    #[arg(long)]
    pub append_hash: bool,

    /// Wait for each object to reach its target state.
    #[arg(long)]
    pub wait: bool,

    /// Seconds to wait before giving up.
    #[arg(long, default_value_t = 120)]
    pub wait_timeout: u64,

    /// Seconds to sleep between wait polls.
    #[arg(long, default_value_t = 5)]
    pub wait_sleep: u64,

    /// Condition type to wait for (ignored when unset).
    #[arg(long)]
    pub wait_condition_type: Option<String>,

    /// Desired condition status.
    #[arg(long, value_enum, default_value_t = ConditionStatusArg::True)]
    pub wait_condition_status: ConditionStatusArg,

    /// Required condition reason, if any.
    #[arg(long)]
    pub wait_condition_reason: Option<String>,

    /// Abort the batch at the first failed object.
    #[arg(long)]
    pub fail_fast: bool,

    /// Default namespace for namespaced objects that specify none.
    #[arg(long)]
    pub namespace: Option<String>,

    /// Object name, for addressing a resource without a definition
    /// (typically with --state absent).
    #[arg(long)]
    pub name: Option<String>,

    /// Object kind, used together with --name.
    #[arg(long)]
    pub kind: Option<String>,

    /// API version used together with --kind/--name.
    #[arg(long, default_value = "v1")]
    pub api_version: String,
}

/// CLI value for the desired state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateArg {
    /// Converge to the desired definition.
    Present,
    /// Remove the object if it exists.
    Absent,
}

/// CLI value for a merge type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MergeTypeArg {
    /// Kubernetes strategic merge patch.
    StrategicMerge,
    /// RFC 7386 JSON merge patch.
    Merge,
}

/// CLI value for a condition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConditionStatusArg {
    /// Condition must hold.
    True,
    /// Condition must not hold.
    False,
    /// Condition state must be undeterminable.
    Unknown,
}

impl Cli {
    /// Translates parsed flags into engine options.
    pub fn reconcile_options(&self) -> ReconcileOptions {
        let merge_types = if self.merge_type.is_empty() {
            None
        } else {
            Some(
                self.merge_type
                    .iter()
                    .map(|m| match m {
                        MergeTypeArg::StrategicMerge => MergeType::StrategicMerge,
                        MergeTypeArg::Merge => MergeType::Merge,
                    })
                    .collect(),
            )
        };

        // A wait condition without a type is ignored, matching how a
        // generic wait flag is used across mixed-kind batches.
        let condition = self.wait_condition_type.as_ref().map(|condition_type| {
            let status = match self.wait_condition_status {
                ConditionStatusArg::True => ConditionStatus::True,
                ConditionStatusArg::False => ConditionStatus::False,
                ConditionStatusArg::Unknown => ConditionStatus::Unknown,
            };
            let mut condition = Condition::new(condition_type.clone()).with_status(status);
            if let Some(reason) = &self.wait_condition_reason {
                condition = condition.with_reason(reason.clone());
            }
            condition
        });

        ReconcileOptions {
            state: match self.state {
                StateArg::Present => State::Present,
                StateArg::Absent => State::Absent,
            },
            check_mode: self.check,
            apply: self.apply,
            merge_types,
            append_hash: self.append_hash,
            wait: WaitSpec {
                enabled: self.wait,
                condition,
                timeout_seconds: self.wait_timeout,
                sleep_seconds: self.wait_sleep,
            },
            fail_fast: self.fail_fast,
            validation: None,
        }
    }
}
