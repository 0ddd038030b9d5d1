//! Declarative reconciliation engine
//!
//! Given one or more desired resource definitions, converge the
//! cluster's actual state to match them and report exactly what
//! changed. One-shot and sequential: each object is fetched, diffed,
//! and applied in input order through a [`cluster_client::ClusterClientTrait`],
//! optionally waiting for a readiness condition afterwards.
//!
//! The moving parts:
//!
//! - [`merge`]: pure patch computation (JSON merge, strategic merge,
//!   three-way apply diffs).
//! - [`planner`]: decides create/patch/delete/noop for one object.
//! - [`reconciler`]: orchestrates fetch, plan, apply, and wait and owns
//!   check-mode short-circuiting.
//! - [`waiter`]: polls until a condition or built-in readiness
//!   predicate holds, or the timeout budget runs out.
//! - [`result`]: per-object outcomes and the aggregated summary.

pub mod error;
pub mod merge;
pub mod options;
pub mod planner;
pub mod readiness;
pub mod reconciler;
pub mod result;
pub mod validate;
pub mod waiter;

#[cfg(test)]
mod reconciler_test;

pub use cluster_client::MergeType;
pub use error::EngineError;
pub use options::{ReconcileOptions, State, ValidationPolicy, WaitSpec};
pub use planner::{Plan, LAST_APPLIED_ANNOTATION};
pub use reconciler::Reconciler;
pub use result::{ReconcileAction, ReconcileResult, ResultAggregator, Summary};
pub use validate::{SchemaValidator, ValidationIssue};
pub use waiter::{WaitFor, WaitOutcome, Waiter};
