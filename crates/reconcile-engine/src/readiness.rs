//! Built-in per-kind readiness predicates
//!
//! A small registry mapping kind names to readiness checks, used by the
//! waiter when no explicit condition was given. Kinds without an entry
//! are considered ready as soon as they exist (the wait becomes a
//! no-op), matching how callers expect a generic `wait` flag to behave
//! across mixed-kind batches.

use resource_model::{Condition, ResourceObject};

/// A readiness check over a live object.
pub type ReadinessCheck = fn(&ResourceObject) -> bool;

/// Kind-name to predicate registry. Extend here to teach the waiter
/// about more kinds.
const BUILTIN: &[(&str, ReadinessCheck)] = &[
    ("DaemonSet", daemon_set_ready),
    ("Deployment", deployment_ready),
    ("Pod", pod_ready),
];

/// Looks up the built-in readiness check for a kind.
pub fn builtin(kind: &str) -> Option<ReadinessCheck> {
    BUILTIN
        .iter()
        .find(|(name, _)| *name == kind)
        .map(|(_, check)| *check)
}

/// The controller has seen the latest spec revision.
fn generation_current(obj: &ResourceObject) -> bool {
    match (obj.generation(), obj.path_i64("status.observedGeneration")) {
        (Some(generation), Some(observed)) => observed >= generation,
        // No generation bookkeeping on this object; nothing to wait on.
        _ => true,
    }
}

fn deployment_ready(obj: &ResourceObject) -> bool {
    let desired = obj.path_i64("spec.replicas").unwrap_or(1);
    let ready = obj.path_i64("status.readyReplicas").unwrap_or(0);
    let updated = obj.path_i64("status.updatedReplicas").unwrap_or(0);
    generation_current(obj) && updated >= desired && ready >= desired
}

fn daemon_set_ready(obj: &ResourceObject) -> bool {
    let Some(desired) = obj.path_i64("status.desiredNumberScheduled") else {
        // Status not populated yet.
        return false;
    };
    let ready = obj.path_i64("status.numberReady").unwrap_or(0);
    generation_current(obj) && ready >= desired
}

fn pod_ready(obj: &ResourceObject) -> bool {
    match obj.path("status.phase").and_then(serde_json::Value::as_str) {
        Some("Succeeded") => true,
        Some("Running") => Condition::new("Ready").is_met_by(obj),
        _ => false,
    }
}
