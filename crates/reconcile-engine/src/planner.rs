//! Merge planner
//!
//! Decides how to transform a live object into the desired object:
//! create it, patch it (trying the configured merge types in order),
//! delete it, or do nothing. Planning is pure; nothing here talks to
//! the cluster.

use crate::error::EngineError;
use crate::merge;
use crate::options::State;
use cluster_client::MergeType;
use resource_model::ResourceObject;
use serde_json::{Map, Value};
use tracing::debug;

/// Annotation tracking the previously applied definition, diffed
/// against in apply mode. Same key kubectl uses, so apply interleaves
/// with kubectl-managed objects.
pub const LAST_APPLIED_ANNOTATION: &str = "kubectl.kubernetes.io/last-applied-configuration";

/// How patches should be computed for this invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanMode {
    /// Diff desired against full live state; send with the first
    /// merge type that applies to the resource's schema category.
    Merge(Vec<MergeType>),
    /// Three-way apply against the last-applied annotation.
    Apply,
}

/// The action required to converge one object.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    /// Object is absent and should exist: create with this body.
    Create(ResourceObject),
    /// Object exists and differs: send this patch.
    Patch {
        /// The patch document.
        patch: Value,
        /// Wire format to send it with.
        merge_type: MergeType,
    },
    /// Object exists and should not.
    Delete,
    /// Nothing to do.
    Noop,
}

/// Computes the plan for one object. `live` is the cluster's current
/// state, absent when the object does not exist.
pub fn plan(
    live: Option<&ResourceObject>,
    desired: &ResourceObject,
    state: State,
    mode: &PlanMode,
) -> Result<Plan, EngineError> {
    match (state, live) {
        (State::Absent, None) => Ok(Plan::Noop),
        (State::Absent, Some(_)) => Ok(Plan::Delete),
        (State::Present, None) => {
            let mut body = desired.without_status();
            if *mode == PlanMode::Apply {
                record_last_applied(&mut body);
            }
            Ok(Plan::Create(body))
        }
        (State::Present, Some(live)) => match mode {
            PlanMode::Apply => plan_apply(live, desired),
            PlanMode::Merge(types) => plan_merge(live, desired, types),
        },
    }
}

fn plan_merge(
    live: &ResourceObject,
    desired: &ResourceObject,
    types: &[MergeType],
) -> Result<Plan, EngineError> {
    let desired_body = desired.without_status().to_value();
    let live_body = live.to_value();
    for merge_type in types {
        if !supports(*merge_type, desired) {
            debug!(
                "{} does not support {merge_type}, trying next merge type",
                desired.object_ref()
            );
            continue;
        }
        let patch = match merge_type {
            MergeType::StrategicMerge => merge::strategic_merge_diff(&live_body, &desired_body),
            MergeType::Merge => merge::json_merge_diff(&live_body, &desired_body),
        };
        if merge::is_empty_patch(&patch) {
            return Ok(Plan::Noop);
        }
        return Ok(Plan::Patch {
            patch,
            merge_type: *merge_type,
        });
    }
    Err(EngineError::Planning {
        id: desired.object_ref().to_string(),
        attempted: types
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "),
    })
}

fn plan_apply(live: &ResourceObject, desired: &ResourceObject) -> Result<Plan, EngineError> {
    let clean = desired.without_status();
    let new_last_applied = clean.to_value().to_string();

    let last_applied = live
        .annotation(LAST_APPLIED_ANNOTATION)
        .and_then(|raw| serde_json::from_str::<Value>(raw).ok())
        .unwrap_or(Value::Object(Map::new()));

    let mut patch = merge::three_way_diff(&last_applied, &clean.to_value(), &live.to_value());
    if merge::is_empty_patch(&patch)
        && live.annotation(LAST_APPLIED_ANNOTATION) == Some(new_last_applied.as_str())
    {
        return Ok(Plan::Noop);
    }

    // Record this apply so the next one can compute removals.
    if let Some(map) = patch.as_object_mut() {
        let annotations = map
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()))
            .as_object_mut()
            .map(|meta| {
                meta.entry("annotations")
                    .or_insert_with(|| Value::Object(Map::new()))
            });
        if let Some(Value::Object(annotations)) = annotations {
            annotations.insert(
                LAST_APPLIED_ANNOTATION.to_owned(),
                Value::String(new_last_applied),
            );
        }
    }
    // Three-way patches go over the wire as JSON merge: nulls delete.
    Ok(Plan::Patch {
        patch,
        merge_type: MergeType::Merge,
    })
}

fn record_last_applied(body: &mut ResourceObject) {
    let serialized = body.to_value().to_string();
    body.set_annotation(LAST_APPLIED_ANNOTATION, &serialized);
}

/// Whether a merge type applies to the resource's schema category.
/// Strategic merge needs per-field patch metadata, which only built-in
/// API groups carry; custom resources reject it.
fn supports(merge_type: MergeType, obj: &ResourceObject) -> bool {
    match merge_type {
        MergeType::Merge => true,
        MergeType::StrategicMerge => is_builtin_group(obj.group()),
    }
}

fn is_builtin_group(group: &str) -> bool {
    matches!(group, "" | "apps" | "batch" | "autoscaling" | "policy")
        || group.ends_with(".k8s.io")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn service(cluster_ip: Option<&str>) -> ResourceObject {
        let mut spec = json!({ "selector": { "app": "web" }, "ports": [{ "port": 80 }] });
        if let Some(ip) = cluster_ip {
            spec["clusterIP"] = json!(ip);
        }
        ResourceObject::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "web", "namespace": "testing" },
            "spec": spec
        }))
        .unwrap()
    }

    fn default_mode() -> PlanMode {
        PlanMode::Merge(vec![MergeType::StrategicMerge, MergeType::Merge])
    }

    #[test]
    fn absent_live_and_present_state_creates() {
        let desired = service(None);
        let plan = plan(None, &desired, State::Present, &default_mode()).unwrap();
        assert!(matches!(plan, Plan::Create(body) if body.name() == "web"));
    }

    #[test]
    fn live_and_absent_state_deletes() {
        let desired = service(None);
        let live = service(Some("10.0.0.1"));
        let plan = plan(Some(&live), &desired, State::Absent, &default_mode()).unwrap();
        assert_eq!(plan, Plan::Delete);
    }

    #[test]
    fn deleting_an_absent_object_is_a_noop() {
        let desired = service(None);
        let plan = plan(None, &desired, State::Absent, &default_mode()).unwrap();
        assert_eq!(plan, Plan::Noop);
    }

    #[test]
    fn no_effective_difference_is_a_noop() {
        let desired = service(None);
        // Live has everything desired has, plus server-assigned fields.
        let live = service(Some("10.0.0.1"));
        let plan = plan(Some(&live), &desired, State::Present, &default_mode()).unwrap();
        assert_eq!(plan, Plan::Noop);
    }

    #[test]
    fn create_strips_status() {
        let desired = ResourceObject::from_value(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "web" },
            "spec": {},
            "status": { "loadBalancer": {} }
        }))
        .unwrap();
        let plan = plan(None, &desired, State::Present, &default_mode()).unwrap();
        let Plan::Create(body) = plan else {
            panic!("expected create");
        };
        assert!(body.body.get("status").is_none());
    }

    #[test]
    fn builtin_kind_uses_strategic_merge_first() {
        let desired = service(None);
        let mut live = service(Some("10.0.0.1"));
        live.body["spec"]["ports"] = json!([{ "port": 8080 }]);
        let plan = plan(Some(&live), &desired, State::Present, &default_mode()).unwrap();
        let Plan::Patch { merge_type, .. } = plan else {
            panic!("expected patch");
        };
        assert_eq!(merge_type, MergeType::StrategicMerge);
    }

    #[test]
    fn custom_resource_falls_back_to_json_merge() {
        let desired = ResourceObject::from_value(json!({
            "apiVersion": "stable.example.com/v1",
            "kind": "CronTab",
            "metadata": { "name": "my-tab" },
            "spec": { "cronSpec": "*/5 * * * *" }
        }))
        .unwrap();
        let mut live = desired.clone();
        live.body["spec"]["cronSpec"] = json!("*/10 * * * *");
        let plan = plan(Some(&live), &desired, State::Present, &default_mode()).unwrap();
        let Plan::Patch { merge_type, .. } = plan else {
            panic!("expected patch");
        };
        assert_eq!(merge_type, MergeType::Merge);
    }

    #[test]
    fn custom_resource_with_only_strategic_merge_fails_planning() {
        let desired = ResourceObject::from_value(json!({
            "apiVersion": "stable.example.com/v1",
            "kind": "CronTab",
            "metadata": { "name": "my-tab" },
            "spec": { "cronSpec": "*/5 * * * *" }
        }))
        .unwrap();
        let live = desired.clone();
        let err = plan(
            Some(&live),
            &desired,
            State::Present,
            &PlanMode::Merge(vec![MergeType::StrategicMerge]),
        )
        .unwrap_err();
        match err {
            EngineError::Planning { attempted, .. } => {
                assert!(attempted.contains("strategic-merge"));
            }
            other => panic!("expected planning error, got {other}"),
        }
    }

    #[test]
    fn apply_records_last_applied_on_create() {
        let desired = service(None);
        let plan = plan(None, &desired, State::Present, &PlanMode::Apply).unwrap();
        let Plan::Create(body) = plan else {
            panic!("expected create");
        };
        assert!(body.annotation(LAST_APPLIED_ANNOTATION).is_some());
    }

    #[test]
    fn apply_unsets_fields_removed_since_the_last_apply() {
        let mut first = service(None);
        first.body["spec"]["externalName"] = json!("legacy.example.com");
        let last_applied = first.without_status().to_value().to_string();

        let mut live = service(Some("10.0.0.1"));
        live.body["spec"]["externalName"] = json!("legacy.example.com");
        live.set_annotation(LAST_APPLIED_ANNOTATION, &last_applied);

        // Second apply: externalName dropped from desired.
        let desired = service(None);
        let plan = plan(Some(&live), &desired, State::Present, &PlanMode::Apply).unwrap();
        let Plan::Patch { patch, merge_type } = plan else {
            panic!("expected patch");
        };
        assert_eq!(merge_type, MergeType::Merge);
        assert_eq!(patch["spec"]["externalName"], Value::Null);
        // clusterIP was never applied; it must not appear in the patch.
        assert!(patch["spec"].get("clusterIP").is_none());
    }

    #[test]
    fn apply_is_idempotent_once_live_matches() {
        let desired = service(None);
        let last_applied = desired.without_status().to_value().to_string();
        let mut live = service(Some("10.0.0.1"));
        live.set_annotation(LAST_APPLIED_ANNOTATION, &last_applied);

        let plan = plan(Some(&live), &desired, State::Present, &PlanMode::Apply).unwrap();
        assert_eq!(plan, Plan::Noop);
    }

    #[test]
    fn plan_does_not_mutate_its_inputs() {
        let desired = service(None);
        let live = service(Some("10.0.0.1"));
        let desired_before = desired.clone();
        let live_before = live.clone();
        let _ = plan(Some(&live), &desired, State::Present, &default_mode()).unwrap();
        assert_eq!(desired, desired_before);
        assert_eq!(live, live_before);
    }
}
