//! Unit tests for the reconciler, driven through the in-memory mock
//! cluster client.

use crate::options::{ReconcileOptions, State, ValidationPolicy, WaitSpec};
use crate::reconciler::Reconciler;
use crate::result::ReconcileAction;
use crate::validate::{SchemaValidator, ValidationIssue};
use crate::EngineError;
use cluster_client::{ClusterClientTrait, ClusterError, MergeType, MockClusterClient};
use resource_model::{Condition, ObjectRef, ResourceObject};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};

fn namespace(name: &str) -> ResourceObject {
    ResourceObject::from_value(json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": { "name": name }
    }))
    .unwrap()
}

fn config_map(name: &str, value: &str) -> ResourceObject {
    ResourceObject::from_value(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": name, "namespace": "testing" },
        "data": { "key": value }
    }))
    .unwrap()
}

fn service(name: &str) -> ResourceObject {
    ResourceObject::from_value(json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": { "name": name, "namespace": "testing" },
        "spec": { "selector": { "app": name } }
    }))
    .unwrap()
}

fn reconciler(mock: &MockClusterClient) -> Reconciler {
    Reconciler::new(Box::new(mock.clone()))
}

#[tokio::test]
async fn creates_absent_objects() {
    let mock = MockClusterClient::new();
    let result = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &ReconcileOptions::default())
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.action, ReconcileAction::Created);
    assert!(mock.stored(&config_map("cfg", "v1").object_ref()).is_some());
}

#[tokio::test]
async fn second_run_is_unchanged() {
    let mock = MockClusterClient::new();
    let engine = reconciler(&mock);
    let opts = ReconcileOptions::default();

    engine.reconcile(config_map("cfg", "v1"), &opts).await.unwrap();
    let second = engine.reconcile(config_map("cfg", "v1"), &opts).await.unwrap();

    assert!(!second.changed);
    assert_eq!(second.action, ReconcileAction::Unchanged);
    // get + create, then a get with nothing to write.
    assert_eq!(mock.count_of("create"), 1);
    assert_eq!(mock.count_of("patch"), 0);
}

#[tokio::test]
async fn patches_when_live_differs() {
    let mock = MockClusterClient::new();
    mock.add_object(config_map("cfg", "v1"));

    let result = reconciler(&mock)
        .reconcile(config_map("cfg", "v2"), &ReconcileOptions::default())
        .await
        .unwrap();

    assert_eq!(result.action, ReconcileAction::Patched);
    let stored = mock.stored(&config_map("cfg", "v2").object_ref()).unwrap();
    assert_eq!(stored.path("data.key"), Some(&json!("v2")));
}

#[tokio::test]
async fn delete_of_absent_object_is_unchanged_not_an_error() {
    let mock = MockClusterClient::new();
    let opts = ReconcileOptions {
        state: State::Absent,
        ..Default::default()
    };
    let result = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &opts)
        .await
        .unwrap();

    assert!(!result.changed);
    assert_eq!(result.action, ReconcileAction::Unchanged);
    assert!(result.error.is_none());
    assert_eq!(mock.count_of("delete"), 0);
}

#[tokio::test]
async fn deletes_existing_objects() {
    let mock = MockClusterClient::new();
    mock.add_object(config_map("cfg", "v1"));
    let opts = ReconcileOptions {
        state: State::Absent,
        ..Default::default()
    };
    let result = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &opts)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.action, ReconcileAction::Deleted);
    assert!(result.object.is_none());
    assert!(mock.stored(&config_map("cfg", "v1").object_ref()).is_none());
}

#[tokio::test]
async fn check_mode_reports_without_writing() {
    let mock = MockClusterClient::new();
    let opts = ReconcileOptions {
        check_mode: true,
        ..Default::default()
    };
    let result = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &opts)
        .await
        .unwrap();

    assert!(result.changed);
    assert_eq!(result.action, ReconcileAction::Created);
    // Read-only: the plan was computed but nothing was written.
    assert_eq!(mock.count_of("get"), 1);
    assert_eq!(mock.count_of("create"), 0);
    assert!(mock.stored(&config_map("cfg", "v1").object_ref()).is_none());
}

#[tokio::test]
async fn conflicting_options_are_rejected_before_any_cluster_call() {
    let mock = MockClusterClient::new();
    let opts = ReconcileOptions {
        apply: true,
        merge_types: Some(vec![MergeType::Merge]),
        ..Default::default()
    };
    let err = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &opts)
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Config(_)));
    assert!(mock.operations().is_empty());
}

#[tokio::test]
async fn batch_preserves_input_order() {
    let mock = MockClusterClient::new();
    let summary = reconciler(&mock)
        .reconcile_all(
            vec![namespace("testing"), service("web")],
            &ReconcileOptions::default(),
        )
        .await
        .unwrap();

    assert!(summary.changed);
    let ops = mock.operations();
    let ns_create = ops.iter().position(|op| op == "create v1/Namespace testing");
    let svc_create = ops
        .iter()
        .position(|op| op == "create v1/Service testing/web");
    assert!(ns_create.unwrap() < svc_create.unwrap());
}

#[tokio::test]
async fn one_failure_does_not_abort_the_batch() {
    let mock = MockClusterClient::new();
    mock.queue_error(ClusterError::Forbidden("rbac denied".into()));

    let summary = reconciler(&mock)
        .reconcile_all(
            vec![namespace("testing"), service("web")],
            &ReconcileOptions::default(),
        )
        .await
        .unwrap();

    assert!(summary.failed);
    assert_eq!(summary.results.len(), 2);
    assert!(summary.results[0].failed());
    assert_eq!(summary.results[1].action, ReconcileAction::Created);
}

#[tokio::test]
async fn fail_fast_stops_after_the_first_failure() {
    let mock = MockClusterClient::new();
    mock.queue_error(ClusterError::Forbidden("rbac denied".into()));
    let opts = ReconcileOptions {
        fail_fast: true,
        ..Default::default()
    };

    let summary = reconciler(&mock)
        .reconcile_all(vec![namespace("testing"), service("web")], &opts)
        .await
        .unwrap();

    assert!(summary.failed);
    assert_eq!(summary.results.len(), 1);
    assert!(mock.stored(&service("web").object_ref()).is_none());
}

#[tokio::test]
async fn append_hash_suffixes_config_map_names() {
    let mock = MockClusterClient::new();
    let opts = ReconcileOptions {
        append_hash: true,
        ..Default::default()
    };
    let result = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &opts)
        .await
        .unwrap();

    let name = result.object.unwrap().name().to_owned();
    assert!(name.starts_with("cfg-"));
    assert_ne!(name, "cfg");
    // Same content, same suffix: the second run finds the object.
    let second = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &opts)
        .await
        .unwrap();
    assert_eq!(second.action, ReconcileAction::Unchanged);
}

struct RejectEverything;

impl SchemaValidator for RejectEverything {
    fn validate(
        &self,
        obj: &ResourceObject,
        _version: Option<&str>,
        _strict: bool,
    ) -> Vec<ValidationIssue> {
        vec![ValidationIssue::new(format!(
            "{} failed schema validation",
            obj.kind
        ))]
    }
}

#[tokio::test]
async fn validation_issues_fail_the_object_under_fail_on_error() {
    let mock = MockClusterClient::new();
    let engine = reconciler(&mock).with_validator(Box::new(RejectEverything));
    let opts = ReconcileOptions {
        validation: Some(ValidationPolicy {
            fail_on_error: true,
            ..Default::default()
        }),
        ..Default::default()
    };

    let result = engine.reconcile(config_map("cfg", "v1"), &opts).await.unwrap();
    assert!(result.failed());
    // Validation runs before any cluster access for the object.
    assert!(mock.operations().is_empty());
}

#[tokio::test]
async fn validation_issues_become_warnings_without_fail_on_error() {
    let mock = MockClusterClient::new();
    let engine = reconciler(&mock).with_validator(Box::new(RejectEverything));
    let opts = ReconcileOptions {
        validation: Some(ValidationPolicy::default()),
        ..Default::default()
    };

    let result = engine.reconcile(config_map("cfg", "v1"), &opts).await.unwrap();
    assert!(!result.failed());
    assert_eq!(result.action, ReconcileAction::Created);
    assert_eq!(result.warnings.len(), 1);
}

#[tokio::test]
async fn wait_on_a_met_condition_completes_immediately() {
    let mock = MockClusterClient::new();
    let deployment = ResourceObject::from_value(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": "web", "namespace": "testing" },
        "spec": { "replicas": 1 },
        "status": { "conditions": [{ "type": "Available", "status": "True" }] }
    }))
    .unwrap();
    mock.add_object(deployment.clone());

    let opts = ReconcileOptions {
        wait: WaitSpec {
            enabled: true,
            condition: Some(Condition::new("Available")),
            timeout_seconds: 5,
            sleep_seconds: 1,
        },
        ..Default::default()
    };
    let result = reconciler(&mock)
        .reconcile(deployment.without_status(), &opts)
        .await
        .unwrap();

    assert!(result.error.is_none());
    assert_eq!(result.duration_seconds, Some(0));
    // The waited-on object is re-read into the result.
    assert!(!result.object.unwrap().status_conditions().is_empty());
}

/// Delegates to the in-memory mock but hard-fails the nth `get`, as
/// when credentials are revoked while a wait is polling.
struct RevokedMidWait {
    inner: MockClusterClient,
    gets: AtomicUsize,
    fail_on_get: usize,
}

#[async_trait::async_trait]
impl ClusterClientTrait for RevokedMidWait {
    async fn get(&self, id: &ObjectRef) -> Result<Option<ResourceObject>, ClusterError> {
        if self.gets.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_on_get {
            return Err(ClusterError::Forbidden("rbac revoked".into()));
        }
        self.inner.get(id).await
    }

    async fn create(&self, obj: &ResourceObject) -> Result<ResourceObject, ClusterError> {
        self.inner.create(obj).await
    }

    async fn patch(
        &self,
        id: &ObjectRef,
        patch: &Value,
        merge_type: MergeType,
    ) -> Result<ResourceObject, ClusterError> {
        self.inner.patch(id, patch, merge_type).await
    }

    async fn delete(&self, id: &ObjectRef) -> Result<(), ClusterError> {
        self.inner.delete(id).await
    }
}

#[tokio::test]
async fn wait_aborted_by_a_hard_error_keeps_the_applied_action() {
    let mock = MockClusterClient::new();
    // Live check succeeds, create succeeds, first wait poll is denied.
    let client = RevokedMidWait {
        inner: mock.clone(),
        gets: AtomicUsize::new(0),
        fail_on_get: 2,
    };
    let engine = Reconciler::new(Box::new(client));
    let deployment = ResourceObject::from_value(json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": { "name": "web", "namespace": "testing" },
        "spec": { "replicas": 1 }
    }))
    .unwrap();
    let opts = ReconcileOptions {
        wait: WaitSpec {
            enabled: true,
            timeout_seconds: 5,
            sleep_seconds: 1,
            ..Default::default()
        },
        ..Default::default()
    };

    let result = engine.reconcile(deployment.clone(), &opts).await.unwrap();

    // The write landed; the failed wait must not erase it from the
    // report.
    assert!(mock.stored(&deployment.object_ref()).is_some());
    assert!(result.changed);
    assert_eq!(result.action, ReconcileAction::Created);
    assert!(result.object.is_some());
    let error = result.error.unwrap();
    assert!(error.contains("rbac revoked"), "{error}");
}

#[tokio::test]
async fn wait_for_absent_state_completes_once_the_object_is_gone() {
    let mock = MockClusterClient::new();
    mock.add_object(config_map("cfg", "v1"));
    let opts = ReconcileOptions {
        state: State::Absent,
        wait: WaitSpec {
            enabled: true,
            timeout_seconds: 5,
            sleep_seconds: 1,
            ..Default::default()
        },
        ..Default::default()
    };

    let result = reconciler(&mock)
        .reconcile(config_map("cfg", "v1"), &opts)
        .await
        .unwrap();
    assert_eq!(result.action, ReconcileAction::Deleted);
    assert!(result.error.is_none());
}
