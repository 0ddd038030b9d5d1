//! Mock cluster client for unit testing
//!
//! This module provides an in-memory implementation of
//! [`ClusterClientTrait`] that can be used in unit tests without a
//! running cluster. It records every operation in order (for asserting
//! call sequences and poll counts) and can be scripted to fail.

use crate::accessor_trait::{ClusterClientTrait, MergeType};
use crate::error::ClusterError;
use resource_model::{ObjectRef, ResourceObject};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// In-memory cluster client for testing.
///
/// Objects are stored by identity. Patches are applied with JSON-merge
/// semantics regardless of the requested merge type, which is adequate
/// for exercising the reconciler; merge-type-specific behavior is
/// covered by the planner's own tests.
#[derive(Clone, Default)]
pub struct MockClusterClient {
    objects: Arc<Mutex<HashMap<ObjectRef, ResourceObject>>>,
    operations: Arc<Mutex<Vec<String>>>,
    scripted_errors: Arc<Mutex<VecDeque<ClusterError>>>,
}

impl std::fmt::Debug for MockClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockClusterClient").finish_non_exhaustive()
    }
}

impl MockClusterClient {
    /// Creates an empty mock cluster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an object into the store (for test setup).
    pub fn add_object(&self, obj: ResourceObject) {
        self.objects.lock().unwrap().insert(obj.object_ref(), obj);
    }

    /// Current stored state of an object, if any.
    pub fn stored(&self, id: &ObjectRef) -> Option<ResourceObject> {
        self.objects.lock().unwrap().get(id).cloned()
    }

    /// Queues an error to be returned by the next operation of any
    /// kind. Queued errors are consumed in order, one per call.
    pub fn queue_error(&self, err: ClusterError) {
        self.scripted_errors.lock().unwrap().push_back(err);
    }

    /// Every operation performed so far, in order, as
    /// `"<op> <identity>"` strings.
    pub fn operations(&self) -> Vec<String> {
        self.operations.lock().unwrap().clone()
    }

    /// Number of operations of the given verb (`get`, `create`,
    /// `patch`, `delete`).
    pub fn count_of(&self, verb: &str) -> usize {
        let prefix = format!("{verb} ");
        self.operations
            .lock()
            .unwrap()
            .iter()
            .filter(|op| op.starts_with(&prefix))
            .count()
    }

    fn record(&self, verb: &str, id: &ObjectRef) -> Result<(), ClusterError> {
        self.operations.lock().unwrap().push(format!("{verb} {id}"));
        match self.scripted_errors.lock().unwrap().pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// RFC 7386 merge: objects merge recursively, null deletes, everything
/// else replaces.
fn merge_into(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, patch_value) in patch_map {
                if patch_value.is_null() {
                    target_map.remove(key);
                } else {
                    merge_into(
                        target_map.entry(key.clone()).or_insert(Value::Null),
                        patch_value,
                    );
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for MockClusterClient {
    async fn get(&self, id: &ObjectRef) -> Result<Option<ResourceObject>, ClusterError> {
        self.record("get", id)?;
        Ok(self.objects.lock().unwrap().get(id).cloned())
    }

    async fn create(&self, obj: &ResourceObject) -> Result<ResourceObject, ClusterError> {
        let id = obj.object_ref();
        self.record("create", &id)?;
        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(&id) {
            return Err(ClusterError::Conflict(format!("{id} already exists")));
        }
        objects.insert(id, obj.clone());
        Ok(obj.clone())
    }

    async fn patch(
        &self,
        id: &ObjectRef,
        patch: &Value,
        _merge_type: MergeType,
    ) -> Result<ResourceObject, ClusterError> {
        self.record("patch", id)?;
        let mut objects = self.objects.lock().unwrap();
        let Some(existing) = objects.get(id) else {
            return Err(ClusterError::NotFound(id.to_string()));
        };
        let mut value = existing.to_value();
        merge_into(&mut value, patch);
        let patched = ResourceObject::from_value(value)?;
        objects.insert(id.clone(), patched.clone());
        Ok(patched)
    }

    async fn delete(&self, id: &ObjectRef) -> Result<(), ClusterError> {
        self.record("delete", id)?;
        match self.objects.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(ClusterError::NotFound(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config_map() -> ResourceObject {
        ResourceObject::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": "cfg", "namespace": "default" },
            "data": { "a": "1", "b": "2" }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn patch_merges_and_deletes_keys() {
        let mock = MockClusterClient::new();
        mock.add_object(config_map());
        let id = config_map().object_ref();

        let patched = mock
            .patch(&id, &json!({ "data": { "a": "9", "b": null } }), MergeType::Merge)
            .await
            .unwrap();
        assert_eq!(patched.path("data.a"), Some(&json!("9")));
        assert_eq!(patched.path("data.b"), None);
    }

    #[tokio::test]
    async fn scripted_errors_are_consumed_in_order() {
        let mock = MockClusterClient::new();
        mock.add_object(config_map());
        let id = config_map().object_ref();

        mock.queue_error(ClusterError::Transport("connection refused".into()));
        assert!(mock.get(&id).await.is_err());
        assert!(mock.get(&id).await.unwrap().is_some());
        assert_eq!(mock.count_of("get"), 2);
    }
}
