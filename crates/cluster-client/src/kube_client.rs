//! kube-backed cluster accessor
//!
//! Uses `kube`'s dynamic API (`Api<DynamicObject>` plus an
//! [`ApiResource`] derived from the group/version/kind) so the engine
//! can reconcile arbitrary kinds, custom resources included, without
//! generated types or a discovery round-trip.

use crate::accessor_trait::{ClusterClientTrait, MergeType};
use crate::error::ClusterError;
use kube::api::{Api, ApiResource, DeleteParams, DynamicObject, Patch, PatchParams, PostParams};
use kube::core::GroupVersionKind;
use kube::Client;
use resource_model::{ObjectRef, ResourceObject};
use serde_json::Value;
use tracing::debug;

/// Cluster accessor backed by a [`kube::Client`].
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    /// Wraps an already-configured client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client from the ambient kubeconfig or in-cluster
    /// environment.
    pub async fn try_default() -> Result<Self, ClusterError> {
        let client = Client::try_default()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        Ok(Self { client })
    }

    fn api_for(&self, id: &ObjectRef) -> Api<DynamicObject> {
        let (group, version) = match id.api_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", id.api_version.as_str()),
        };
        let gvk = GroupVersionKind::gvk(group, version, &id.kind);
        // from_gvk infers the plural name; good enough for the kinds a
        // one-shot apply deals with, and avoids a discovery dependency.
        let resource = ApiResource::from_gvk(&gvk);
        match &id.namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, &resource),
            None => Api::all_with(self.client.clone(), &resource),
        }
    }
}

fn to_dynamic(obj: &ResourceObject) -> Result<DynamicObject, ClusterError> {
    Ok(serde_json::from_value(obj.to_value())?)
}

fn from_dynamic(obj: DynamicObject) -> Result<ResourceObject, ClusterError> {
    Ok(ResourceObject::from_value(serde_json::to_value(obj)?)?)
}

fn map_kube_error(err: kube::Error) -> ClusterError {
    match err {
        kube::Error::Api(resp) => match resp.code {
            404 => ClusterError::NotFound(resp.message),
            409 => ClusterError::Conflict(resp.message),
            401 | 403 => ClusterError::Forbidden(resp.message),
            code => ClusterError::Api(format!("{} (status {code})", resp.message)),
        },
        other => ClusterError::Transport(other.to_string()),
    }
}

#[async_trait::async_trait]
impl ClusterClientTrait for KubeClusterClient {
    async fn get(&self, id: &ObjectRef) -> Result<Option<ResourceObject>, ClusterError> {
        debug!("GET {}", id);
        let found = self
            .api_for(id)
            .get_opt(&id.name)
            .await
            .map_err(map_kube_error)?;
        found.map(from_dynamic).transpose()
    }

    async fn create(&self, obj: &ResourceObject) -> Result<ResourceObject, ClusterError> {
        let id = obj.object_ref();
        debug!("CREATE {}", id);
        let created = self
            .api_for(&id)
            .create(&PostParams::default(), &to_dynamic(obj)?)
            .await
            .map_err(map_kube_error)?;
        from_dynamic(created)
    }

    async fn patch(
        &self,
        id: &ObjectRef,
        patch: &Value,
        merge_type: MergeType,
    ) -> Result<ResourceObject, ClusterError> {
        debug!("PATCH {} ({})", id, merge_type);
        let params = PatchParams::default();
        let body = match merge_type {
            MergeType::StrategicMerge => Patch::Strategic(patch),
            MergeType::Merge => Patch::Merge(patch),
        };
        let patched = self
            .api_for(id)
            .patch(&id.name, &params, &body)
            .await
            .map_err(map_kube_error)?;
        from_dynamic(patched)
    }

    async fn delete(&self, id: &ObjectRef) -> Result<(), ClusterError> {
        debug!("DELETE {}", id);
        self.api_for(id)
            .delete(&id.name, &DeleteParams::default())
            .await
            .map_err(map_kube_error)?;
        Ok(())
    }
}
