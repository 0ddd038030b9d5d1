//! Dynamic resource object representation
//!
//! A [`ResourceObject`] keeps the corners every Kubernetes object shares
//! (`apiVersion`, `kind`, `metadata`) as typed fields and everything else
//! (`spec`, `status`, `data`, ...) as an untyped JSON document, so the
//! same type carries Deployments, ConfigMaps, and arbitrary custom
//! resources.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Standard object metadata.
///
/// Only the fields the engine reads get typed accessors; anything else
/// the API server returns (uid, resourceVersion, generation, ...) is
/// preserved in `extra` and round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name within its namespace.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace, absent for cluster-scoped kinds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Object labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Object annotations.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,

    /// Any other metadata fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ObjectMeta {
    /// Renders the metadata as a JSON object.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if let Some(name) = &self.name {
            map.insert("name".to_owned(), Value::String(name.clone()));
        }
        if let Some(namespace) = &self.namespace {
            map.insert("namespace".to_owned(), Value::String(namespace.clone()));
        }
        if !self.labels.is_empty() {
            let labels = self
                .labels
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert("labels".to_owned(), Value::Object(labels));
        }
        if !self.annotations.is_empty() {
            let annotations = self
                .annotations
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            map.insert("annotations".to_owned(), Value::Object(annotations));
        }
        for (k, v) in &self.extra {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }
}

/// A Kubernetes-style resource object of arbitrary kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceObject {
    /// Versioned schema of the object, e.g. `v1` or `apps/v1`.
    #[serde(rename = "apiVersion", default)]
    pub api_version: String,

    /// REST resource kind, e.g. `Deployment`.
    #[serde(default)]
    pub kind: String,

    /// Standard object metadata.
    #[serde(default)]
    pub metadata: ObjectMeta,

    /// Everything outside the typed corners: `spec`, `status`, `data`,
    /// and whatever else the kind defines.
    #[serde(flatten)]
    pub body: Map<String, Value>,
}

impl ResourceObject {
    /// Deserializes an object from a JSON document.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Renders the full object as a JSON document.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        if !self.api_version.is_empty() {
            map.insert(
                "apiVersion".to_owned(),
                Value::String(self.api_version.clone()),
            );
        }
        if !self.kind.is_empty() {
            map.insert("kind".to_owned(), Value::String(self.kind.clone()));
        }
        map.insert("metadata".to_owned(), self.metadata.to_value());
        for (k, v) in &self.body {
            map.insert(k.clone(), v.clone());
        }
        Value::Object(map)
    }

    /// Object name, empty string when unset.
    pub fn name(&self) -> &str {
        self.metadata.name.as_deref().unwrap_or("")
    }

    /// Object namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.namespace.as_deref()
    }

    /// API group portion of `apiVersion` (empty for the core group).
    pub fn group(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }

    /// Identity of this object on the cluster.
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            api_version: self.api_version.clone(),
            kind: self.kind.clone(),
            namespace: self.metadata.namespace.clone(),
            name: self.name().to_owned(),
        }
    }

    /// Looks up a dotted path in the untyped body, e.g. `status.readyReplicas`.
    pub fn path(&self, dotted: &str) -> Option<&Value> {
        let mut parts = dotted.split('.');
        let mut current = self.body.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Integer at a dotted path, if present.
    pub fn path_i64(&self, dotted: &str) -> Option<i64> {
        self.path(dotted).and_then(Value::as_i64)
    }

    /// `metadata.generation`, if the API server has set one.
    pub fn generation(&self) -> Option<i64> {
        self.metadata.extra.get("generation").and_then(Value::as_i64)
    }

    /// Entries of `status.conditions`, empty for objects without any.
    pub fn status_conditions(&self) -> &[Value] {
        self.path("status.conditions")
            .and_then(Value::as_array)
            .map_or(&[], Vec::as_slice)
    }

    /// Annotation value by key.
    pub fn annotation(&self, key: &str) -> Option<&str> {
        self.metadata.annotations.get(key).map(String::as_str)
    }

    /// Sets (or replaces) an annotation.
    pub fn set_annotation(&mut self, key: &str, value: &str) {
        self.metadata
            .annotations
            .insert(key.to_owned(), value.to_owned());
    }

    /// Copy of this object with `status` removed. Desired definitions
    /// may carry a status block; it is never part of what gets applied.
    pub fn without_status(&self) -> ResourceObject {
        let mut copy = self.clone();
        copy.body.remove("status");
        copy
    }
}

/// Identity of a resource object: `(apiVersion, kind, namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Versioned schema, e.g. `apps/v1`.
    pub api_version: String,
    /// Resource kind.
    pub kind: String,
    /// Namespace, absent for cluster-scoped kinds.
    pub namespace: Option<String>,
    /// Object name.
    pub name: String,
}

impl ObjectRef {
    /// API group portion of `apiVersion` (empty for the core group).
    pub fn group(&self) -> &str {
        match self.api_version.split_once('/') {
            Some((group, _)) => group,
            None => "",
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{} {}/{}", self.api_version, self.kind, ns, self.name),
            None => write!(f, "{}/{} {}", self.api_version, self.kind, self.name),
        }
    }
}
