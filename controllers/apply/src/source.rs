//! Definition loading
//!
//! Turns the caller's input (a YAML file, an inline YAML string, or a
//! bare kind/name reference) into the list of resource objects the
//! engine reconciles. Multi-document YAML and `kind: List` wrappers
//! are flattened, preserving order.

use crate::cli::Cli;
use crate::error::ApplyError;
use resource_model::ResourceObject;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use tracing::debug;

/// Kinds that never live in a namespace; the --namespace default must
/// not be stamped onto these.
const CLUSTER_SCOPED_KINDS: &[&str] = &[
    "APIService",
    "ClusterRole",
    "ClusterRoleBinding",
    "CustomResourceDefinition",
    "Namespace",
    "Node",
    "PersistentVolume",
    "PriorityClass",
    "StorageClass",
];

/// Loads the desired objects for this invocation.
pub fn load_definitions(cli: &Cli) -> Result<Vec<ResourceObject>, ApplyError> {
    let mut objects = if let Some(path) = &cli.src {
        debug!("loading definitions from {}", path.display());
        parse_documents(&fs::read_to_string(path)?)?
    } else if let Some(inline) = &cli.definition {
        parse_documents(inline)?
    } else if let (Some(kind), Some(name)) = (&cli.kind, &cli.name) {
        // Addressing an object without a body, e.g. deleting by name.
        vec![reference(&cli.api_version, kind, name)?]
    } else {
        return Err(ApplyError::InvalidArgs(
            "one of --src, --definition, or --kind with --name is required".to_owned(),
        ));
    };

    if let Some(namespace) = &cli.namespace {
        for obj in &mut objects {
            if obj.metadata.namespace.is_none() && !CLUSTER_SCOPED_KINDS.contains(&obj.kind.as_str())
            {
                obj.metadata.namespace = Some(namespace.clone());
            }
        }
    }
    Ok(objects)
}

/// Parses one or more YAML documents into resource objects.
pub fn parse_documents(raw: &str) -> Result<Vec<ResourceObject>, ApplyError> {
    let mut objects = Vec::new();
    for document in serde_yaml::Deserializer::from_str(raw) {
        let value = Value::deserialize(document)?;
        if value.is_null() {
            // Blank document between separators.
            continue;
        }
        collect(&mut objects, value)?;
    }
    Ok(objects)
}

fn collect(objects: &mut Vec<ResourceObject>, value: Value) -> Result<(), ApplyError> {
    let mut obj = ResourceObject::from_value(value)?;
    // v1 List (and typed *List wrappers): reconcile the items.
    if obj.kind.ends_with("List") {
        match obj.body.remove("items") {
            Some(Value::Array(items)) => {
                for item in items {
                    collect(objects, item)?;
                }
                return Ok(());
            }
            Some(other) => {
                obj.body.insert("items".to_owned(), other);
            }
            None => {}
        }
    }
    objects.push(obj);
    Ok(())
}

fn reference(api_version: &str, kind: &str, name: &str) -> Result<ResourceObject, ApplyError> {
    Ok(ResourceObject::from_value(serde_json::json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": { "name": name }
    }))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parses_multi_document_yaml_in_order() {
        let raw = "\
apiVersion: v1
kind: Namespace
metadata:
  name: testing
---
apiVersion: v1
kind: Service
metadata:
  name: web
  namespace: testing
spec:
  selector:
    app: web
";
        let objects = parse_documents(raw).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].kind, "Namespace");
        assert_eq!(objects[1].kind, "Service");
    }

    #[test]
    fn flattens_list_wrappers() {
        let raw = "\
apiVersion: v1
kind: List
items:
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: one
  - apiVersion: v1
    kind: ConfigMap
    metadata:
      name: two
";
        let objects = parse_documents(raw).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[1].name(), "two");
    }

    #[test]
    fn skips_blank_documents() {
        let raw = "---\n---\napiVersion: v1\nkind: Namespace\nmetadata:\n  name: testing\n";
        let objects = parse_documents(raw).unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn namespace_default_skips_cluster_scoped_kinds() {
        let cli = Cli::parse_from([
            "kapply",
            "--namespace",
            "testing",
            "--definition",
            "\
apiVersion: v1
kind: Namespace
metadata:
  name: testing
---
apiVersion: v1
kind: ConfigMap
metadata:
  name: cfg
",
        ]);
        let objects = load_definitions(&cli).unwrap();
        assert_eq!(objects[0].namespace(), None);
        assert_eq!(objects[1].namespace(), Some("testing"));
    }

    #[test]
    fn bare_kind_and_name_build_a_reference() {
        let cli = Cli::parse_from([
            "kapply",
            "--kind",
            "Service",
            "--name",
            "web",
            "--namespace",
            "testing",
            "--state",
            "absent",
        ]);
        let objects = load_definitions(&cli).unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(
            objects[0].object_ref().to_string(),
            "v1/Service testing/web"
        );
    }

    #[test]
    fn missing_source_is_an_argument_error() {
        let cli = Cli::parse_from(["kapply"]);
        assert!(matches!(
            load_definitions(&cli),
            Err(ApplyError::InvalidArgs(_))
        ));
    }
}
