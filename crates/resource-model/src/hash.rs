//! Content-hash name suffixes for immutable ConfigMaps and Secrets
//!
//! Appending a content hash to a ConfigMap or Secret name makes each
//! distinct payload a distinct object, so rollouts referencing the
//! hashed name pick up data changes. The suffix is the kubectl scheme:
//! first ten hex characters of a sha256 over the hashed payload, with
//! a substitution alphabet that avoids vowels and lookalike digits.
//!
//! Any kind other than ConfigMap or Secret is silently ignored, so the
//! option can be applied generically across mixed-kind batches.

use crate::object::ResourceObject;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Length of the appended suffix.
pub const HASH_SUFFIX_LEN: usize = 10;

/// Computes the content-hash suffix for a ConfigMap or Secret.
///
/// Returns `None` for every other kind. The hash covers kind, name, and
/// the immutable payload fields (`data`/`binaryData` for ConfigMaps,
/// `data`/`stringData`/`type` for Secrets), so byte-identical payloads
/// hash identically and any payload change produces a new suffix.
pub fn compute_hash(obj: &ResourceObject) -> Option<String> {
    let mut payload = Map::new();
    match obj.kind.as_str() {
        "ConfigMap" => {
            copy_field(obj, &mut payload, "data");
            copy_field(obj, &mut payload, "binaryData");
        }
        "Secret" => {
            copy_field(obj, &mut payload, "data");
            copy_field(obj, &mut payload, "stringData");
            copy_field(obj, &mut payload, "type");
        }
        _ => return None,
    }
    payload.insert("kind".to_owned(), Value::String(obj.kind.clone()));
    payload.insert("name".to_owned(), Value::String(obj.name().to_owned()));

    // serde_json's default map keeps keys sorted, so the serialization
    // is canonical for a given payload.
    let serialized = Value::Object(payload).to_string();
    let digest = Sha256::digest(serialized.as_bytes());
    let hex = format!("{digest:x}");
    Some(encode(&hex[..HASH_SUFFIX_LEN]))
}

/// Appends the content-hash suffix to the object's name.
///
/// Returns the suffix when one was appended, `None` for kinds the hash
/// does not apply to. Must run before any cluster lookup: identity
/// comparisons and deletion-by-name see the suffixed name.
pub fn append_hash(obj: &mut ResourceObject) -> Option<String> {
    let suffix = compute_hash(obj)?;
    let name = obj.metadata.name.take().unwrap_or_default();
    obj.metadata.name = Some(format!("{name}-{suffix}"));
    Some(suffix)
}

fn copy_field(obj: &ResourceObject, payload: &mut Map<String, Value>, field: &str) {
    if let Some(value) = obj.body.get(field) {
        payload.insert(field.to_owned(), value.clone());
    }
}

/// kubectl's suffix alphabet: confusable hex characters are remapped so
/// suffixes never spell words or resemble each other.
fn encode(hex: &str) -> String {
    hex.chars()
        .map(|c| match c {
            '0' => 'g',
            '1' => 'h',
            '3' => 'k',
            'a' => 'c',
            'e' => 'm',
            'u' => 'p',
            other => other,
        })
        .collect()
}
