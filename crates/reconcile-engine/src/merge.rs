//! Patch computation
//!
//! Pure functions that compute the patch document needed to move a
//! live object toward a desired object. Inputs are never mutated; an
//! empty patch object means there is nothing to do.
//!
//! Three flavors:
//!
//! - [`json_merge_diff`]: RFC 7386 semantics. Only fields the desired
//!   document mentions appear in the patch; explicit nulls in desired
//!   delete keys; arrays are replaced whole.
//! - [`strategic_merge_diff`]: like JSON merge, but lists of objects
//!   under fields with a known merge key are merged entry-by-entry by
//!   that key instead of being replaced positionally.
//! - [`three_way_diff`]: apply mode. Additions and changes come from
//!   desired-vs-live, removals from comparing desired against the
//!   previously applied definition, so server-managed fields are never
//!   clobbered and fields dropped from desired are actively unset.

use serde_json::{Map, Value};

/// Whether a computed patch carries no changes.
pub fn is_empty_patch(patch: &Value) -> bool {
    patch.as_object().is_some_and(Map::is_empty)
}

/// Merge key for list fields that strategic merge patches merge by key
/// rather than by position. Unknown fields fall back to whole-list
/// replacement.
fn merge_key_for(field: &str) -> Option<&'static str> {
    match field {
        "containers" | "initContainers" | "ephemeralContainers" => Some("name"),
        "env" | "volumes" | "imagePullSecrets" | "volumeClaimTemplates" => Some("name"),
        "ports" => Some("containerPort"),
        "volumeMounts" | "volumeDevices" => Some("mountPath"),
        "hostAliases" => Some("ip"),
        "tolerations" => Some("key"),
        _ => None,
    }
}

/// Computes an RFC 7386 JSON merge patch transforming `live` toward
/// `desired` for every field `desired` mentions.
pub fn json_merge_diff(live: &Value, desired: &Value) -> Value {
    diff_objects(live, desired, false)
}

/// Computes a strategic merge patch. Identical to the JSON merge diff
/// except that keyed lists are merged per entry.
pub fn strategic_merge_diff(live: &Value, desired: &Value) -> Value {
    diff_objects(live, desired, true)
}

fn diff_objects(live: &Value, desired: &Value, strategic: bool) -> Value {
    let (Some(live_map), Some(desired_map)) = (live.as_object(), desired.as_object()) else {
        // Non-object top level; nothing sensible to merge.
        return if live == desired {
            Value::Object(Map::new())
        } else {
            desired.clone()
        };
    };

    let mut patch = Map::new();
    for (key, desired_value) in desired_map {
        match live_map.get(key) {
            None => {
                if !desired_value.is_null() {
                    patch.insert(key.clone(), desired_value.clone());
                }
            }
            Some(live_value) => {
                // Explicit null in desired deletes the live key.
                if desired_value.is_null() {
                    patch.insert(key.clone(), Value::Null);
                    continue;
                }
                if live_value == desired_value {
                    continue;
                }
                let sub = diff_field(key, live_value, desired_value, strategic);
                if !is_empty_patch(&sub) {
                    patch.insert(key.clone(), sub);
                }
            }
        }
    }
    Value::Object(patch)
}

fn diff_field(field: &str, live: &Value, desired: &Value, strategic: bool) -> Value {
    if live.is_object() && desired.is_object() {
        return diff_objects(live, desired, strategic);
    }
    if strategic {
        if let (Some(live_items), Some(desired_items), Some(key)) =
            (live.as_array(), desired.as_array(), merge_key_for(field))
        {
            return keyed_list_diff(live_items, desired_items, key, field);
        }
    }
    desired.clone()
}

/// Merges a keyed list: entries matched by key contribute only their
/// changed fields (plus the key itself), unmatched desired entries are
/// included whole, and live entries desired does not mention are left
/// alone.
fn keyed_list_diff(live: &[Value], desired: &[Value], key: &str, field: &str) -> Value {
    let mut entries = Vec::new();
    for desired_item in desired {
        let Some(desired_key) = desired_item.get(key) else {
            // Entry without a merge key; strategic merge cannot address
            // it, replace the list whole.
            return Value::Array(desired.to_vec());
        };
        let matched = live.iter().find(|item| item.get(key) == Some(desired_key));
        match matched {
            None => entries.push(desired_item.clone()),
            Some(live_item) => {
                let sub = diff_objects(live_item, desired_item, true);
                if let Some(sub_map) = sub.as_object() {
                    if sub_map.is_empty() {
                        continue;
                    }
                    let mut entry = sub_map.clone();
                    entry.insert(key.to_owned(), desired_key.clone());
                    entries.push(Value::Object(entry));
                }
            }
        }
    }
    if entries.is_empty() {
        Value::Object(Map::new())
    } else {
        tracing::trace!("strategic merge of {field} produced {} entries", entries.len());
        Value::Array(entries)
    }
}

/// Computes the three-way apply patch from the previously applied
/// definition, the desired definition, and the live object.
///
/// Removal propagates: a field present in `last_applied` but omitted
/// from `desired` is unset with an explicit null, while fields the
/// apply never managed (server-populated or edited out-of-band without
/// re-adding) are left untouched.
pub fn three_way_diff(last_applied: &Value, desired: &Value, live: &Value) -> Value {
    let empty = Map::new();
    let last_map = last_applied.as_object().unwrap_or(&empty);
    let (Some(live_map), Some(desired_map)) = (live.as_object(), desired.as_object()) else {
        return json_merge_diff(live, desired);
    };

    let mut patch = Map::new();
    for (key, desired_value) in desired_map {
        match live_map.get(key) {
            None => {
                if !desired_value.is_null() {
                    patch.insert(key.clone(), desired_value.clone());
                }
            }
            Some(live_value) => {
                if live_value == desired_value {
                    continue;
                }
                if live_value.is_object() && desired_value.is_object() {
                    let last_value = last_map.get(key).cloned().unwrap_or(Value::Object(Map::new()));
                    let sub = three_way_diff(&last_value, desired_value, live_value);
                    if !is_empty_patch(&sub) {
                        patch.insert(key.clone(), sub);
                    }
                } else {
                    patch.insert(key.clone(), desired_value.clone());
                }
            }
        }
    }

    // Removals: managed by the last apply, no longer desired.
    for key in last_map.keys() {
        if !desired_map.contains_key(key) && live_map.contains_key(key) {
            patch.insert(key.clone(), Value::Null);
        }
    }
    Value::Object(patch)
}
