//! Per-object outcomes and the aggregated summary
//!
//! Each reconciled object produces one [`ReconcileResult`], recorded in
//! input order and never mutated afterwards. The [`Summary`] flattens
//! to the single result's shape when exactly one object was processed;
//! multi-document input is exposed as an ordered `items` list.

use resource_model::ResourceObject;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Instant;

/// What happened to one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconcileAction {
    /// The object did not exist and was created.
    Created,
    /// The object existed and was patched.
    Patched,
    /// The object existed and was deleted.
    Deleted,
    /// The live state already matched (or the object was already
    /// absent on delete).
    Unchanged,
}

/// Outcome of reconciling one object. Rendered for callers through
/// [`Summary::to_json`].
#[derive(Debug, Clone)]
pub struct ReconcileResult {
    /// Final state of the object; `None` after a deletion.
    pub object: Option<ResourceObject>,
    /// Whether anything was (or, in check mode, would be) written.
    pub changed: bool,
    /// The action that was taken.
    pub action: ReconcileAction,
    /// Seconds spent waiting, when a wait ran.
    pub duration_seconds: Option<u64>,
    /// Error message when this object failed.
    pub error: Option<String>,
    /// Non-fatal notices (validation issues under a warn policy, wait
    /// diagnostics).
    pub warnings: Vec<String>,
}

impl ReconcileResult {
    /// Successful result for an action.
    pub fn new(action: ReconcileAction, object: Option<ResourceObject>) -> Self {
        Self {
            object,
            changed: action != ReconcileAction::Unchanged,
            action,
            duration_seconds: None,
            error: None,
            warnings: Vec::new(),
        }
    }

    /// Failed result carrying the error message.
    pub fn failure(object: Option<ResourceObject>, error: impl Into<String>) -> Self {
        Self {
            object,
            changed: false,
            action: ReconcileAction::Unchanged,
            duration_seconds: None,
            error: Some(error.into()),
            warnings: Vec::new(),
        }
    }

    /// Whether this object failed.
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }

    fn to_json(&self) -> Value {
        let mut out = json!({
            "changed": self.changed,
            "action": self.action,
            "result": self.object.as_ref().map_or_else(|| json!({}), ResourceObject::to_value),
        });
        if let Some(duration) = self.duration_seconds {
            out["duration"] = json!(duration);
        }
        if let Some(error) = &self.error {
            out["error"] = json!(error);
        }
        if !self.warnings.is_empty() {
            out["warnings"] = json!(self.warnings);
        }
        out
    }
}

/// Aggregated outcome of a whole invocation.
#[derive(Debug, Clone)]
pub struct Summary {
    /// OR over all per-object `changed` flags.
    pub changed: bool,
    /// Whether any object failed.
    pub failed: bool,
    /// Wall-clock seconds for the whole batch.
    pub duration_seconds: u64,
    /// Per-object results, in input order.
    pub results: Vec<ReconcileResult>,
}

impl Summary {
    /// Renders the summary for callers. One object flattens to that
    /// result's shape; several are listed under `items`.
    pub fn to_json(&self) -> Value {
        match self.results.as_slice() {
            [single] => single.to_json(),
            results => json!({
                "changed": self.changed,
                "failed": self.failed,
                "duration": self.duration_seconds,
                "items": results.iter().map(ReconcileResult::to_json).collect::<Vec<_>>(),
            }),
        }
    }
}

/// Collects per-object results across a batch.
#[derive(Debug)]
pub struct ResultAggregator {
    results: Vec<ReconcileResult>,
    started: Instant,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultAggregator {
    /// Empty aggregator; starts the batch clock.
    pub fn new() -> Self {
        Self {
            results: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Records one result. Results are kept in recording order.
    pub fn record(&mut self, result: ReconcileResult) {
        self.results.push(result);
    }

    /// Whether any recorded object failed.
    pub fn any_failed(&self) -> bool {
        self.results.iter().any(ReconcileResult::failed)
    }

    /// Finalizes the batch into a summary.
    pub fn into_summary(self) -> Summary {
        Summary {
            changed: self.results.iter().any(|r| r.changed),
            failed: self.results.iter().any(ReconcileResult::failed),
            duration_seconds: self.started.elapsed().as_secs(),
            results: self.results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn namespace(name: &str) -> ResourceObject {
        ResourceObject::from_value(json!({
            "apiVersion": "v1",
            "kind": "Namespace",
            "metadata": { "name": name }
        }))
        .unwrap()
    }

    #[test]
    fn single_result_flattens() {
        let mut agg = ResultAggregator::new();
        agg.record(ReconcileResult::new(
            ReconcileAction::Created,
            Some(namespace("testing")),
        ));
        let out = agg.into_summary().to_json();
        assert_eq!(out["changed"], json!(true));
        assert_eq!(out["action"], json!("created"));
        assert_eq!(out["result"]["kind"], json!("Namespace"));
        assert!(out.get("items").is_none());
    }

    #[test]
    fn multiple_results_keep_order_under_items() {
        let mut agg = ResultAggregator::new();
        agg.record(ReconcileResult::new(
            ReconcileAction::Created,
            Some(namespace("first")),
        ));
        agg.record(ReconcileResult::new(ReconcileAction::Unchanged, Some(namespace("second"))));
        let summary = agg.into_summary();
        assert!(summary.changed);
        assert!(!summary.failed);

        let out = summary.to_json();
        let items = out["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["result"]["metadata"]["name"], json!("first"));
        assert_eq!(items[1]["result"]["metadata"]["name"], json!("second"));
        assert_eq!(items[1]["changed"], json!(false));
    }

    #[test]
    fn failures_surface_in_the_summary() {
        let mut agg = ResultAggregator::new();
        agg.record(ReconcileResult::failure(None, "forbidden: denied"));
        assert!(agg.any_failed());
        let summary = agg.into_summary();
        assert!(summary.failed);
        assert!(!summary.changed);
    }
}
