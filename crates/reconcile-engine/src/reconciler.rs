//! Reconciliation orchestration
//!
//! Fetch live state, plan, apply, wait, report. One object at a time,
//! in input order: later objects may depend on earlier ones (a Service
//! referencing a Namespace created in the same batch), so there is no
//! parallelism here by design.

use crate::error::EngineError;
use crate::options::{ReconcileOptions, State};
use crate::planner::{self, Plan, PlanMode};
use crate::result::{ReconcileAction, ReconcileResult, ResultAggregator, Summary};
use crate::validate::SchemaValidator;
use crate::waiter::{WaitFor, Waiter};
use cluster_client::ClusterClientTrait;
use resource_model::{append_hash, ResourceObject};
use tracing::{info, warn};

/// Reconciles desired resource definitions against the cluster.
///
/// Collaborators are passed in at construction: a cluster accessor and
/// an optional schema validator. The reconciler owns no transport or
/// schema knowledge of its own.
pub struct Reconciler {
    client: Box<dyn ClusterClientTrait>,
    validator: Option<Box<dyn SchemaValidator>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("validator", &self.validator.is_some())
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Reconciler over the given cluster accessor.
    pub fn new(client: Box<dyn ClusterClientTrait>) -> Self {
        Self {
            client,
            validator: None,
        }
    }

    /// Attaches a schema validator collaborator.
    #[must_use]
    pub fn with_validator(mut self, validator: Box<dyn SchemaValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Reconciles a batch of definitions sequentially, in input order.
    ///
    /// Per-object failures are recorded in the summary; the batch keeps
    /// going unless `fail_fast` is set. Conflicting options are
    /// rejected before the first cluster call.
    pub async fn reconcile_all(
        &self,
        desired: Vec<ResourceObject>,
        opts: &ReconcileOptions,
    ) -> Result<Summary, EngineError> {
        opts.validate()?;
        let mut aggregator = ResultAggregator::new();
        for object in desired {
            let result = self.reconcile_inner(object, opts).await;
            let failed = result.failed();
            aggregator.record(result);
            if failed && opts.fail_fast {
                warn!("aborting batch: fail-fast is set and an object failed");
                break;
            }
        }
        Ok(aggregator.into_summary())
    }

    /// Reconciles a single definition.
    pub async fn reconcile(
        &self,
        desired: ResourceObject,
        opts: &ReconcileOptions,
    ) -> Result<ReconcileResult, EngineError> {
        opts.validate()?;
        Ok(self.reconcile_inner(desired, opts).await)
    }

    async fn reconcile_inner(
        &self,
        desired: ResourceObject,
        opts: &ReconcileOptions,
    ) -> ReconcileResult {
        let id = desired.object_ref();
        match self.try_reconcile(desired, opts).await {
            Ok(result) => result,
            Err(err) => {
                warn!("failed to reconcile {id}: {err}");
                ReconcileResult::failure(None, err.to_string())
            }
        }
    }

    async fn try_reconcile(
        &self,
        mut desired: ResourceObject,
        opts: &ReconcileOptions,
    ) -> Result<ReconcileResult, EngineError> {
        if opts.append_hash {
            // Silently a no-op for kinds other than ConfigMap/Secret.
            append_hash(&mut desired);
        }
        if desired.name().is_empty() {
            return Err(EngineError::Definition(format!(
                "missing metadata.name for kind {}",
                desired.kind
            )));
        }
        let id = desired.object_ref();
        info!("Reconciling {id}");

        let mut warnings = Vec::new();
        if let (Some(validator), Some(policy)) = (&self.validator, &opts.validation) {
            let issues = validator.validate(&desired, policy.version.as_deref(), policy.strict);
            if !issues.is_empty() {
                if policy.fail_on_error {
                    return Err(EngineError::Validation {
                        id: id.to_string(),
                        issues: issues.into_iter().map(|i| i.message).collect(),
                    });
                }
                for issue in issues {
                    warn!("validation issue for {id}: {}", issue.message);
                    warnings.push(issue.message);
                }
            }
        }

        let live = self.client.get(&id).await?;
        let mode = if opts.apply {
            PlanMode::Apply
        } else {
            PlanMode::Merge(opts.merge_type_order())
        };
        let plan = planner::plan(live.as_ref(), &desired, opts.state, &mode)?;

        if opts.check_mode {
            let mut result = synthesize_check_result(plan, &desired, live);
            result.warnings = warnings;
            return Ok(result);
        }

        let mut result = match plan {
            Plan::Create(body) => {
                let created = self.client.create(&body).await?;
                info!("Created {id}");
                ReconcileResult::new(ReconcileAction::Created, Some(created))
            }
            Plan::Patch { patch, merge_type } => {
                let patched = self.client.patch(&id, &patch, merge_type).await?;
                info!("Patched {id} ({merge_type})");
                ReconcileResult::new(ReconcileAction::Patched, Some(patched))
            }
            Plan::Delete => match self.client.delete(&id).await {
                Ok(()) => {
                    info!("Deleted {id}");
                    ReconcileResult::new(ReconcileAction::Deleted, None)
                }
                // Someone else removed it first; desired state holds.
                Err(err) if err.is_not_found() => {
                    ReconcileResult::new(ReconcileAction::Unchanged, None)
                }
                Err(err) => return Err(err.into()),
            },
            Plan::Noop => ReconcileResult::new(ReconcileAction::Unchanged, live),
        };
        result.warnings = warnings;

        if opts.wait.enabled {
            self.run_wait(&mut result, &desired, opts).await;
        }
        Ok(result)
    }

    /// Runs the post-apply wait and folds the outcome into the result.
    /// A failed wait never rolls back the applied change: whether the
    /// budget ran out or a poll hit a hard accessor error, the result
    /// keeps its action and object and only gains the error.
    async fn run_wait(
        &self,
        result: &mut ReconcileResult,
        desired: &ResourceObject,
        opts: &ReconcileOptions,
    ) {
        let id = desired.object_ref();
        let target = match (opts.state, &opts.wait.condition) {
            (State::Absent, _) => WaitFor::Absent,
            (State::Present, Some(condition)) => WaitFor::Condition(condition.clone()),
            (State::Present, None) => WaitFor::Ready,
        };

        let waiter = Waiter::new(self.client.as_ref());
        match waiter
            .wait(&id, &target, opts.wait.timeout(), opts.wait.sleep())
            .await
        {
            Ok(outcome) => {
                result.duration_seconds = Some(outcome.elapsed.as_secs());
                if outcome.last_observed.is_some() {
                    result.object = outcome.last_observed;
                }
                if !outcome.satisfied {
                    result.error = Some(
                        EngineError::WaitTimeout {
                            id: id.to_string(),
                            elapsed_seconds: outcome.elapsed.as_secs(),
                        }
                        .to_string(),
                    );
                }
            }
            Err(err) => {
                warn!("wait for {id} aborted: {err}");
                result.error = Some(err.to_string());
            }
        }
    }
}

/// Check mode: report what would happen without writing.
fn synthesize_check_result(
    plan: Plan,
    desired: &ResourceObject,
    live: Option<ResourceObject>,
) -> ReconcileResult {
    match plan {
        Plan::Create(body) => ReconcileResult::new(ReconcileAction::Created, Some(body)),
        Plan::Patch { .. } => {
            ReconcileResult::new(ReconcileAction::Patched, Some(desired.clone()))
        }
        Plan::Delete => ReconcileResult::new(ReconcileAction::Deleted, None),
        Plan::Noop => ReconcileResult::new(ReconcileAction::Unchanged, live),
    }
}
