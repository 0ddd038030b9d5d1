//! Condition waiter
//!
//! Polls the cluster until a resource satisfies a predicate or the
//! timeout budget runs out. Polling blocks the reconciliation loop by
//! design: nothing else proceeds during a wait, and timeout is the only
//! abort mechanism. Transport errors while polling are treated as
//! transient and retried within the remaining budget.

use crate::readiness;
use cluster_client::{ClusterClientTrait, ClusterError};
use resource_model::{Condition, ObjectRef, ResourceObject};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// What the waiter is waiting for.
#[derive(Debug, Clone, PartialEq)]
pub enum WaitFor {
    /// A specific `status.conditions` entry.
    Condition(Condition),
    /// The built-in readiness predicate for the object's kind;
    /// immediately satisfied for kinds without one.
    Ready,
    /// The object to be gone (404-equivalent).
    Absent,
}

/// Result of a wait, satisfied or not. An unsatisfied outcome carries
/// the last observed object for diagnostics.
#[derive(Debug, Clone)]
pub struct WaitOutcome {
    /// Whether the predicate was met within the budget.
    pub satisfied: bool,
    /// Time spent polling.
    pub elapsed: Duration,
    /// The object as last seen, `None` if it was never observed (or
    /// was absent).
    pub last_observed: Option<ResourceObject>,
}

/// Polls a cluster accessor until a predicate holds.
pub struct Waiter<'a> {
    client: &'a dyn ClusterClientTrait,
}

impl<'a> Waiter<'a> {
    /// Waiter over the given accessor.
    pub fn new(client: &'a dyn ClusterClientTrait) -> Self {
        Self { client }
    }

    /// Polls every `sleep` until `target` holds for `id`, or `timeout`
    /// elapses. A timeout shorter than the sleep degenerates to a
    /// single poll. Non-transient accessor errors abort the wait.
    pub async fn wait(
        &self,
        id: &ObjectRef,
        target: &WaitFor,
        timeout: Duration,
        sleep: Duration,
    ) -> Result<WaitOutcome, ClusterError> {
        let started = Instant::now();
        let mut last_observed = None;
        loop {
            match self.client.get(id).await {
                Ok(observed) => {
                    let satisfied = is_satisfied(target, observed.as_ref());
                    last_observed = observed;
                    if satisfied {
                        debug!("{id} satisfied wait target after {:?}", started.elapsed());
                        return Ok(WaitOutcome {
                            satisfied: true,
                            elapsed: started.elapsed(),
                            last_observed,
                        });
                    }
                }
                Err(err) if err.is_transient() => {
                    // Transient while polling; retry until the budget
                    // runs out.
                    warn!("transient error while waiting for {id}: {err}");
                }
                Err(err) => return Err(err),
            }

            if started.elapsed() + sleep > timeout {
                debug!("{id} wait budget exhausted after {:?}", started.elapsed());
                return Ok(WaitOutcome {
                    satisfied: false,
                    elapsed: started.elapsed(),
                    last_observed,
                });
            }
            tokio::time::sleep(sleep).await;
        }
    }
}

fn is_satisfied(target: &WaitFor, observed: Option<&ResourceObject>) -> bool {
    match target {
        WaitFor::Absent => observed.is_none(),
        WaitFor::Condition(condition) => observed.is_some_and(|obj| condition.is_met_by(obj)),
        WaitFor::Ready => observed.is_some_and(|obj| match readiness::builtin(&obj.kind) {
            Some(check) => check(obj),
            // No built-in predicate for this kind: no-op wait.
            None => true,
        }),
    }
}
