use crate::registry::AgentRegistry;
use fanout_core::{FanoutError, FanoutResult, HealthState, Worker, WorkerEndpoint};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// How the router chooses among multiple dispatchable endpoints for one
/// capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Cycle through dispatchable endpoints in registration order,
    /// skipping unhealthy ones.
    #[default]
    RoundRobin,
    /// Always pick the first dispatchable endpoint in registration order.
    FirstHealthy,
}

/// A successfully resolved worker: an endpoint snapshot plus the handle
/// to invoke it.
///
/// The snapshot is taken at resolution time, so a concurrent deregister
/// cannot invalidate an in-flight dispatch.
pub struct ResolvedWorker {
    /// Endpoint metadata as of resolution time.
    pub endpoint: WorkerEndpoint,
    /// Invocation handle for the worker contract.
    pub worker: Arc<dyn Worker>,
}

impl std::fmt::Debug for ResolvedWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedWorker")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Resolves a required capability to one concrete, dispatchable worker.
///
/// Safe under concurrent calls from multiple in-flight subtasks: the
/// registry snapshot and the per-capability round-robin cursors are each
/// guarded by short-lived sync locks, and no lock is held across a
/// network call — health updates happen strictly before or after the
/// worker invocation.
pub struct Router {
    registry: Arc<AgentRegistry>,
    policy: SelectionPolicy,
    cursors: Mutex<HashMap<String, usize>>,
}

impl Router {
    /// Creates a router over the given registry with the default
    /// round-robin policy.
    pub fn new(registry: Arc<AgentRegistry>) -> Self {
        Self::with_policy(registry, SelectionPolicy::default())
    }

    /// Creates a router with an explicit selection policy.
    pub fn with_policy(registry: Arc<AgentRegistry>, policy: SelectionPolicy) -> Self {
        Self {
            registry,
            policy,
            cursors: Mutex::new(HashMap::new()),
        }
    }

    /// The registry this router resolves against.
    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    /// Resolves the capability to one dispatchable worker.
    ///
    /// Fails with [`FanoutError::NoCapableWorker`] when nothing is
    /// registered for the capability, and
    /// [`FanoutError::AllWorkersUnhealthy`] when endpoints exist but none
    /// is currently dispatchable — distinct kinds because they imply
    /// different remediation (misconfiguration vs. transient outage).
    pub fn resolve(&self, capability: &str) -> FanoutResult<ResolvedWorker> {
        let candidates = self.registry.candidates_for(capability);
        if candidates.is_empty() {
            return Err(FanoutError::NoCapableWorker(capability.to_string()));
        }

        let dispatchable: Vec<(WorkerEndpoint, Arc<dyn Worker>)> = candidates
            .into_iter()
            .filter(|(endpoint, _)| endpoint.is_dispatchable())
            .collect();
        if dispatchable.is_empty() {
            return Err(FanoutError::AllWorkersUnhealthy(capability.to_string()));
        }

        let index = match self.policy {
            SelectionPolicy::FirstHealthy => 0,
            SelectionPolicy::RoundRobin => {
                let mut cursors = self.cursors.lock();
                let cursor = cursors.entry(capability.to_string()).or_insert(0);
                let index = *cursor % dispatchable.len();
                *cursor = cursor.wrapping_add(1);
                index
            }
        };

        let (endpoint, worker) = dispatchable
            .into_iter()
            .nth(index)
            .ok_or_else(|| FanoutError::AllWorkersUnhealthy(capability.to_string()))?;

        debug!(
            capability = %capability,
            endpoint = %endpoint.address,
            "Resolved capability to endpoint"
        );
        Ok(ResolvedWorker { endpoint, worker })
    }

    /// Records an observed dispatch failure: the endpoint is degraded to
    /// `Unhealthy` and skipped by subsequent resolutions until restored.
    pub fn report_failure(&self, address: &str) {
        self.registry.set_health(address, HealthState::Unhealthy);
    }

    /// Records an observed dispatch success, restoring the endpoint to
    /// `Healthy`.
    pub fn report_success(&self, address: &str) {
        self.registry.set_health(address, HealthState::Healthy);
    }
}
