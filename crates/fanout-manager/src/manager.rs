use crate::config::ManagerConfig;
use fanout_core::{
    AggregatedResponse, FanoutError, FanoutResult, Query, Subtask, SubtaskReport, TaskState,
    WorkerFailure,
};
use fanout_registry::{ResolvedWorker, Router};
use fanout_scheduler::Scheduler;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Capability tag used for the synthetic report entry describing a
/// decomposition failure.
const DECOMPOSITION_CAPABILITY: &str = "decomposition";

/// Linear per-query phase machine, exposed for observability.
///
/// `Decomposing → Dispatching → Aggregating → Done`, no backward
/// transitions within one query. `Idle` is the state before the first
/// query; a later `execute` call starts the machine over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagerPhase {
    /// No query in flight yet.
    Idle,
    /// Waiting on the Scheduler's decomposition.
    Decomposing,
    /// Subtasks fanned out, fan-in barrier not yet satisfied.
    Dispatching,
    /// Building the aggregated response.
    Aggregating,
    /// Response produced.
    Done,
}

/// The dispatch/tracking/aggregation core.
///
/// `execute` is infallible from the caller's point of view: subtask-level
/// errors are captured into the response's per-subtask reports, and even
/// a fatal decomposition failure comes back as a `Failed` response rather
/// than an `Err`.
pub struct Manager {
    scheduler: Scheduler,
    router: Arc<Router>,
    config: ManagerConfig,
    phase: RwLock<ManagerPhase>,
}

impl Manager {
    /// Creates a manager over the given scheduler and router.
    pub fn new(scheduler: Scheduler, router: Arc<Router>, config: ManagerConfig) -> Self {
        Self {
            scheduler,
            router,
            config,
            phase: RwLock::new(ManagerPhase::Idle),
        }
    }

    /// The phase of the current (or most recent) query.
    pub fn phase(&self) -> ManagerPhase {
        *self.phase.read()
    }

    fn set_phase(&self, phase: ManagerPhase) {
        debug!(phase = ?phase, "Manager phase transition");
        *self.phase.write() = phase;
    }

    /// Orchestrates one query end to end and returns the single
    /// aggregated response.
    ///
    /// Synchronous from the caller's point of view even though dispatch
    /// is internally concurrent; bounded by the configured global
    /// deadline regardless of individual worker misbehavior.
    pub async fn execute(&self, query_text: &str) -> AggregatedResponse {
        let query = Query::new(query_text);
        info!(query = %query.id, "Executing query");

        self.set_phase(ManagerPhase::Decomposing);
        let subtasks = match self.scheduler.decompose(&query).await {
            Ok(subtasks) => subtasks,
            Err(err) => {
                warn!(query = %query.id, error = %err, "Decomposition failed, aborting query");
                self.set_phase(ManagerPhase::Done);
                return decomposition_failure(query.id, &err);
            }
        };

        // No decomposable work: an empty but Complete response, no dispatch.
        if subtasks.is_empty() {
            self.set_phase(ManagerPhase::Done);
            return AggregatedResponse::from_reports(query.id, Vec::new());
        }

        self.set_phase(ManagerPhase::Dispatching);
        let reports = self.dispatch_all(&query, &subtasks).await;

        self.set_phase(ManagerPhase::Aggregating);
        let response = AggregatedResponse::from_reports(query.id, reports);
        info!(
            query = %query.id,
            overall = ?response.overall,
            subtasks = response.subtasks.len(),
            "Query aggregated"
        );

        self.set_phase(ManagerPhase::Done);
        response
    }

    /// Fans out every subtask concurrently and waits at the fan-in
    /// barrier until all are terminal or the global deadline fires.
    ///
    /// Each subtask writes its terminal report into a slot indexed by
    /// decomposition order; the first terminal write wins, so a late
    /// worker result cannot overwrite a deadline-forced `TimedOut`. The
    /// returned vector therefore always has the same cardinality and
    /// ordering as the Scheduler's output.
    async fn dispatch_all(&self, query: &Query, subtasks: &[Subtask]) -> Vec<SubtaskReport> {
        let slots: Arc<Mutex<Vec<Option<SubtaskReport>>>> =
            Arc::new(Mutex::new(vec![None; subtasks.len()]));

        let mut units = JoinSet::new();
        for (index, subtask) in subtasks.iter().cloned().enumerate() {
            let router = Arc::clone(&self.router);
            let config = self.config.clone();
            let slots = Arc::clone(&slots);
            units.spawn(async move {
                let report = run_subtask(&router, &subtask, &config).await;
                let mut slots = slots.lock();
                if slots[index].is_none() {
                    slots[index] = Some(report);
                }
            });
        }

        let barrier = async {
            while units.join_next().await.is_some() {}
        };
        if tokio::time::timeout(self.config.global_deadline(), barrier)
            .await
            .is_err()
        {
            warn!(
                query = %query.id,
                deadline_ms = self.config.global_deadline_ms,
                "Global deadline elapsed, cancelling outstanding subtasks"
            );
            units.abort_all();
        }

        let mut slots = slots.lock();
        subtasks
            .iter()
            .enumerate()
            .map(|(index, subtask)| {
                slots[index]
                    .take()
                    .unwrap_or_else(|| SubtaskReport::timed_out(subtask, "global deadline elapsed"))
            })
            .collect()
    }
}

/// Runs one subtask to its terminal state: resolve, dispatch, and at most
/// one retry for a transient resolution/connection failure.
///
/// A connection-failure retry re-invokes the same endpoint, acting as the
/// next-attempt probe that can restore its health; a whole-pool
/// resolution failure retries by resolving again.
async fn run_subtask(router: &Router, subtask: &Subtask, config: &ManagerConfig) -> SubtaskReport {
    let deadline = subtask
        .timeout()
        .unwrap_or_else(|| config.default_subtask_timeout());

    let mut attempt = 0u32;
    let mut probe_target: Option<ResolvedWorker> = None;
    loop {
        attempt += 1;
        let may_retry = config.retry_transient && attempt == 1;

        let resolved = match probe_target.take() {
            Some(resolved) => resolved,
            None => match router.resolve(&subtask.capability) {
                Ok(resolved) => resolved,
                Err(err) => {
                    if may_retry && err.is_transient() {
                        info!(subtask = %subtask.id, error = %err, "Transient resolution failure, retrying once");
                        continue;
                    }
                    warn!(
                        subtask = %subtask.id,
                        capability = %subtask.capability,
                        error = %err,
                        "Resolution failed, subtask terminal"
                    );
                    return SubtaskReport::failed(subtask, err.to_string());
                }
            },
        };

        match invoke_once(router, &resolved, subtask, deadline).await {
            Ok(payload) => {
                info!(
                    subtask = %subtask.id,
                    capability = %subtask.capability,
                    attempt,
                    state = %TaskState::Succeeded,
                    "Subtask succeeded"
                );
                return SubtaskReport::succeeded(subtask, payload);
            }
            Err(err) => {
                if may_retry && err.is_transient() {
                    info!(
                        subtask = %subtask.id,
                        endpoint = %resolved.endpoint.address,
                        error = %err,
                        "Transient failure, retrying once"
                    );
                    // The retry probes the endpoint that just failed.
                    probe_target = Some(resolved);
                    continue;
                }
                warn!(
                    subtask = %subtask.id,
                    capability = %subtask.capability,
                    attempt,
                    error = %err,
                    "Subtask reached terminal failure"
                );
                return match err {
                    FanoutError::Timeout(msg) => SubtaskReport::timed_out(subtask, msg),
                    other => SubtaskReport::failed(subtask, other.to_string()),
                };
            }
        }
    }
}

/// One invocation attempt against a resolved worker, bounded by the
/// subtask deadline, feeding the observed outcome back into the
/// endpoint's health. No registry lock is held across the call.
async fn invoke_once(
    router: &Router,
    resolved: &ResolvedWorker,
    subtask: &Subtask,
    deadline: Duration,
) -> FanoutResult<serde_json::Value> {
    debug!(
        subtask = %subtask.id,
        endpoint = %resolved.endpoint.address,
        state = %TaskState::Dispatched,
        "Dispatching subtask"
    );

    match tokio::time::timeout(deadline, resolved.worker.invoke(&subtask.params, deadline)).await {
        Ok(Ok(payload)) => {
            router.report_success(&resolved.endpoint.address);
            Ok(payload)
        }
        // A worker-reported domain failure says nothing about liveness.
        Ok(Err(WorkerFailure::Logical(msg))) => Err(FanoutError::Logical(msg)),
        Ok(Err(failure)) => {
            router.report_failure(&resolved.endpoint.address);
            Err(failure.into())
        }
        Err(_) => {
            router.report_failure(&resolved.endpoint.address);
            Err(FanoutError::Timeout(format!(
                "subtask deadline of {}ms elapsed",
                deadline.as_millis()
            )))
        }
    }
}

/// Builds the `Failed` response for a query whose decomposition failed:
/// one synthetic entry describing the failure, nothing dispatched.
fn decomposition_failure(query_id: Uuid, err: &FanoutError) -> AggregatedResponse {
    let report = SubtaskReport {
        subtask_id: Uuid::new_v4(),
        capability: DECOMPOSITION_CAPABILITY.to_string(),
        state: TaskState::Failed,
        payload: None,
        error: Some(err.to_string()),
    };
    AggregatedResponse::from_reports(query_id, vec![report])
}
