use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// A raw user query plus its correlation id.
///
/// Immutable once accepted; consumed by the Scheduler and discarded after
/// the response is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// Correlation identifier, echoed in the [`AggregatedResponse`].
    pub id: Uuid,
    /// The raw query text as entered by the user.
    pub text: String,
}

impl Query {
    /// Creates a query with a fresh correlation id.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
        }
    }
}

/// One independently dispatchable unit of work derived from a query.
///
/// Created by the Scheduler and never mutated afterwards; owned by the
/// Manager for the duration of dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    /// Unique within the originating query.
    pub id: Uuid,
    /// Capability tag naming the kind of worker this subtask requires.
    pub capability: String,
    /// String-typed parameter mapping passed to the worker.
    pub params: BTreeMap<String, String>,
    /// Per-subtask timeout in milliseconds; the Manager default applies
    /// when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Subtask {
    /// Creates a subtask for the given capability with a fresh id.
    pub fn new(capability: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            capability: capability.into(),
            params,
            timeout_ms: None,
        }
    }

    /// Sets a per-subtask timeout in milliseconds.
    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// The per-subtask timeout as a [`Duration`], if one was set.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Per-subtask lifecycle state.
///
/// `Pending → Dispatched → {Succeeded | Failed | TimedOut}`. Exactly one
/// terminal state is ever recorded per subtask; the first terminal
/// transition wins and later events for the same subtask are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Created by the Scheduler, not yet sent anywhere.
    Pending,
    /// Sent to a resolved worker; awaiting its outcome.
    Dispatched,
    /// The worker returned a payload within the deadline.
    Succeeded,
    /// Resolution failed or the worker reported a failure.
    Failed,
    /// The per-subtask or global deadline elapsed first.
    TimedOut,
}

impl TaskState {
    /// Whether no further transition can occur from this state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Succeeded | TaskState::Failed | TaskState::TimedOut
        )
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Dispatched => write!(f, "dispatched"),
            TaskState::Succeeded => write!(f, "succeeded"),
            TaskState::Failed => write!(f, "failed"),
            TaskState::TimedOut => write!(f, "timed_out"),
        }
    }
}

/// The recorded outcome of one subtask inside an [`AggregatedResponse`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskReport {
    /// Id of the subtask this report describes.
    pub subtask_id: Uuid,
    /// Capability tag the subtask required.
    pub capability: String,
    /// Terminal state the subtask reached.
    pub state: TaskState,
    /// Worker payload, present only when `state` is `Succeeded`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    /// Error description, present for `Failed` and `TimedOut`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SubtaskReport {
    /// A report for a subtask that succeeded with the given payload.
    pub fn succeeded(subtask: &Subtask, payload: serde_json::Value) -> Self {
        Self {
            subtask_id: subtask.id,
            capability: subtask.capability.clone(),
            state: TaskState::Succeeded,
            payload: Some(payload),
            error: None,
        }
    }

    /// A report for a subtask that reached `Failed`.
    pub fn failed(subtask: &Subtask, error: impl Into<String>) -> Self {
        Self {
            subtask_id: subtask.id,
            capability: subtask.capability.clone(),
            state: TaskState::Failed,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// A report for a subtask that reached `TimedOut`.
    pub fn timed_out(subtask: &Subtask, error: impl Into<String>) -> Self {
        Self {
            subtask_id: subtask.id,
            capability: subtask.capability.clone(),
            state: TaskState::TimedOut,
            payload: None,
            error: Some(error.into()),
        }
    }
}

/// Overall status of an [`AggregatedResponse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    /// Every subtask reached `Succeeded` (vacuously true for zero subtasks).
    Complete,
    /// At least one subtask succeeded and at least one did not.
    Partial,
    /// No subtask succeeded.
    Failed,
}

impl OverallStatus {
    /// Classifies a set of subtask reports.
    ///
    /// `Complete` iff every report is `Succeeded` (an empty set counts as
    /// complete), `Failed` iff none succeeded, `Partial` otherwise. The
    /// three cases are exhaustive.
    pub fn classify(reports: &[SubtaskReport]) -> Self {
        let succeeded = reports
            .iter()
            .filter(|r| r.state == TaskState::Succeeded)
            .count();
        if succeeded == reports.len() {
            OverallStatus::Complete
        } else if succeeded == 0 {
            OverallStatus::Failed
        } else {
            OverallStatus::Partial
        }
    }
}

/// The single fan-in result produced once per query.
///
/// Created by the Manager when all subtasks are terminal or the global
/// deadline fires; immutable thereafter. The report sequence has the same
/// cardinality and ordering as the Scheduler's output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResponse {
    /// Correlation id of the originating query.
    pub query_id: Uuid,
    /// Three-way overall classification.
    pub overall: OverallStatus,
    /// Per-subtask outcomes in original decomposition order.
    pub subtasks: Vec<SubtaskReport>,
    /// When aggregation completed.
    pub completed_at: DateTime<Utc>,
}

impl AggregatedResponse {
    /// Builds a response from the collected reports, classifying the
    /// overall status.
    pub fn from_reports(query_id: Uuid, reports: Vec<SubtaskReport>) -> Self {
        Self {
            query_id,
            overall: OverallStatus::classify(&reports),
            subtasks: reports,
            completed_at: Utc::now(),
        }
    }
}

/// Liveness state of a registered worker endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    /// Last observed dispatch or probe succeeded.
    Healthy,
    /// Last observed dispatch or probe failed.
    Unhealthy,
    /// Never observed; eligible for dispatch until proven otherwise.
    Unknown,
}

/// A registered worker endpoint: capability tags, an address, and health.
///
/// Health is mutated only by the Router's liveness feedback: an observed
/// dispatch failure degrades it, a subsequent success restores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerEndpoint {
    /// Human-readable name (e.g. from a remote agent card).
    pub name: String,
    /// Address or handle identifying the endpoint; unique in the registry.
    pub address: String,
    /// Capability tags this endpoint can serve.
    pub capabilities: Vec<String>,
    /// Current liveness state.
    pub health: HealthState,
}

impl WorkerEndpoint {
    /// Creates an endpoint with `Unknown` health.
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        capabilities: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            capabilities,
            health: HealthState::Unknown,
        }
    }

    /// Whether this endpoint serves the given capability tag.
    pub fn supports(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether this endpoint is eligible for dispatch.
    ///
    /// `Unknown` counts as eligible: a fresh endpoint is dispatched to
    /// until a failure is observed.
    pub fn is_dispatchable(&self) -> bool {
        self.health != HealthState::Unhealthy
    }
}
