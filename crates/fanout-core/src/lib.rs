//! Core types and error definitions for the Fanout orchestrator.
//!
//! This crate provides the foundational types shared across all Fanout
//! crates: the query/subtask data model, the aggregated-response shape,
//! the error taxonomy, and the [`Worker`] contract every agent adapter
//! implements.
//!
//! # Main types
//!
//! - [`FanoutError`] — Unified error enum for all orchestration subsystems.
//! - [`FanoutResult`] — Convenience alias for `Result<T, FanoutError>`.
//! - [`Query`] — A raw user query with its correlation id.
//! - [`Subtask`] — One independently dispatchable unit of work.
//! - [`TaskState`] — Per-subtask lifecycle state machine.
//! - [`AggregatedResponse`] — The single fan-in result for a query.
//! - [`WorkerEndpoint`] — A registered worker with capability tags and health.
//! - [`Worker`] — The capability-tagged invocation contract.

/// Query, subtask, response, and endpoint model types.
pub mod model;
/// The worker invocation contract and its typed failures.
pub mod worker;

pub use model::{
    AggregatedResponse, HealthState, OverallStatus, Query, Subtask, SubtaskReport, TaskState,
    WorkerEndpoint,
};
pub use worker::{Worker, WorkerFailure};

/// Top-level error type for the Fanout orchestrator.
///
/// The per-subtask variants (`NoCapableWorker`, `AllWorkersUnhealthy`,
/// `Timeout`, `Connection`, `Logical`) never escape the Manager: they are
/// captured into the [`AggregatedResponse`]'s per-subtask reports. Only
/// `Decomposition` is fatal to a whole query, and even that surfaces as a
/// `Failed` response rather than an `Err` from the Manager entrypoint.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    /// The decomposition backend could not produce a valid task list.
    #[error("Decomposition error: {0}")]
    Decomposition(String),

    /// No endpoint is registered for the requested capability.
    #[error("No capable worker for capability '{0}'")]
    NoCapableWorker(String),

    /// Endpoints exist for the capability but none is currently healthy.
    #[error("All workers unhealthy for capability '{0}'")]
    AllWorkersUnhealthy(String),

    /// A subtask deadline elapsed before the worker responded.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// A transport-level failure reaching a worker.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A domain failure reported by the worker itself.
    #[error("Worker error: {0}")]
    Logical(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`FanoutError`].
pub type FanoutResult<T> = Result<T, FanoutError>;

impl FanoutError {
    /// Whether this error is transient and eligible for the Manager's
    /// single automatic retry.
    ///
    /// Connection-level failures and transient whole-pool outages are
    /// retryable; a worker-reported logical failure is not (retrying
    /// cannot fix a semantically wrong answer), a missing capability is a
    /// misconfiguration, and a timeout forces the terminal state.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FanoutError::Connection(_) | FanoutError::AllWorkersUnhealthy(_)
        )
    }
}

impl From<WorkerFailure> for FanoutError {
    fn from(failure: WorkerFailure) -> Self {
        match failure {
            WorkerFailure::Timeout => FanoutError::Timeout("worker call timed out".into()),
            WorkerFailure::Connection(msg) => FanoutError::Connection(msg),
            WorkerFailure::Logical(msg) => FanoutError::Logical(msg),
        }
    }
}
