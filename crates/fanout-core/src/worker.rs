use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// A typed failure returned by a worker invocation.
///
/// Distinct from [`crate::FanoutError`]: this is the worker-side half of
/// the contract, mapped into the orchestrator taxonomy at the dispatch
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerFailure {
    /// The caller-supplied deadline elapsed inside the worker call.
    #[error("worker call timed out")]
    Timeout,
    /// The worker could not be reached or the transport failed mid-call.
    #[error("connection failure: {0}")]
    Connection(String),
    /// The worker itself reported a domain failure.
    #[error("logical failure: {0}")]
    Logical(String),
}

/// The uniform contract every worker agent implements.
///
/// A worker accepts one subtask's parameter mapping, performs its single
/// capability against the external tool or service, and returns either an
/// opaque structured payload or a [`WorkerFailure`] — within the
/// caller-supplied deadline. Any serialization of the call for transport
/// is the adapter's concern; the orchestration core depends only on this
/// call/deadline/result shape.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Performs the capability with the given parameters.
    ///
    /// Implementations should honor `deadline` as an upper bound on the
    /// whole call; the Manager additionally enforces it from the outside,
    /// so a worker that overruns merely has its result discarded.
    async fn invoke(
        &self,
        params: &BTreeMap<String, String>,
        deadline: Duration,
    ) -> Result<serde_json::Value, WorkerFailure>;
}
