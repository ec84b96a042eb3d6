use async_trait::async_trait;
use fanout_core::FanoutResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One decomposed unit as produced by a backend: a capability tag plus
/// the parameter mapping to pass to the worker.
///
/// Subtask ids are assigned later by the [`crate::Scheduler`]; backends
/// only describe the work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    /// Capability tag the unit requires (e.g. `weather`, `fx`).
    pub capability: String,
    /// String-typed parameters for the worker.
    pub params: BTreeMap<String, String>,
}

impl TaskSpec {
    /// Creates a task spec for the given capability.
    pub fn new(capability: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            capability: capability.into(),
            params,
        }
    }
}

/// The black-box decomposition seam.
///
/// Given query text, returns the ordered list of independent units, or an
/// error when the underlying logic cannot produce a valid task list
/// (malformed output, unparseable structure). Returning an empty list is
/// valid and means there is no decomposable work.
///
/// Backends do not validate that a capability is actually registered —
/// that is the Router's job at dispatch time, which keeps decomposition
/// logic decoupled from runtime topology.
#[async_trait]
pub trait DecompositionBackend: Send + Sync {
    /// Decomposes the query text into `(capability, params)` units.
    async fn decompose(&self, query_text: &str) -> FanoutResult<Vec<TaskSpec>>;
}
