use crate::backend::DecompositionBackend;
use fanout_core::{FanoutError, FanoutResult, Query, Subtask};
use std::sync::Arc;
use tracing::info;

/// Consumes a raw user query and produces an ordered set of independent,
/// capability-tagged subtasks.
///
/// The scheduler owns id assignment (each subtask gets an id unique
/// within the query) and order preservation; the decomposition itself is
/// delegated to the configured [`DecompositionBackend`]. Any backend
/// failure is fatal for the query and surfaces as
/// [`FanoutError::Decomposition`] — the Manager must not attempt partial
/// dispatch in that case.
pub struct Scheduler {
    backend: Arc<dyn DecompositionBackend>,
}

impl Scheduler {
    /// Creates a scheduler over the given decomposition backend.
    pub fn new(backend: Arc<dyn DecompositionBackend>) -> Self {
        Self { backend }
    }

    /// Decomposes the query into zero or more subtasks.
    ///
    /// Zero subtasks is valid (no decomposable work); an empty query text
    /// is not. Capability tags are not checked against the registry here
    /// — resolution is the Router's job at dispatch time.
    pub async fn decompose(&self, query: &Query) -> FanoutResult<Vec<Subtask>> {
        if query.text.trim().is_empty() {
            return Err(FanoutError::Decomposition("empty query text".into()));
        }

        let specs = self
            .backend
            .decompose(&query.text)
            .await
            .map_err(|e| match e {
                FanoutError::Decomposition(_) => e,
                other => FanoutError::Decomposition(other.to_string()),
            })?;

        let subtasks: Vec<Subtask> = specs
            .into_iter()
            .map(|spec| Subtask::new(spec.capability, spec.params))
            .collect();

        info!(
            query = %query.id,
            subtasks = subtasks.len(),
            "Query decomposed"
        );
        Ok(subtasks)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::backend::TaskSpec;
    use crate::keyword::KeywordPlanner;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::collections::HashSet;

    struct FailingBackend;

    #[async_trait]
    impl DecompositionBackend for FailingBackend {
        async fn decompose(&self, _query_text: &str) -> FanoutResult<Vec<TaskSpec>> {
            Err(FanoutError::Logical("planner returned garbage".into()))
        }
    }

    struct EmptyBackend;

    #[async_trait]
    impl DecompositionBackend for EmptyBackend {
        async fn decompose(&self, _query_text: &str) -> FanoutResult<Vec<TaskSpec>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_assigns_unique_ids_and_preserves_order() {
        let scheduler = Scheduler::new(Arc::new(KeywordPlanner::new()));
        let query = Query::new("weather in Beijing and USD to RMB rate");

        let subtasks = scheduler.decompose(&query).await.unwrap();
        assert_eq!(subtasks.len(), 2);
        assert_eq!(subtasks[0].capability, "weather");
        assert_eq!(subtasks[1].capability, "fx");

        let ids: HashSet<_> = subtasks.iter().map(|t| t.id).collect();
        assert_eq!(ids.len(), subtasks.len());
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let scheduler = Scheduler::new(Arc::new(KeywordPlanner::new()));
        let query = Query::new("   ");

        let err = scheduler.decompose(&query).await.unwrap_err();
        assert!(matches!(err, FanoutError::Decomposition(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_surfaces_as_decomposition_error() {
        let scheduler = Scheduler::new(Arc::new(FailingBackend));
        let query = Query::new("anything at all");

        let err = scheduler.decompose(&query).await.unwrap_err();
        assert!(matches!(err, FanoutError::Decomposition(_)));
        assert!(err.to_string().contains("planner returned garbage"));
    }

    #[tokio::test]
    async fn test_zero_subtasks_is_valid() {
        let scheduler = Scheduler::new(Arc::new(EmptyBackend));
        let query = Query::new("nothing to do here");

        let subtasks = scheduler.decompose(&query).await.unwrap();
        assert!(subtasks.is_empty());
    }

    #[tokio::test]
    async fn test_params_pass_through() {
        struct OneTask;

        #[async_trait]
        impl DecompositionBackend for OneTask {
            async fn decompose(&self, _query_text: &str) -> FanoutResult<Vec<TaskSpec>> {
                let mut params = BTreeMap::new();
                params.insert("from".to_string(), "USD".to_string());
                params.insert("to".to_string(), "RMB".to_string());
                Ok(vec![TaskSpec::new("fx", params)])
            }
        }

        let scheduler = Scheduler::new(Arc::new(OneTask));
        let subtasks = scheduler
            .decompose(&Query::new("USD to RMB"))
            .await
            .unwrap();
        assert_eq!(subtasks[0].params["from"], "USD");
        assert_eq!(subtasks[0].params["to"], "RMB");
    }
}
