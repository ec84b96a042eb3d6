use crate::client::A2aClient;
use crate::protocol::A2aTaskState;
use async_trait::async_trait;
use fanout_core::{Worker, WorkerFailure};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// [`Worker`] backed by a remote A2A agent.
///
/// Renders the subtask parameter mapping into one natural-language
/// message, submits it via `tasks/send`, and maps the agent's terminal
/// task state back into the worker contract: `completed` yields the
/// payload, everything else is a failure.
pub struct RemoteWorker {
    client: A2aClient,
    session_id: String,
}

impl RemoteWorker {
    /// Creates a worker for the agent at `base_url`, with a fresh session.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: A2aClient::new(base_url),
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// The agent base URL this worker dispatches to.
    pub fn base_url(&self) -> &str {
        self.client.base_url()
    }
}

#[async_trait]
impl Worker for RemoteWorker {
    async fn invoke(
        &self,
        params: &BTreeMap<String, String>,
        deadline: Duration,
    ) -> Result<serde_json::Value, WorkerFailure> {
        let text = render_message(params);
        debug!(url = %self.client.base_url(), text = %text, "Invoking remote agent");

        let result = self
            .client
            .send_task(&text, &self.session_id, deadline)
            .await?;

        match result.status.state {
            A2aTaskState::Completed => {
                let reply = result
                    .status
                    .message
                    .as_ref()
                    .map(crate::protocol::Message::text);
                Ok(serde_json::json!({
                    "state": "completed",
                    "text": reply,
                }))
            }
            A2aTaskState::InputRequired => Err(WorkerFailure::Logical(
                "Agent requires further input".into(),
            )),
            state => Err(WorkerFailure::Logical(format!(
                "Task ended in state {}",
                state.as_str()
            ))),
        }
    }
}

/// Renders a parameter mapping into the outgoing message text.
///
/// A `text` or `query` parameter passes through verbatim; anything else
/// becomes a comma-separated `key=value` listing, which the remote
/// agent's own language layer interprets.
fn render_message(params: &BTreeMap<String, String>) -> String {
    if let Some(text) = params.get("text").or_else(|| params.get("query")) {
        return text.clone();
    }
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_render_passes_query_through() {
        let mut params = BTreeMap::new();
        params.insert("query".to_string(), "latest rust news".to_string());
        assert_eq!(render_message(&params), "latest rust news");
    }

    #[test]
    fn test_render_joins_structured_params() {
        let mut params = BTreeMap::new();
        params.insert("from".to_string(), "USD".to_string());
        params.insert("to".to_string(), "RMB".to_string());
        assert_eq!(render_message(&params), "from=USD, to=RMB");
    }

    #[test]
    fn test_render_prefers_text_over_query() {
        let mut params = BTreeMap::new();
        params.insert("text".to_string(), "verbatim".to_string());
        params.insert("query".to_string(), "ignored".to_string());
        assert_eq!(render_message(&params), "verbatim");
    }
}
