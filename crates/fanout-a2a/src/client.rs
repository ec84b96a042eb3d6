use crate::protocol::{
    AgentCard, JsonRpcRequest, JsonRpcResponse, Message, TaskResult, TaskSendParams,
    AGENT_CARD_PATH, METHOD_TASKS_SEND,
};
use fanout_core::WorkerFailure;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// HTTP client for one A2A agent endpoint.
///
/// Holds the agent's base URL and a shared connection pool. Card
/// discovery hits the well-known path; task submission posts JSON-RPC to
/// the base URL. Every call takes an explicit deadline applied as the
/// request timeout.
#[derive(Debug, Clone)]
pub struct A2aClient {
    http: reqwest::Client,
    base_url: String,
}

impl A2aClient {
    /// Creates a client for the agent at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The agent base URL this client targets.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetches the agent card from the well-known path.
    pub async fn fetch_card(&self, deadline: Duration) -> Result<AgentCard, WorkerFailure> {
        let url = format!("{}{AGENT_CARD_PATH}", self.base_url);
        debug!(url = %url, "Fetching agent card");

        let response = self
            .http
            .get(&url)
            .timeout(deadline)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response)?;

        response
            .json::<AgentCard>()
            .await
            .map_err(|e| WorkerFailure::Logical(format!("Malformed agent card: {e}")))
    }

    /// Submits one task synchronously via JSON-RPC `tasks/send`.
    ///
    /// A JSON-RPC `error` object comes back as a `Logical` failure; the
    /// caller is responsible for interpreting the returned task state.
    pub async fn send_task(
        &self,
        text: &str,
        session_id: &str,
        deadline: Duration,
    ) -> Result<TaskResult, WorkerFailure> {
        let task_id = Uuid::new_v4().to_string();
        let params = TaskSendParams {
            id: task_id.clone(),
            session_id: session_id.to_string(),
            message: Message::user_text(text),
        };
        let params = serde_json::to_value(&params)
            .map_err(|e| WorkerFailure::Logical(format!("Failed to serialize params: {e}")))?;
        let request = JsonRpcRequest::new(task_id, METHOD_TASKS_SEND, params);

        debug!(url = %self.base_url, "Sending tasks/send request");
        let response = self
            .http
            .post(&self.base_url)
            .timeout(deadline)
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;
        let response = check_status(response)?;

        let envelope = response
            .json::<JsonRpcResponse>()
            .await
            .map_err(|e| WorkerFailure::Logical(format!("Malformed JSON-RPC response: {e}")))?;

        if let Some(err) = envelope.error {
            return Err(WorkerFailure::Logical(format!(
                "Agent error {}: {}",
                err.code, err.message
            )));
        }

        let result = envelope
            .result
            .ok_or_else(|| WorkerFailure::Logical("Empty JSON-RPC result".into()))?;
        serde_json::from_value(result)
            .map_err(|e| WorkerFailure::Logical(format!("Malformed task result: {e}")))
    }
}

/// Fetches the agent card for the agent at `base_url`.
///
/// Convenience for registry bootstrap, where no client is kept around.
pub async fn discover(base_url: &str, deadline: Duration) -> Result<AgentCard, WorkerFailure> {
    A2aClient::new(base_url).fetch_card(deadline).await
}

fn map_transport(err: reqwest::Error) -> WorkerFailure {
    if err.is_timeout() {
        WorkerFailure::Timeout
    } else {
        WorkerFailure::Connection(err.to_string())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, WorkerFailure> {
    let status = response.status();
    if status.is_server_error() {
        // The agent process is up but failing; counts against its health.
        Err(WorkerFailure::Connection(format!(
            "HTTP {status} from {}",
            response.url()
        )))
    } else if !status.is_success() {
        Err(WorkerFailure::Logical(format!(
            "HTTP {status} from {}",
            response.url()
        )))
    } else {
        Ok(response)
    }
}
