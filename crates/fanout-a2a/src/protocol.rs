//! Wire types for the A2A JSON-RPC protocol.

use serde::{Deserialize, Serialize};

/// Path of the agent card relative to an agent's base URL.
pub const AGENT_CARD_PATH: &str = "/.well-known/agent.json";

/// JSON-RPC method for a synchronous task submission.
pub const METHOD_TASKS_SEND: &str = "tasks/send";

/// Self-description an A2A agent publishes at its well-known path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    /// Human-readable agent name.
    pub name: String,
    /// What the agent does.
    #[serde(default)]
    pub description: Option<String>,
    /// Agent implementation version.
    #[serde(default)]
    pub version: Option<String>,
    /// Base URL the agent serves RPC on, when advertised.
    #[serde(default)]
    pub url: Option<String>,
    /// Protocol feature flags.
    #[serde(default)]
    pub capabilities: AgentCapabilities,
}

/// Protocol feature flags advertised in an [`AgentCard`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCapabilities {
    /// Whether the agent supports streaming responses.
    #[serde(default)]
    pub streaming: bool,
    /// Whether the agent supports push notifications.
    #[serde(default)]
    pub push_notifications: bool,
    /// Whether the agent records state transition history.
    #[serde(default)]
    pub state_transition_history: bool,
}

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    /// Request correlation id.
    pub id: String,
    /// Method name.
    pub method: String,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Creates a request for the given method.
    pub fn new(id: impl Into<String>, method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.into(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// A JSON-RPC 2.0 response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcResponse {
    /// Echo of the request id, if the server included one.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Present on success.
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    /// Present on failure.
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcError {
    /// Numeric error code.
    pub code: i64,
    /// Human-readable message.
    pub message: String,
}

/// Parameters of a `tasks/send` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSendParams {
    /// Task id, chosen by the caller.
    pub id: String,
    /// Session grouping id.
    pub session_id: String,
    /// The user message carrying the request text.
    pub message: Message,
}

/// A message exchanged with an A2A agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// `"user"` or `"agent"`.
    pub role: String,
    /// Ordered content parts.
    pub parts: Vec<Part>,
}

impl Message {
    /// Builds a user message holding one text part.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                kind: "text".to_string(),
                text: text.into(),
            }],
        }
    }

    /// Concatenation of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter(|p| p.kind == "text")
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One content part of a [`Message`]; only text parts are produced here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    /// Part discriminator, `"text"` for text parts.
    #[serde(rename = "type")]
    pub kind: String,
    /// Text content.
    #[serde(default)]
    pub text: String,
}

/// The `result` payload of a `tasks/send` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResult {
    /// Task id, echoed back by the agent.
    #[serde(default)]
    pub id: Option<String>,
    /// Current task status.
    pub status: TaskStatus,
}

/// Status block of a [`TaskResult`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Lifecycle state as reported by the agent.
    pub state: A2aTaskState,
    /// Agent reply attached to the status, if any.
    #[serde(default)]
    pub message: Option<Message>,
}

/// Task lifecycle states defined by the A2A protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum A2aTaskState {
    /// Accepted, not yet started.
    Submitted,
    /// In progress.
    Working,
    /// The agent needs another user turn to proceed.
    InputRequired,
    /// Finished successfully.
    Completed,
    /// Finished unsuccessfully.
    Failed,
    /// Cancelled before completion.
    Canceled,
    /// Any state this client does not recognize.
    #[serde(other)]
    Unknown,
}

impl A2aTaskState {
    /// The wire spelling of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            A2aTaskState::Submitted => "submitted",
            A2aTaskState::Working => "working",
            A2aTaskState::InputRequired => "input-required",
            A2aTaskState::Completed => "completed",
            A2aTaskState::Failed => "failed",
            A2aTaskState::Canceled => "canceled",
            A2aTaskState::Unknown => "unknown",
        }
    }
}
