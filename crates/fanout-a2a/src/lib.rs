//! A2A protocol adapter for the Fanout orchestrator.
//!
//! Connects the orchestration core to remote agents speaking the A2A
//! JSON-RPC protocol: agent-card discovery at the well-known path, and
//! synchronous task submission via `tasks/send`. The [`RemoteWorker`]
//! implements the core [`fanout_core::Worker`] contract so remote agents
//! plug into the registry like any in-process worker.
//!
//! # Main types
//!
//! - [`A2aClient`] — HTTP/JSON-RPC client for one agent endpoint.
//! - [`RemoteWorker`] — `Worker` implementation over an `A2aClient`.
//! - [`AgentCard`] — The agent's self-description, fetched at bootstrap.

/// The HTTP/JSON-RPC client.
pub mod client;
/// Wire types for the A2A protocol.
pub mod protocol;
/// The `Worker` adapter over the client.
pub mod worker;

pub use client::{discover, A2aClient};
pub use protocol::{A2aTaskState, AgentCapabilities, AgentCard, TaskResult};
pub use worker::RemoteWorker;
