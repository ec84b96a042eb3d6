//! Agent registry and capability router for the Fanout orchestrator.
//!
//! The [`AgentRegistry`] maps capability tags to registered worker
//! endpoints and owns the only mutable shared state in the core: the
//! per-endpoint health map. The [`Router`] resolves a subtask's required
//! capability to one concrete, dispatchable worker using a configurable
//! selection policy and feeds observed dispatch outcomes back into the
//! health map.
//!
//! # Main types
//!
//! - [`AgentRegistry`] — Register/deregister/health admin surface.
//! - [`Router`] — `resolve(capability)` with round-robin or first-healthy
//!   selection.
//! - [`ResolvedWorker`] — An endpoint snapshot plus its invocation handle.
//! - [`SelectionPolicy`] — How to choose among multiple healthy endpoints.

/// Endpoint registration and the shared health map.
pub mod registry;
/// Capability resolution and selection policies.
pub mod router;

pub use registry::AgentRegistry;
pub use router::{ResolvedWorker, Router, SelectionPolicy};
