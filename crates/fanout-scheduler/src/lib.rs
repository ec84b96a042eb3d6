//! Query decomposition for the Fanout orchestrator.
//!
//! The [`Scheduler`] consumes a raw user query and produces an ordered
//! set of independent, capability-tagged subtasks. The actual
//! language-understanding logic lives behind the
//! [`DecompositionBackend`] seam so it can be an LLM planner, a remote
//! service, or the bundled deterministic [`KeywordPlanner`].
//!
//! # Main types
//!
//! - [`Scheduler`] — `decompose(query) → Vec<Subtask>`.
//! - [`DecompositionBackend`] — Black-box seam returning `(capability,
//!   params)` pairs.
//! - [`KeywordPlanner`] — Rule-based backend for weather / fx / search
//!   queries.

/// The pluggable decomposition backend seam.
pub mod backend;
/// Deterministic rule-based decomposition backend.
pub mod keyword;
/// The scheduler wrapping a backend.
pub mod scheduler;

pub use backend::{DecompositionBackend, TaskSpec};
pub use keyword::KeywordPlanner;
pub use scheduler::Scheduler;
