//! Dispatch, tracking, and aggregation core of the Fanout orchestrator.
//!
//! The [`Manager`] takes the subtask set from the Scheduler, resolves
//! each subtask through the Router, dispatches all of them concurrently,
//! collects results or failures as they arrive, and produces exactly one
//! [`fanout_core::AggregatedResponse`] once every subtask is terminal or
//! the global deadline fires.
//!
//! # Main types
//!
//! - [`Manager`] — `execute(query text) → AggregatedResponse`.
//! - [`ManagerConfig`] — Deadlines and retry policy.
//! - [`ManagerPhase`] — Linear per-query phase machine for observability.

/// Deadline and retry configuration.
pub mod config;
/// The dispatch/tracking/aggregation engine.
pub mod manager;

pub use config::ManagerConfig;
pub use manager::{Manager, ManagerPhase};
