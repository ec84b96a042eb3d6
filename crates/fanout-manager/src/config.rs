use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deadline and retry configuration for the [`crate::Manager`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Per-subtask timeout in milliseconds, applied when a subtask does
    /// not carry its own.
    #[serde(default = "default_subtask_timeout_ms")]
    pub default_subtask_timeout_ms: u64,

    /// Upper bound in milliseconds on one whole `execute` call. When it
    /// elapses, every non-terminal subtask is forced to `TimedOut` and
    /// aggregation proceeds immediately.
    #[serde(default = "default_global_deadline_ms")]
    pub global_deadline_ms: u64,

    /// Whether a subtask whose first attempt failed with a transient
    /// resolution/connection error gets a single extra attempt.
    #[serde(default = "default_retry_transient")]
    pub retry_transient: bool,
}

fn default_subtask_timeout_ms() -> u64 {
    10_000
}

fn default_global_deadline_ms() -> u64 {
    30_000
}

fn default_retry_transient() -> bool {
    true
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_subtask_timeout_ms: default_subtask_timeout_ms(),
            global_deadline_ms: default_global_deadline_ms(),
            retry_transient: default_retry_transient(),
        }
    }
}

impl ManagerConfig {
    /// The default per-subtask timeout as a [`Duration`].
    pub fn default_subtask_timeout(&self) -> Duration {
        Duration::from_millis(self.default_subtask_timeout_ms)
    }

    /// The global per-query deadline as a [`Duration`].
    pub fn global_deadline(&self) -> Duration {
        Duration::from_millis(self.global_deadline_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ManagerConfig::default();
        assert_eq!(config.default_subtask_timeout(), Duration::from_secs(10));
        assert_eq!(config.global_deadline(), Duration::from_secs(30));
        assert!(config.retry_transient);
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: ManagerConfig =
            toml_like_from_json(r#"{"global_deadline_ms": 5000}"#);
        assert_eq!(config.global_deadline(), Duration::from_secs(5));
        assert_eq!(config.default_subtask_timeout(), Duration::from_secs(10));
    }

    fn toml_like_from_json(raw: &str) -> ManagerConfig {
        serde_json::from_str(raw).unwrap()
    }
}
