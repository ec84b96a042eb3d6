use fanout_core::{HealthState, Worker, WorkerEndpoint};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

/// A registered endpoint together with its invocation handle.
struct Entry {
    endpoint: WorkerEndpoint,
    worker: Arc<dyn Worker>,
}

/// Central registry mapping capability tags to worker endpoints.
///
/// Registration order is preserved; the round-robin selection policy in
/// the Router depends on it. The health map inside is the only mutable
/// state shared across concurrent subtask dispatches, so every access
/// goes through a short-lived sync lock that is never held across an
/// await point.
pub struct AgentRegistry {
    entries: RwLock<Vec<Entry>>,
}

impl AgentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Registers an endpoint with its worker handle.
    ///
    /// Idempotent on the endpoint address: registering the same address
    /// twice is a no-op and keeps the original entry (and its health).
    pub fn register(&self, endpoint: WorkerEndpoint, worker: Arc<dyn Worker>) {
        let mut entries = self.entries.write();
        if entries.iter().any(|e| e.endpoint.address == endpoint.address) {
            warn!(address = %endpoint.address, "Endpoint already registered, ignoring");
            return;
        }
        info!(
            name = %endpoint.name,
            address = %endpoint.address,
            capabilities = ?endpoint.capabilities,
            "Registered worker endpoint"
        );
        entries.push(Entry { endpoint, worker });
    }

    /// Removes the endpoint with the given address.
    ///
    /// Returns `true` if an entry was removed. In-flight dispatches that
    /// already resolved this endpoint keep their own handle and are not
    /// affected.
    pub fn deregister(&self, address: &str) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.endpoint.address != address);
        let removed = entries.len() < before;
        if removed {
            info!(address = %address, "Deregistered worker endpoint");
        }
        removed
    }

    /// Sets the health state of the endpoint with the given address.
    ///
    /// Returns `false` if no such endpoint is registered.
    pub fn set_health(&self, address: &str, health: HealthState) -> bool {
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|e| e.endpoint.address == address) {
            Some(entry) => {
                if entry.endpoint.health != health {
                    info!(address = %address, health = ?health, "Endpoint health changed");
                }
                entry.endpoint.health = health;
                true
            }
            None => false,
        }
    }

    /// Snapshot of all registered endpoints, in registration order.
    pub fn endpoints(&self) -> Vec<WorkerEndpoint> {
        self.entries
            .read()
            .iter()
            .map(|e| e.endpoint.clone())
            .collect()
    }

    /// Snapshot of the endpoints serving a capability, in registration
    /// order, paired with their worker handles.
    pub fn candidates_for(&self, capability: &str) -> Vec<(WorkerEndpoint, Arc<dyn Worker>)> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.endpoint.supports(capability))
            .map(|e| (e.endpoint.clone(), Arc::clone(&e.worker)))
            .collect()
    }

    /// Number of registered endpoints.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the registry holds no endpoints.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use fanout_core::WorkerFailure;
    use std::collections::BTreeMap;
    use std::time::Duration;

    struct NullWorker;

    #[async_trait]
    impl Worker for NullWorker {
        async fn invoke(
            &self,
            _params: &BTreeMap<String, String>,
            _deadline: Duration,
        ) -> Result<serde_json::Value, WorkerFailure> {
            Ok(serde_json::Value::Null)
        }
    }

    fn endpoint(name: &str, address: &str, capability: &str) -> WorkerEndpoint {
        WorkerEndpoint::new(name, address, vec![capability.to_string()])
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = AgentRegistry::new();
        registry.register(
            endpoint("Weather Agent", "http://localhost:8001", "weather"),
            Arc::new(NullWorker),
        );

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.candidates_for("weather").len(), 1);
        assert!(registry.candidates_for("fx").is_empty());
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = AgentRegistry::new();
        registry.register(
            endpoint("Weather Agent", "http://localhost:8001", "weather"),
            Arc::new(NullWorker),
        );
        registry.set_health("http://localhost:8001", HealthState::Healthy);

        // Same address again: no-op, original health kept.
        registry.register(
            endpoint("Weather Agent v2", "http://localhost:8001", "weather"),
            Arc::new(NullWorker),
        );

        assert_eq!(registry.len(), 1);
        let endpoints = registry.endpoints();
        assert_eq!(endpoints[0].name, "Weather Agent");
        assert_eq!(endpoints[0].health, HealthState::Healthy);
    }

    #[test]
    fn test_deregister() {
        let registry = AgentRegistry::new();
        registry.register(
            endpoint("Weather Agent", "http://localhost:8001", "weather"),
            Arc::new(NullWorker),
        );

        assert!(registry.deregister("http://localhost:8001"));
        assert!(!registry.deregister("http://localhost:8001"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_set_health_unknown_address() {
        let registry = AgentRegistry::new();
        assert!(!registry.set_health("http://nowhere", HealthState::Healthy));
    }

    #[test]
    fn test_registration_order_preserved() {
        let registry = AgentRegistry::new();
        registry.register(
            endpoint("A", "http://a", "fx"),
            Arc::new(NullWorker),
        );
        registry.register(
            endpoint("B", "http://b", "fx"),
            Arc::new(NullWorker),
        );
        registry.register(
            endpoint("C", "http://c", "fx"),
            Arc::new(NullWorker),
        );

        let names: Vec<String> = registry
            .candidates_for("fx")
            .into_iter()
            .map(|(e, _)| e.name)
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
