//! End-to-end orchestration test.
//!
//! Wires the real pipeline (keyword planner, registry, router, manager)
//! against in-process mock workers and verifies the fan-out/fan-in
//! behavior from the caller's point of view: ordering, overall status
//! classification, round-robin load spreading, and bounded latency.

use async_trait::async_trait;
use fanout_core::{
    HealthState, OverallStatus, TaskState, Worker, WorkerEndpoint, WorkerFailure,
};
use fanout_manager::{Manager, ManagerConfig};
use fanout_registry::{AgentRegistry, Router};
use fanout_scheduler::{KeywordPlanner, Scheduler};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Mock workers: deterministic stand-ins for the remote tool agents
// ---------------------------------------------------------------------------

/// Answers any weather query with a canned report, echoing the city.
struct WeatherWorker {
    calls: AtomicU32,
}

#[async_trait]
impl Worker for WeatherWorker {
    async fn invoke(
        &self,
        params: &BTreeMap<String, String>,
        _deadline: Duration,
    ) -> Result<serde_json::Value, WorkerFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let city = params
            .get("city")
            .cloned()
            .ok_or_else(|| WorkerFailure::Logical("missing city parameter".into()))?;
        Ok(serde_json::json!({ "city": city, "conditions": "sunny", "temp_c": 21 }))
    }
}

/// Answers fx queries with a fixed rate for the requested pair.
struct FxWorker;

#[async_trait]
impl Worker for FxWorker {
    async fn invoke(
        &self,
        params: &BTreeMap<String, String>,
        _deadline: Duration,
    ) -> Result<serde_json::Value, WorkerFailure> {
        let from = params.get("from").cloned().unwrap_or_default();
        let to = params.get("to").cloned().unwrap_or_default();
        if from.is_empty() || to.is_empty() {
            return Err(WorkerFailure::Logical("missing currency pair".into()));
        }
        Ok(serde_json::json!({ "from": from, "to": to, "rate": 7.11 }))
    }
}

/// Never responds within any reasonable deadline.
struct HangingWorker;

#[async_trait]
impl Worker for HangingWorker {
    async fn invoke(
        &self,
        _params: &BTreeMap<String, String>,
        _deadline: Duration,
    ) -> Result<serde_json::Value, WorkerFailure> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(serde_json::Value::Null)
    }
}

fn build_manager(registry: Arc<AgentRegistry>, config: ManagerConfig) -> Manager {
    Manager::new(
        Scheduler::new(Arc::new(KeywordPlanner::new())),
        Arc::new(Router::new(registry)),
        config,
    )
}

fn test_config() -> ManagerConfig {
    ManagerConfig {
        default_subtask_timeout_ms: 500,
        global_deadline_ms: 2_000,
        retry_transient: true,
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test]
async fn weather_and_fx_complete() {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(
        WorkerEndpoint::new("Weather Agent", "mock://weather", vec!["weather".into()]),
        Arc::new(WeatherWorker {
            calls: AtomicU32::new(0),
        }),
    );
    registry.register(
        WorkerEndpoint::new("Currency Agent", "mock://fx", vec!["fx".into()]),
        Arc::new(FxWorker),
    );

    let manager = build_manager(Arc::clone(&registry), test_config());
    let response = manager.execute("weather in Beijing and USD to RMB rate").await;

    assert_eq!(response.overall, OverallStatus::Complete);
    assert_eq!(response.subtasks.len(), 2);

    // Order matches decomposition order regardless of completion order.
    assert_eq!(response.subtasks[0].capability, "weather");
    assert_eq!(response.subtasks[1].capability, "fx");

    let weather = response.subtasks[0].payload.as_ref().expect("weather payload");
    assert_eq!(weather["city"], "Beijing");
    let fx = response.subtasks[1].payload.as_ref().expect("fx payload");
    assert_eq!(fx["from"], "USD");
    assert_eq!(fx["to"], "RMB");

    // Successful dispatches restored both endpoints to Healthy.
    let endpoints = registry.endpoints();
    assert!(endpoints.iter().all(|e| e.health == HealthState::Healthy));
}

#[tokio::test]
async fn missing_fx_endpoint_yields_partial() {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(
        WorkerEndpoint::new("Weather Agent", "mock://weather", vec!["weather".into()]),
        Arc::new(WeatherWorker {
            calls: AtomicU32::new(0),
        }),
    );

    let manager = build_manager(registry, test_config());
    let response = manager.execute("weather in Beijing and USD to RMB rate").await;

    assert_eq!(response.overall, OverallStatus::Partial);
    assert_eq!(response.subtasks[0].state, TaskState::Succeeded);
    assert_eq!(response.subtasks[1].state, TaskState::Failed);
    assert!(response.subtasks[1]
        .error
        .as_ref()
        .expect("fx error")
        .contains("No capable worker for capability 'fx'"));
}

#[tokio::test]
async fn round_robin_spreads_same_capability_subtasks() {
    let registry = Arc::new(AgentRegistry::new());
    let first = Arc::new(WeatherWorker {
        calls: AtomicU32::new(0),
    });
    let second = Arc::new(WeatherWorker {
        calls: AtomicU32::new(0),
    });
    registry.register(
        WorkerEndpoint::new("Weather A", "mock://weather-a", vec!["weather".into()]),
        Arc::clone(&first) as Arc<dyn Worker>,
    );
    registry.register(
        WorkerEndpoint::new("Weather B", "mock://weather-b", vec!["weather".into()]),
        Arc::clone(&second) as Arc<dyn Worker>,
    );

    let manager = build_manager(registry, test_config());
    let response = manager
        .execute("weather in Beijing, weather in Shanghai")
        .await;

    assert_eq!(response.overall, OverallStatus::Complete);
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn hanging_worker_is_bounded_by_global_deadline() {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(
        WorkerEndpoint::new("Weather Agent", "mock://weather", vec!["weather".into()]),
        Arc::new(WeatherWorker {
            calls: AtomicU32::new(0),
        }),
    );
    registry.register(
        WorkerEndpoint::new("Search Agent", "mock://search", vec!["search".into()]),
        Arc::new(HangingWorker),
    );

    let config = ManagerConfig {
        default_subtask_timeout_ms: 10_000,
        global_deadline_ms: 300,
        retry_transient: false,
    };
    let manager = build_manager(registry, config);

    let start = Instant::now();
    let response = manager
        .execute("weather in Oslo and every unanswerable question")
        .await;
    let elapsed = start.elapsed();

    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
    assert_eq!(response.overall, OverallStatus::Partial);
    assert_eq!(response.subtasks[0].state, TaskState::Succeeded);
    assert_eq!(response.subtasks[1].state, TaskState::TimedOut);
}

#[tokio::test]
async fn response_round_trips_as_json() {
    let registry = Arc::new(AgentRegistry::new());
    registry.register(
        WorkerEndpoint::new("Currency Agent", "mock://fx", vec!["fx".into()]),
        Arc::new(FxWorker),
    );

    let manager = build_manager(registry, test_config());
    let response = manager.execute("EUR to USD").await;

    let json = serde_json::to_string_pretty(&response).expect("serialize response");
    let parsed: fanout_core::AggregatedResponse =
        serde_json::from_str(&json).expect("parse response");
    assert_eq!(parsed.query_id, response.query_id);
    assert_eq!(parsed.overall, OverallStatus::Complete);
    assert_eq!(parsed.subtasks.len(), 1);
}
