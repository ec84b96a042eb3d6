//! Command-line front end: loads the TOML config, discovers the
//! configured A2A agents, and runs an interactive query loop over the
//! orchestration core.

use clap::{Parser, Subcommand};
use fanout_a2a::{discover, RemoteWorker};
use fanout_core::{HealthState, WorkerEndpoint};
use fanout_manager::{Manager, ManagerConfig};
use fanout_registry::{AgentRegistry, Router};
use fanout_scheduler::{KeywordPlanner, Scheduler};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fanout", about = "Fanout — multi-agent query orchestrator")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "fanout.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive query loop
    Run,
    /// Manage configured agents
    Agents {
        #[command(subcommand)]
        action: AgentAction,
    },
}

#[derive(Subcommand)]
enum AgentAction {
    /// List configured agents and their discovery status
    List,
}

#[derive(Deserialize)]
struct FanoutConfig {
    #[serde(default)]
    manager: ManagerConfig,
    #[serde(default)]
    agents: Vec<AgentConfig>,
    #[serde(default = "default_discovery_timeout_ms")]
    discovery_timeout_ms: u64,
}

#[derive(Deserialize)]
struct AgentConfig {
    name: String,
    url: String,
    capabilities: Vec<String>,
}

fn default_discovery_timeout_ms() -> u64 {
    5_000
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let config_str = tokio::fs::read_to_string(&cli.config).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to read config file '{}': {}",
            cli.config.display(),
            e
        )
    })?;
    let config: FanoutConfig = toml::from_str(&config_str)?;

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Agents { action } => match action {
            AgentAction::List => list_agents(config).await,
        },
    }
}

async fn run(config: FanoutConfig) -> anyhow::Result<()> {
    let registry = Arc::new(AgentRegistry::new());
    bootstrap(&registry, &config).await;

    if registry.is_empty() {
        warn!("No agents registered; every query will fail to resolve");
    }

    let manager = Manager::new(
        Scheduler::new(Arc::new(KeywordPlanner::new())),
        Arc::new(Router::new(Arc::clone(&registry))),
        config.manager,
    );

    info!(agents = registry.len(), "Fanout ready, enter queries (quit/exit to stop)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query.eq_ignore_ascii_case("quit") || query.eq_ignore_ascii_case("exit") {
            break;
        }

        let response = manager.execute(query).await;
        let rendered = serde_json::to_string_pretty(&response)?;
        stdout.write_all(rendered.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }

    Ok(())
}

/// Registers every configured agent, probing its card first.
///
/// A failed card fetch is not fatal: the endpoint is still registered
/// with `Unknown` health so the Router can try it once traffic arrives.
async fn bootstrap(registry: &AgentRegistry, config: &FanoutConfig) {
    let deadline = Duration::from_millis(config.discovery_timeout_ms);
    for agent in &config.agents {
        let endpoint = WorkerEndpoint::new(
            agent.name.clone(),
            agent.url.clone(),
            agent.capabilities.clone(),
        );
        registry.register(endpoint, Arc::new(RemoteWorker::new(agent.url.clone())));

        match discover(&agent.url, deadline).await {
            Ok(card) => {
                info!(
                    agent = %agent.name,
                    card_name = %card.name,
                    description = card.description.as_deref().unwrap_or(""),
                    "Agent discovered"
                );
                registry.set_health(&agent.url, HealthState::Healthy);
            }
            Err(err) => {
                warn!(
                    agent = %agent.name,
                    url = %agent.url,
                    error = %err,
                    "Agent card fetch failed, registering with unknown health"
                );
            }
        }
    }
}

async fn list_agents(config: FanoutConfig) -> anyhow::Result<()> {
    if config.agents.is_empty() {
        println!("No agents configured.");
        println!("Configure agents in fanout.toml under [[agents]]");
        return Ok(());
    }

    let deadline = Duration::from_millis(config.discovery_timeout_ms);
    println!("Configured agents:");
    for agent in &config.agents {
        let status = match discover(&agent.url, deadline).await {
            Ok(card) => format!(
                "up ({} {})",
                card.name,
                card.version.as_deref().unwrap_or("?")
            ),
            Err(err) => format!("unreachable: {err}"),
        };
        println!(
            "  {} @ {} [{}] - {}",
            agent.name,
            agent.url,
            agent.capabilities.join(", "),
            status
        );
    }
    println!("\nTotal: {} agent(s)", config.agents.len());

    Ok(())
}
