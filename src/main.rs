//! Lead Engine - Vehicle Health & Lead Orchestration
//!
//! Runs the HTTP API, the telemetry monitor, the lead sync poller and,
//! optionally, a simulated fleet under one supervisor.
//!
//! # Usage
//!
//! ```bash
//! # API + monitor with in-memory stores
//! cargo run --release
//!
//! # Same, with 25 simulated vehicles ticking every 500 ms
//! cargo run --release -- --simulate 25 --tick-ms 500
//! ```
//!
//! # Environment Variables
//!
//! - `LEAD_ENGINE_CONFIG`: path to the TOML config (default: ./engine_config.toml)
//! - `LEAD_ENGINE_ADDR`: server address override
//! - `LEAD_ENGINE_CORS_ORIGINS`: comma-separated allowed origins
//! - `LEAD_ENGINE_LOG_FORMAT`: `json` for structured log lines
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use lead_engine::acquisition::{FleetSimulator, Scenario};
use lead_engine::api::{create_app, AppState};
use lead_engine::config::{defaults, EngineConfig};
use lead_engine::llm::{HttpDrafter, TemplateDrafter, TextGenerator};
use lead_engine::notify::{LogSink, NotificationDispatcher, NotificationSink, WebhookSink};
use lead_engine::pipeline::run_lead_sync;
use lead_engine::storage::{InMemoryLeadStore, InMemoryTelemetryStore, InMemoryVault};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "lead-engine")]
#[command(about = "Vehicle Health & Lead Orchestration Engine")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default from config: "0.0.0.0:8080")
    #[arg(short, long, env = "LEAD_ENGINE_ADDR")]
    addr: Option<String>,

    /// Path to the engine TOML config
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a simulated fleet of N vehicles writing into the telemetry store
    #[arg(long, value_name = "N")]
    simulate: Option<usize>,

    /// Simulator tick interval in milliseconds
    #[arg(long, default_value_t = defaults::SIMULATION_TICK_MS)]
    tick_ms: u64,

    /// Fault to drift the simulated fleet into: normal, overheat, battery-drain, fuel-leak
    #[arg(long, default_value = "normal")]
    scenario: Scenario,
}

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy)]
enum TaskName {
    HttpServer,
    TelemetryMonitor,
    LeadSync,
    Simulator,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::HttpServer => write!(f, "HttpServer"),
            TaskName::TelemetryMonitor => write!(f, "TelemetryMonitor"),
            TaskName::LeadSync => write!(f, "LeadSync"),
            TaskName::Simulator => write!(f, "Simulator"),
        }
    }
}

// ============================================================================
// Engine Assembly
// ============================================================================

fn load_config(path: Option<&PathBuf>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => EngineConfig::load(),
    };
    config.validate().context("Invalid engine configuration")?;
    Ok(config)
}

fn build_generator(config: &EngineConfig) -> Result<Arc<dyn TextGenerator>> {
    match &config.orchestration.generation_endpoint {
        Some(endpoint) => {
            let timeout = Duration::from_millis(config.orchestration.generation_timeout_ms);
            let drafter = HttpDrafter::new(endpoint, timeout).context("Failed to build HTTP drafter")?;
            info!(endpoint = %endpoint, "Drafts: remote generator");
            Ok(Arc::new(drafter))
        }
        None => {
            info!("Drafts: strategy templates");
            Ok(Arc::new(TemplateDrafter))
        }
    }
}

fn build_dispatcher(config: &EngineConfig) -> Result<NotificationDispatcher> {
    let mut sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(LogSink)];
    if let Some(url) = &config.notifications.webhook_url {
        let timeout = Duration::from_secs(config.notifications.webhook_timeout_secs);
        let webhook = WebhookSink::new(url, timeout).context("Failed to build webhook sink")?;
        info!(url = %url, "Notifications: webhook enabled");
        sinks.push(Arc::new(webhook));
    }
    Ok(NotificationDispatcher::new(sinks))
}

// ============================================================================
// Task Spawning
// ============================================================================

/// Spawn the HTTP server task into the JoinSet.
fn spawn_http_server(
    task_set: &mut JoinSet<Result<TaskName>>,
    listener: tokio::net::TcpListener,
    app: Router,
    cancel_token: CancellationToken,
) {
    task_set.spawn(async move {
        info!("[HttpServer] Task starting");

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel_token.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await;

        match result {
            Ok(()) => {
                info!("[HttpServer] Graceful shutdown complete");
                Ok(TaskName::HttpServer)
            }
            Err(e) => {
                error!("[HttpServer] Server error: {}", e);
                Err(anyhow::anyhow!("HTTP server error: {}", e))
            }
        }
    });
}

/// Run the supervisor loop: monitor tasks, cancel on failure.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("Supervisor: all tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("Supervisor: shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("Supervisor: task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("Supervisor: task failed with error: {}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("Supervisor: task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("Supervisor: all tasks completed");
                        break;
                    }
                }
            }
        }
    }

    // Let the remaining tasks observe cancellation and drain
    while let Some(result) = task_set.join_next().await {
        if let Ok(Ok(task_name)) = result {
            info!("Supervisor: task {} stopped", task_name);
        }
    }
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {e}");
        }
    }

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if std::env::var("LEAD_ENGINE_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }

    let args = CliArgs::parse();
    let mut config = load_config(args.config.as_ref())?;
    if let Some(addr) = &args.addr {
        config.server.addr = addr.clone();
    }

    info!("Lead Engine starting");
    info!(dealership = %config.engine.dealership, tenant = %config.engine.tenant_id, "Engine identity");

    let telemetry_store = Arc::new(InMemoryTelemetryStore::new());
    let generator = build_generator(&config)?;
    let dispatcher = Arc::new(build_dispatcher(&config)?);
    let state = AppState::new(
        config.clone(),
        telemetry_store.clone(),
        Arc::new(InMemoryLeadStore::new()),
        Arc::new(InMemoryVault::new()),
        generator,
        dispatcher,
    );

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    info!(addr = %config.server.addr, "HTTP server listening");

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();
    spawn_http_server(&mut task_set, listener, create_app(state.clone()), cancel_token.clone());

    let monitor = Arc::clone(&state.monitor);
    let poll = Duration::from_millis(config.sync.telemetry_poll_interval_ms);
    let monitor_cancel = cancel_token.clone();
    task_set.spawn(async move {
        monitor.run(poll, monitor_cancel).await;
        Ok(TaskName::TelemetryMonitor)
    });

    let pipeline = Arc::clone(&state.leads);
    let tenant = config.engine.tenant_id.clone();
    let lead_poll = Duration::from_millis(config.sync.lead_poll_interval_ms);
    let sync_cancel = cancel_token.clone();
    task_set.spawn(async move {
        run_lead_sync(pipeline, tenant, lead_poll, sync_cancel).await;
        Ok(TaskName::LeadSync)
    });

    match args.simulate {
        Some(0) => warn!("--simulate 0 requested, simulator not started"),
        Some(vehicles) => {
            let simulator = FleetSimulator::new(vehicles, args.scenario, None);
            let tick = Duration::from_millis(args.tick_ms.max(1));
            let sim_cancel = cancel_token.clone();
            task_set.spawn(async move {
                simulator.run(telemetry_store, tick, sim_cancel).await;
                Ok(TaskName::Simulator)
            });
        }
        None => {}
    }

    run_supervisor(&mut task_set, cancel_token).await?;
    info!("Lead Engine stopped");
    Ok(())
}
