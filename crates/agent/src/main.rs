//! Telemetry Agent - node and container metrics shipper
//!
//! This binary runs as a DaemonSet on each Kubernetes node, collecting
//! host and container runtime metrics and streaming them to the relay.

use agent_lib::{
    collector::{
        discover_runtime_socket, CollectionLoopBuilder, CriClient, HostCollector, Orchestrator,
        DEFAULT_SOCKET_CANDIDATES,
    },
    health::HealthRegistry,
    models::SandboxState,
    observability::{AgentMetrics, StructuredLogger},
    sync::{capacity_for, DeliveryConfig, DeliveryLoop, RelayClient, RelayConfig, SharedBacklog},
};
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use telemetry_agent::{
    api,
    config::{AgentConfig, Cli},
    logging,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AgentConfig::load(&cli)?;

    let _log_guard = logging::init(&config.log)?;
    info!(
        log_level = %config.log.level,
        log_file = ?config.log.file,
        "Starting telemetry-agent"
    );
    info!(
        node_name = %config.node_name,
        interval_secs = config.main_loop_duration,
        retention_mins = config.buffer_retention,
        "Agent configured"
    );

    // Initialize health registry
    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let metrics = AgentMetrics::new();
    let logger = StructuredLogger::new(&config.node_name);

    // A missing socket is not fatal; the runtime may come up later
    let runtime_endpoint = match &config.runtime_endpoint {
        Some(endpoint) => endpoint.clone(),
        None => match discover_runtime_socket(DEFAULT_SOCKET_CANDIDATES) {
            Ok(path) => path.display().to_string(),
            Err(e) => {
                warn!(error = %e, "Falling back to the default runtime socket");
                DEFAULT_SOCKET_CANDIDATES[0].to_string()
            }
        },
    };
    let runtime = CriClient::connect(&runtime_endpoint)?;

    let relay = RelayClient::new(RelayConfig {
        endpoint: config.relay_address().to_string(),
        ..Default::default()
    })?;
    logger.log_startup(AGENT_VERSION, relay.endpoint(), &runtime_endpoint);

    let sandbox_filter = if config.all_sandboxes {
        None
    } else {
        Some(SandboxState::Ready)
    };
    let orchestrator = Orchestrator::new(Arc::new(runtime), Arc::new(HostCollector::new()))
        .with_top_n(config.top_n)
        .with_sandbox_filter(sandbox_filter);

    let backlog = SharedBacklog::new(capacity_for(config.retention(), config.interval()));
    metrics.set_backlog(0, backlog.capacity() as i64);
    info!(capacity = backlog.capacity(), "Backlog sized");

    let collection_loop = CollectionLoopBuilder::new()
        .orchestrator(orchestrator)
        .backlog(backlog.clone())
        .interval(config.interval())
        .source_timeout(config.source_timeout())
        .logger(logger.clone())
        .health(health_registry.clone())
        .build()?;

    let delivery_loop = DeliveryLoop::new(
        relay,
        backlog.clone(),
        DeliveryConfig {
            interval: config.interval(),
            ..Default::default()
        },
    )
    .with_logger(logger.clone())
    .with_health(health_registry.clone());

    let cancel = CancellationToken::new();

    // Start health and metrics server
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), metrics.clone()));
    let api_handle = tokio::spawn(api::serve(config.api_port, app_state, cancel.clone()));

    let collection_handle = tokio::spawn(collection_loop.run(cancel.clone()));
    let delivery_handle = tokio::spawn(delivery_loop.run(cancel.clone()));

    // Mark agent as ready after wiring
    health_registry.set_ready(true).await;

    let reason = shutdown_signal().await;
    logger.log_shutdown(reason);
    health_registry.set_ready(false).await;
    cancel.cancel();

    let (collection, delivery) = tokio::join!(collection_handle, delivery_handle);
    for (task, result) in [("collection", collection), ("delivery", delivery)] {
        if let Err(e) = result {
            error!(task = task, error = %e, "Loop task failed");
        }
    }

    match api_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "API server failed"),
        Err(e) => error!(error = %e, "API server task failed"),
    }

    info!(backlog_len = backlog.len(), "Shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT received",
        _ = terminate => "SIGTERM received",
    }
}
