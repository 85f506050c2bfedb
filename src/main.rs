//! Launcher for the mesh ingress server.
//!
//! Loads configuration, wires observability, registers the built-in
//! heartbeat processor and runs until interrupted. Real deployments embed
//! [`HttpIngressServer`] in the broker runtime and register the full
//! processor set before starting.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use clap::Parser;
use serde_json::{Map, Value};

use mesh_ingress::config::{load_config, IngressConfig};
use mesh_ingress::observability::logging::init_logging;
use mesh_ingress::observability::metrics::init_metrics;
use mesh_ingress::{
    AsyncContext, ChannelContext, CodeCommand, CodeProcessor, HttpIngressServer, ProcessorError,
    RequestCode, RetCode, WorkerPool,
};

#[derive(Parser, Debug)]
#[command(name = "mesh-ingress", about = "HTTP ingress front-end for the event mesh")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Minimal liveness responder on the heartbeat request code.
struct HeartbeatProcessor;

#[async_trait]
impl CodeProcessor for HeartbeatProcessor {
    async fn process_request(
        &self,
        _channel: ChannelContext,
        context: Arc<AsyncContext<CodeCommand>>,
    ) -> Result<(), ProcessorError> {
        let mut payload = Map::new();
        payload.insert("alive".into(), Value::from(true));
        context.on_complete(
            context
                .request()
                .create_response_with_payload(RetCode::Success, payload),
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => IngressConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        idle_timeout_secs = config.listener.idle_timeout_secs,
        tls = config.tls_enabled(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpIngressServer::new(config);
    server.register_code_processor(
        RequestCode::Heartbeat.value(),
        Arc::new(HeartbeatProcessor),
        WorkerPool::new("heartbeat", 2, 64),
    )?;

    server.start().await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    server.shutdown().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
