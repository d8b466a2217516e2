//! # worm-gateway
//!
//! Wormgate server binary — wires settings, the mode-selected deployment,
//! and the RPC registry together and starts the HTTP/WebSocket server.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use worm_server::WormServer;
use worm_server::metrics::install_recorder;
use worm_server::rpc::context::RpcContext;
use worm_server::rpc::handlers;
use worm_server::rpc::registry::MethodRegistry;
use worm_settings::{DeploymentMode, WormgateSettings, loader};
use worm_snapshot::Deployment;

/// Wormgate server.
#[derive(Parser, Debug)]
#[command(name = "worm-gateway", about = "WORM account gateway server")]
struct Cli {
    /// Host to bind (overrides settings if specified).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (overrides settings if specified, 0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Deployment mode: `ledger` or `tool` (overrides settings).
    #[arg(long)]
    mode: Option<String>,

    /// Path to the settings file (defaults to `~/.wormgate/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// Resolve settings from file, environment, and CLI flags, in that order.
fn resolve_settings(args: &Cli) -> Result<WormgateSettings> {
    let path = args
        .settings
        .clone()
        .unwrap_or_else(loader::settings_path);
    // Env overrides are applied by the loader; CLI flags win over both.
    let mut settings = loader::load_settings_from_path(&path)
        .with_context(|| format!("Failed to load settings from {}", path.display()))?;

    if let Some(ref host) = args.host {
        settings.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    if let Some(ref mode) = args.mode {
        settings.mode = loader::parse_mode(mode)
            .with_context(|| format!("Invalid mode '{mode}' (expected 'ledger' or 'tool')"))?;
    }
    Ok(settings)
}

/// Build the mode-selected deployment.
fn build_deployment(settings: &WormgateSettings) -> Result<Deployment> {
    match settings.mode {
        DeploymentMode::Ledger => {
            tracing::info!(
                rpc_url = settings.ledger.rpc_url,
                network = settings.ledger.network,
                "ledger deployment"
            );
            Deployment::ledger(&settings.ledger).context("Failed to build ledger client")
        }
        DeploymentMode::Tool => {
            tracing::info!(
                scripts_dir = settings.tool.scripts_dir,
                network = settings.tool.network,
                "tool deployment"
            );
            Ok(Deployment::tool(&settings.tool))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = resolve_settings(&args)?;
    let metrics_handle = install_recorder();

    let deployment = build_deployment(&settings)?;
    let ctx = RpcContext::new(
        std::sync::Arc::new(deployment),
        Duration::from_millis(settings.server.refresh_interval_ms),
    );

    let mut registry = MethodRegistry::new()
        .with_timeout(Duration::from_millis(settings.server.handler_timeout_ms));
    handlers::register_all(&mut registry);
    let method_count = registry.methods().len();

    let server =
        WormServer::new(settings.server.clone(), registry, ctx).with_metrics(metrics_handle);
    let (addr, handle) = server.listen().await.context("Failed to bind server")?;

    tracing::info!("wormgate listening on http://{addr} ({method_count} RPC methods registered)");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;

    tracing::info!("Shutting down...");
    server.shutdown().shutdown();
    let _ = handle.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
