//! ssh-arena server
//!
//! Accepts SSH connections from players and admits each one into the
//! game lobby.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arena_core::addresses::advertised_addresses;
use arena_core::config::{self, ServerConfig};
use arena_server::lobby::run_lobby;
use arena_server::server::{load_or_generate_host_key, ArenaServer};
use arena_server::ServerState;

#[derive(Parser)]
#[command(name = "arena-server")]
#[command(about = "ssh-arena game server")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Run in foreground with verbose output
    #[arg(short, long)]
    foreground: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.foreground { "debug" } else { &args.log_level };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("ssh-arena server starting...");

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                ServerConfig::default()
            })
        } else {
            tracing::info!("Using default configuration");
            ServerConfig::default()
        }
    };

    // Override port if specified
    if let Some(port) = args.port {
        config.port = port;
    }
    config.validate().context("Invalid configuration")?;

    // Load or generate host key; the server cannot run without one
    let host_key = load_or_generate_host_key(&config.host_key_path).await?;
    let public_key = host_key
        .clone_public_key()
        .context("Failed to derive host public key")?;
    tracing::info!("Host key fingerprint: {}", public_key.fingerprint());

    let addresses = advertised_addresses(config.port);
    if addresses.is_empty() {
        tracing::warn!("No IPv4 interface addresses found to advertise");
    } else {
        tracing::info!("Players can connect with:\n{}", addresses);
    }

    let state = Arc::new(ServerState::new(config).with_addresses(addresses));

    // Create cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    // Admitted sessions are handed over one at a time
    let (admission_tx, admission_rx) = mpsc::channel(1);
    tokio::spawn(run_lobby(Arc::clone(&state), admission_rx, cancel.clone()));

    // Create and run SSH server
    let server = ArenaServer::new(host_key, Arc::clone(&state), cancel.clone(), admission_tx);
    server.run().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
