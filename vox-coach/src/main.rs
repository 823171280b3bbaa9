//! vox-coach - VoxMentor coaching service
//!
//! Default port 5790. Configuration: `--config` TOML file (default
//! `~/.config/voxmentor/vox-coach.toml`), `VOX_*` environment variables,
//! command-line overrides.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use vox_coach::config::{CliOverrides, CoachConfig, ENV_LOG};
use vox_coach::{build_router, AppState};
use vox_common::config::{default_config_path, load_toml_config};

/// Command-line arguments for vox-coach
#[derive(Parser, Debug)]
#[command(name = "vox-coach")]
#[command(about = "VoxMentor speaking coach service")]
#[command(version)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, env = "VOX_COACH_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "VOX_COACH_PORT")]
    port: Option<u16>,

    /// Log level or filter directive (overrides VOX_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Default::default(),
    };

    // Level must be known before the subscriber exists
    let filter = args
        .log_level
        .clone()
        .or_else(|| std::env::var(ENV_LOG).ok())
        .unwrap_or_else(|| toml_config.logging.level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&filter)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!(
        "Starting VoxMentor coaching service (vox-coach) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    let cli = CliOverrides {
        host: args.host,
        port: args.port,
        log_level: args.log_level,
    };
    let config = CoachConfig::resolve(&toml_config, &cli).context("Invalid configuration")?;

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize coaching service")?;
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("vox-coach listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
