//! TunnelVision - infrastructure asset failure-risk scoring service
//!
//! # Usage
//!
//! ```bash
//! # Serve with ./tunnelvision.toml (or defaults) and ./artifacts
//! cargo run --release
//!
//! # Explicit config, address and artifact directory
//! ./tunnelvision --config /etc/tunnelvision.toml --addr 127.0.0.1:9000 --artifacts /srv/models
//! ```
//!
//! # Environment Variables
//!
//! - `TUNNELVISION_CONFIG`: Path to the TOML config file
//! - `TUNNELVISION_SERVER_ADDR`: Bind address (overridden by `--addr`)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use tunnelvision::api::{create_app, ApiState};
use tunnelvision::config::ServiceConfig;
use tunnelvision::models::ModelEnsemble;
use tunnelvision::pipeline::PredictionService;
use tunnelvision::resolve::weather;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "tunnelvision")]
#[command(about = "TunnelVision infrastructure failure-risk scoring service")]
#[command(version)]
struct CliArgs {
    /// TOML config file (default search: $TUNNELVISION_CONFIG, ./tunnelvision.toml)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override the server address (default: "0.0.0.0:8000")
    #[arg(short, long, env = "TUNNELVISION_SERVER_ADDR")]
    addr: Option<String>,

    /// Override the model artifact directory (default: "artifacts")
    #[arg(long, value_name = "DIR")]
    artifacts: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
    }
}

/// Resolve the effective config: file (explicit or searched), then CLI overrides.
fn load_config(args: &CliArgs) -> Result<ServiceConfig> {
    let mut config = match &args.config {
        Some(path) => ServiceConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServiceConfig::load(),
    };

    if let Some(addr) = &args.addr {
        config.server.addr = addr.clone();
    }
    if let Some(dir) = &args.artifacts {
        config.models.artifacts_dir = dir.clone();
    }
    config.validate().context("Invalid configuration after CLI overrides")?;
    Ok(config)
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let config = load_config(&args)?;

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  TunnelVision {}", env!("CARGO_PKG_VERSION"));
    info!("  Infrastructure failure-risk scoring");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    // Models load once, before the listener opens; a bad artifact set is fatal.
    let artifacts = &config.models.artifacts_dir;
    let ensemble = ModelEnsemble::load(artifacts)
        .with_context(|| format!("Failed to load model artifacts from {}", artifacts.display()))?;
    info!(dir = %artifacts.display(), "✓ Model ensemble ready");

    let weather = weather::from_config(&config.weather).context("Failed to build weather client")?;
    if config.weather.enabled {
        info!(url = %config.weather.base_url, timeout_ms = config.weather.timeout_ms, "Weather lookup enabled");
    } else {
        info!(fallback_c = config.weather.fallback_temperature_c, "Weather lookup disabled, using fixed temperature");
    }

    let service = PredictionService::new(Arc::new(ensemble), weather);
    let app = create_app(ApiState::new(service), &config.server.cors_origins);

    let addr = &config.server.addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("✓ HTTP server listening on {}", addr);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("🛑 Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
        })
        .await;

    match result {
        Ok(()) => {
            info!("Graceful shutdown complete");
            Ok(())
        }
        Err(e) => {
            error!("Server error: {}", e);
            Err(anyhow::anyhow!("HTTP server error: {}", e))
        }
    }
}
