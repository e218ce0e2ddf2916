//! Managed Services Balance Tool Server
//!
//! This server provides:
//! - The query form on `/` behind a Salesforce login
//! - Query endpoints for Monday, Salesforce and Smartsheet under `/api/<source>`
//! - The Salesforce OAuth2 handshake on `/api/oauth`
//! - Health, readiness and Prometheus metrics endpoints
//!
//! Usage:
//! ```bash
//! # With config file
//! msbt-server --config config.yaml
//!
//! # Or with environment variables (a .env file is read too)
//! SF_KEY=... SF_SECRET=... SF_REDIRECT_URL=... SF_JWT_SECRET=... msbt-server
//! ```
//!
//! Test with:
//! ```bash
//! curl http://localhost:3000/api/health
//!
//! curl http://localhost:3000/api/monday \
//!   -H "Content-Type: application/json" \
//!   -d '{"query": "{ users { id name email } }"}'
//! ```

mod app;
mod config;

use clap::Parser;
use config::ServerConfig;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Managed Services Balance Tool - query dashboard for Monday, Salesforce and Smartsheet
#[derive(Parser)]
#[command(name = "msbt-server")]
#[command(about = "Balance sheet tracking dashboard server", long_about = None)]
struct Cli {
    /// Path to configuration file (YAML or TOML)
    #[arg(short, long, value_name = "FILE", env = "MSBT_CONFIG")]
    config: Option<String>,
}

fn init_tracing(config: &ServerConfig) -> anyhow::Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_lowercase()));

    if config.logging.json {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_env_filter(filter)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = if let Some(path) = &cli.config {
        ServerConfig::from_file(path)?
    } else {
        ServerConfig::default()
    };

    // Environment variables override the config file
    config.merge_env();

    init_tracing(&config)?;

    info!("🚀 Initializing Managed Services Balance Tool");
    match &cli.config {
        Some(path) => info!("📁 Loaded configuration from {}", path),
        None => info!("📁 Using default configuration"),
    }

    let app = app::build_app(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!("");
    info!("✅ Balance tool listening on http://{}", addr);
    info!("   Dashboard:     http://{}/", addr);
    info!("   Query API:     POST http://{}/api/{{monday,salesforce,smartsheet}}", addr);
    info!("   OAuth:         http://{}/api/oauth", addr);
    info!("📊 Observability:");
    info!("   Health:        http://{}/api/health", addr);
    info!("   Readiness:     http://{}/readyz", addr);
    info!("   Metrics:       http://{}/metrics", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
