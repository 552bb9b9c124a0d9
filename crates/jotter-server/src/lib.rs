//! Jotter HTTP API - JSON endpoints over a lazily connected document store.

pub mod backend;
pub mod config;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(name = "jotter-server", about = "HTTP API for jotter notes", version)]
pub struct Args {
    /// TOML config file. Defaults apply when omitted.
    #[arg(long, short = 'c', value_name = "FILE", env = "JOTTER_CONFIG")]
    pub config: Option<PathBuf>,
}

pub async fn run(args: Args) -> anyhow::Result<()> {
    let config = config::load(args.config.as_deref())?;
    init_tracing(&config);

    let http_addr: SocketAddr = config.service.http_bind.parse()?;
    let state = AppState::new(&config);
    let app = routes::router(state);

    let listener = TcpListener::bind(http_addr).await?;
    tracing::info!(%http_addr, "HTTP server listening.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped.");
    Ok(())
}

fn init_tracing(config: &config::Config) {
    let filter =
        EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal.");
        std::future::pending::<()>().await;
    }
}
