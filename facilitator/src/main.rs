//! x402-move-facilitator entry point.

mod cli;

use std::net::SocketAddr;

use clap::Parser;
use cli::Cli;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use url::Url;
use x402_move_facilitator::app::{AppState, router};
use x402_move_kit::fullnode_client::FullnodeClient;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    // Environment variables feed the CLI defaults
    dotenvy::dotenv().ok();

    let config = Cli::parse().into_config()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    info!("x402-move-facilitator v{}", env!("CARGO_PKG_VERSION"));

    let fullnode_url = Url::parse(&config.fullnode_url)?;

    info!(
        mode = %config.service_mode,
        fullnode = %fullnode_url,
        merchant = %config.merchant_address,
        amount = %config.price_amount,
        token = %config.usdc_token,
        "Configuration loaded"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::new(config, FullnodeClient::new(fullnode_url));
    let app = router(state)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
}
