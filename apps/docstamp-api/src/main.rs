//! Docstamp API Server - upload PDFs and stamp signatures onto them

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use docstamp_api::{app, ApiConfig, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("docstamp_api=info".parse()?)
                .add_directive("docstamp_core=info".parse()?)
                .add_directive("tower_http=debug".parse()?),
        )
        .init();

    info!("Initializing Docstamp API...");
    let config = ApiConfig::from_env();
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::new(config)?);

    info!("Starting Docstamp API on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
