use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracklink::config::Config;
use tracklink::{api, storage, track};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    info!("Initializing database...");
    let storage = storage::connect(&config.database).await?;
    info!("Database initialized successfully");

    // Create routers
    let api_router = api::create_api_router(Arc::clone(&storage), config.track_base_url.clone());
    let track_router = track::create_track_router(Arc::clone(&storage));

    // Start API server
    let api_addr = config.api_server.addr();
    let api_listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - Link management available at http://{}/api/links", api_addr);

    // Start track server
    let track_addr = config.track_server.addr();
    let track_listener = tokio::net::TcpListener::bind(&track_addr).await?;
    info!("🚀 Track server listening on http://{}", track_addr);
    info!("   - Tracking links look like {}/<slug>", config.track_base_url);

    // Run both servers concurrently
    tokio::try_join!(
        axum::serve(api_listener, api_router),
        axum::serve(track_listener, track_router),
    )?;

    Ok(())
}
