//! rolerave HTTP server binary.
//!
//! Starts an axum server that accepts activity events from the gateway
//! relay and answers with the rave outcome and any command reply.
//!
//! # Environment Variables
//!
//! - `ROLERAVE_BOT_ID`: The bot's own user id (required)
//! - `ROLERAVE_DATA_DIR`: Record directory (default: `data`)
//! - `ROLERAVE_PREFIX`: Command marker (default: `!`)
//! - `ROLERAVE_RELAY_URL`: Relay base URL; without it mutations are only logged
//! - `PORT`: HTTP port (default: 8080)
//! - `RUST_LOG`: Tracing filter (default: "info,rolerave=debug")
//!
//! # Usage
//!
//! ```bash
//! ROLERAVE_BOT_ID=1234 cargo run --bin server
//! ```

use std::sync::Arc;

use anyhow::Context;
use rolerave::config::BotConfig;
use rolerave::server::{app_router, AppState};
use rolerave::transport::{MemoryTransport, RelayTransport, Transport};
use rolerave::RaveBot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rolerave=debug".into()),
        )
        .init();

    let config = BotConfig::from_env().context("invalid configuration")?;
    let bind_addr = config.bind_addr();

    let transport: Arc<dyn Transport> = match &config.relay_url {
        Some(url) => {
            tracing::info!("Forwarding role mutations to relay at {}", url);
            Arc::new(RelayTransport::new(url.clone()))
        }
        None => {
            tracing::warn!("ROLERAVE_RELAY_URL not set, running as a dry run");
            Arc::new(MemoryTransport::new())
        }
    };

    let app = app_router(AppState::new(RaveBot::new(&config, transport)));

    tracing::info!("rolerave server starting on {}", bind_addr);
    tracing::info!("Records in {}", config.data_dir.display());
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health  liveness probe");
    tracing::info!("  POST /events  activity events");
    tracing::info!("  GET  /guilds/:guild_id/settings  community settings");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
