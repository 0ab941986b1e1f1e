//! Axum route handlers for the event ingress.
//!
//! # Routes
//!
//! - `GET  /health`                     Returns `{"status": "ok", "version": ..., "service": "rolerave"}`
//! - `POST /events`                     Accepts an `ActivityEvent`, returns an `EventReport`
//! - `GET  /guilds/:guild_id/settings`  Current settings record of a loaded community

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::bot::{EventReport, RaveBot};
use crate::types::{ActivityEvent, GuildId};

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<RaveBot>,
}

impl AppState {
    /// Wrap `bot` for sharing between requests.
    pub fn new(bot: RaveBot) -> Self {
        Self { bot: Arc::new(bot) }
    }
}

/// Build the axum router with all routes.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/events", post(event_handler))
        .route("/guilds/:guild_id/settings", get(settings_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health: liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": crate::VERSION,
        "service": "rolerave",
    }))
}

/// POST /events: run one event through the engine and the dispatcher.
async fn event_handler(State(state): State<AppState>, Json(event): Json<ActivityEvent>) -> Json<EventReport> {
    Json(state.bot.handle(&event).await)
}

/// GET /guilds/:guild_id/settings: the community's settings as `[name, value]` pairs.
async fn settings_handler(
    State(state): State<AppState>,
    Path(guild_id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let guild = state.bot.registry().get(GuildId(guild_id)).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("Guild {guild_id} has not been seen yet") })),
        )
    })?;
    Ok(Json(json!({
        "guild": guild.id(),
        "key": guild.key(),
        "settings": guild.settings().to_record(),
    })))
}
