//! HTTP ingress for activity events.
//!
//! The gateway relay that owns the chat connection posts every inbound
//! message here and receives the resulting [`EventReport`](crate::bot::EventReport).
//!
//! # Endpoints
//!
//! - `GET  /health`                     Liveness probe
//! - `POST /events`                     Process one activity event
//! - `GET  /guilds/:guild_id/settings`  Inspect a loaded community

pub mod routes;

pub use routes::{app_router, AppState};
