//! HTTP route handlers for the relay server.

pub mod chat;

use std::sync::Arc;

use axum::{extract::State, Json};
use relay_engine::StatusReport;

use crate::ServerState;

/// Liveness probe.
pub async fn health() -> &'static str {
    "OK"
}

/// GET /api/ping - Reports whether the pipeline was loaded at startup.
pub async fn ping(State(state): State<Arc<ServerState>>) -> Json<StatusReport> {
    Json(state.relay.ping())
}
