//! Chat relay HTTP handler.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use relay_core::{answers, preview};
use tracing::{info, warn};

use crate::dto::{ChatRequest, ChatResponse};
use crate::error::AppError;
use crate::ServerState;

/// POST /api/chat - Relays `text` to the pipeline and returns its answer.
pub async fn chat(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let text = match payload {
        Ok(Json(req)) => req.text.filter(|t| !t.is_empty()),
        Err(rejection) => {
            warn!("Rejected chat body: {}", rejection);
            None
        }
    };

    let Some(text) = text else {
        warn!("Missing 'text' in request body");
        return Err(AppError::BadRequest(answers::MISSING_TEXT.into()));
    };

    info!("Processing query: {}", preview(&text, 100));
    let response = state.relay.handle(&text).await?;

    Ok(Json(ChatResponse { response }))
}
