//! Text-only chat endpoint backed by the rule-based responder

use axum::{Json, Router, extract::rejection::JsonRejection, routing::post};

use super::error::{ApiError, json_body};
use crate::brain::{self, ChatRequest, ChatResponse};

/// Build chat router
pub fn router() -> Router {
    Router::new().route("/brain", post(think))
}

/// Generate a reply for a chat request
async fn think(
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let request = json_body(payload)?;
    let response = brain::think(&request);

    tracing::debug!(
        user_id = ?request.user_id,
        intent = ?response.intent(),
        policy = ?response.policy(),
        "brain reply"
    );

    Ok(Json(response))
}
