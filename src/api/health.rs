//! Liveness and client configuration endpoints

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use super::ApiState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
}

/// Voice settings a client needs to start a conversation
#[derive(Serialize)]
pub struct ConvaiConfig {
    pub model: String,
    /// `null` when no voice is configured and the provider default applies
    pub voice_id: Option<String>,
}

/// Liveness probe - is the service running?
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}

/// Currently configured synthesis model and voice
async fn convai_config(State(state): State<Arc<ApiState>>) -> Json<ConvaiConfig> {
    Json(ConvaiConfig {
        model: state.voice.tts_model.clone(),
        voice_id: state.voice.tts_voice.clone(),
    })
}

/// Build health router (liveness only, no state needed)
pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Build client configuration router
pub fn config_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/api/convai/config", get(convai_config))
        .with_state(state)
}
