//! Voice API endpoints for text-to-speech and one-shot speech replies

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header},
    routing::post,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use super::ApiState;
use super::error::{ApiError, json_body};
use crate::brain::{self, ChatRequest};
use crate::voice::SynthesizedAudio;
use crate::Error;

/// Build voice router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/text-to-speech", post(text_to_speech))
        .route("/process-speech", post(process_speech))
        .route("/talk", post(talk))
        .with_state(state)
}

/// Text-to-speech request
#[derive(Debug, Deserialize)]
pub struct TextToSpeechRequest {
    pub text: String,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Base64 audio payload
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioResponse {
    pub audio: String,
    pub format: String,
}

impl From<&SynthesizedAudio> for AudioResponse {
    fn from(audio: &SynthesizedAudio) -> Self {
        Self {
            audio: BASE64.encode(&audio.bytes),
            format: audio.format.label().to_string(),
        }
    }
}

/// Synthesize free text
async fn text_to_speech(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<TextToSpeechRequest>, JsonRejection>,
) -> Result<Json<AudioResponse>, ApiError> {
    let request = json_body(payload)?;

    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("Empty text".to_string()));
    }

    let synthesis = state.synthesis_request(request.text, request.voice_id, request.model);
    let audio = state
        .synthesize(&synthesis)
        .await
        .map_err(|e| ApiError::SynthesisFailed(failure_reason(e)))?;

    Ok(Json(AudioResponse::from(&audio)))
}

/// Process-speech request
#[derive(Debug, Deserialize)]
pub struct ProcessSpeechRequest {
    pub transcript: String,
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Reply text with its spoken rendition
#[derive(Debug, Serialize, Deserialize)]
pub struct SpokenReply {
    pub text: String,
    pub audio: String,
    pub format: String,
}

/// Generate a reply for a transcript and speak it
async fn process_speech(
    State(state): State<Arc<ApiState>>,
    payload: Result<Json<ProcessSpeechRequest>, JsonRejection>,
) -> Result<Json<SpokenReply>, ApiError> {
    let request = json_body(payload)?;

    let reply = speak_reply(&state, request.transcript, request.voice_id)
        .await
        .map_err(|e| ApiError::ProcessingFailed(failure_reason(e)))?;

    Ok(Json(reply))
}

/// Talk response: what was heard plus the spoken reply
#[derive(Debug, Serialize, Deserialize)]
pub struct TalkResponse {
    pub transcript: String,
    #[serde(flatten)]
    pub reply: SpokenReply,
}

/// Transcribe recorded speech, then reply to it
async fn talk(
    State(state): State<Arc<ApiState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<TalkResponse>, ApiError> {
    let transcriber = state
        .transcriber
        .as_ref()
        .ok_or(ApiError::NotConfigured("Speech-to-text not configured"))?;

    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty audio data".to_string()));
    }

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("audio/wav");

    let transcript = transcriber
        .transcribe(body.to_vec(), mime_type)
        .await
        .map_err(|e| ApiError::ProcessingFailed(failure_reason(e)))?;

    let reply = speak_reply(&state, transcript.clone(), None)
        .await
        .map_err(|e| ApiError::ProcessingFailed(failure_reason(e)))?;

    Ok(Json(TalkResponse { transcript, reply }))
}

/// Run the responder on `transcript` and synthesize its reply
async fn speak_reply(
    state: &ApiState,
    transcript: String,
    voice_id: Option<String>,
) -> crate::Result<SpokenReply> {
    let response = brain::think(&ChatRequest::from_text(transcript));
    let synthesis = state.synthesis_request(response.reply, voice_id, None);
    let audio = state.synthesize(&synthesis).await?;
    let AudioResponse { audio, format } = AudioResponse::from(&audio);

    Ok(SpokenReply {
        text: synthesis.text,
        audio,
        format,
    })
}

/// Provider failure text without the error-kind prefix
fn failure_reason(err: Error) -> String {
    match err {
        Error::Synthesis(msg) | Error::Transcription(msg) => msg,
        other => other.to_string(),
    }
}
