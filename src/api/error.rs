//! Error payloads returned by the single-shot endpoints

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Failure of a single-shot request
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or incomplete request body
    BadRequest(String),
    /// Feature needs a provider that is not configured
    NotConfigured(&'static str),
    /// Text-to-speech call failed
    SynthesisFailed(String),
    /// Transcript-to-reply pipeline failed
    ProcessingFailed(String),
}

impl ApiError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::SynthesisFailed(_) | Self::ProcessingFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(self) -> String {
        match self {
            Self::BadRequest(msg) => msg,
            Self::NotConfigured(msg) => msg.to_string(),
            Self::SynthesisFailed(msg) => format!("TTS failed: {msg}"),
            Self::ProcessingFailed(msg) => format!("Processing failed: {msg}"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(status = %status, error = ?self, "request failed");
        }

        (status, Json(ErrorResponse { error: self.message() })).into_response()
    }
}

/// Unwrap a JSON body, turning extractor rejections into `400 { error }`
///
/// # Errors
///
/// Returns [`ApiError::BadRequest`] describing why the body was rejected
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesis_failure_is_500_with_prefix() {
        let err = ApiError::SynthesisFailed("quota exceeded".to_string());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "TTS failed: quota exceeded");
    }

    #[test]
    fn bad_request_keeps_message() {
        let err = ApiError::BadRequest("missing field `text`".to_string());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "missing field `text`");
    }
}
