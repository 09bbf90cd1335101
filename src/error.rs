//! Error types for the SwipeBot gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the SwipeBot gateway
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed inbound payload (bad JSON, missing required field)
    #[error("invalid payload: {0}")]
    Validation(String),

    /// Text-to-speech provider failure (network, quota, invalid voice)
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Speech-to-text provider failure
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Peer disconnect or socket fault
    #[error("transport error: {0}")]
    Transport(String),

    /// Inbound session message carried a `type` outside the known set
    #[error("unrecognized message type: {0}")]
    UnrecognizedMessageType(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Whether the error is scoped to a single request or message
    ///
    /// Request-scoped errors are reported back to the caller; the rest end
    /// the surrounding session.
    #[must_use]
    pub const fn is_request_scoped(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Synthesis(_)
                | Self::Transcription(_)
                | Self::UnrecognizedMessageType(_)
                | Self::Serialization(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_end_the_session() {
        assert!(!Error::Transport("reset".to_string()).is_request_scoped());
        assert!(Error::Synthesis("quota".to_string()).is_request_scoped());
        assert!(Error::UnrecognizedMessageType("audio".to_string()).is_request_scoped());
    }

    #[test]
    fn display_includes_kind() {
        let err = Error::Validation("missing field `text`".to_string());
        assert_eq!(err.to_string(), "invalid payload: missing field `text`");
    }
}
