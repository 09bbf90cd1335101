//! HTTP API server for the SwipeBot gateway

pub mod chat;
pub mod error;
pub mod health;
pub mod voice;
pub mod websocket;

pub use error::ApiError;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::{Config, DEFAULT_ALLOWED_ORIGIN, DEFAULT_PORT, VoiceConfig};
use crate::voice::{
    SpeechSynthesizer, SpeechToText, SynthesisRequest, SynthesisResult, TextToSpeech,
    Transcriber, synthesize_with_timeout,
};
use crate::{Error, Result};

/// Shared state for API handlers
///
/// Built once at startup and read-only afterwards; every session and
/// request handler holds the same instance.
#[derive(Clone)]
pub struct ApiState {
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub voice: VoiceConfig,
}

impl ApiState {
    /// Create state around a synthesizer
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, voice: VoiceConfig) -> Self {
        Self {
            synthesizer,
            transcriber: None,
            voice,
        }
    }

    /// Build a synthesis request, falling back to the configured voice and model
    #[must_use]
    pub fn synthesis_request(
        &self,
        text: String,
        voice_id: Option<String>,
        model: Option<String>,
    ) -> SynthesisRequest {
        SynthesisRequest {
            text,
            voice_id: voice_id.unwrap_or_else(|| self.voice.voice_id().to_string()),
            model: model.unwrap_or_else(|| self.voice.tts_model.clone()),
        }
    }

    /// Synthesize within the configured timeout
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] if the provider fails or times out
    pub async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        synthesize_with_timeout(
            self.synthesizer.as_ref(),
            request,
            self.voice.synthesis_timeout,
        )
        .await
    }
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcriber: Option<Arc<dyn Transcriber>>,
    voice: VoiceConfig,
    port: u16,
    allowed_origin: String,
    static_dir: Option<PathBuf>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, voice: VoiceConfig) -> Self {
        Self {
            synthesizer,
            transcriber: None,
            voice,
            port: DEFAULT_PORT,
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            static_dir: None,
        }
    }

    /// Create a builder wired to the providers named in `config`
    ///
    /// # Errors
    ///
    /// Returns error if the selected TTS provider has no API key
    pub fn from_config(config: &Config) -> Result<Self> {
        let tts = TextToSpeech::new(config.voice.tts_provider, config.tts_api_key()?.to_string())?;

        let mut builder = Self::new(Arc::new(tts), config.voice.clone())
            .port(config.api_server.port)
            .allowed_origin(config.api_server.allowed_origin.clone())
            .static_dir(config.api_server.static_dir.clone());

        match config.stt_api_key() {
            Some(key) => {
                let stt = SpeechToText::new_whisper(key.to_string(), config.voice.stt_model.clone())?;
                builder = builder.transcriber(Arc::new(stt));
            }
            None => tracing::info!("OPENAI_API_KEY not set, talk endpoint disabled"),
        }

        Ok(builder)
    }

    /// Set the speech-to-text provider
    #[must_use]
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Set the listen port
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the origin allowed by CORS (`*` allows any origin)
    #[must_use]
    pub fn allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = origin.into();
        self
    }

    /// Serve a static web UI from this directory
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Build the API server
    ///
    /// # Errors
    ///
    /// Returns error if the allowed origin is not a valid header value
    pub fn build(self) -> Result<ApiServer> {
        let cors = cors_layer(&self.allowed_origin)?;

        let state = Arc::new(ApiState {
            synthesizer: self.synthesizer,
            transcriber: self.transcriber,
            voice: self.voice,
        });

        Ok(ApiServer {
            state,
            port: self.port,
            static_dir: self.static_dir,
            cors,
        })
    }
}

/// CORS policy admitting a single origin, with credentials
fn cors_layer(origin: &str) -> Result<CorsLayer> {
    if origin == "*" {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origin = HeaderValue::from_str(origin)
        .map_err(|e| Error::Config(format!("invalid allowed origin {origin:?}: {e}")))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    static_dir: Option<PathBuf>,
    cors: CorsLayer,
}

impl ApiServer {
    /// Shared handler state
    #[must_use]
    pub fn state(&self) -> Arc<ApiState> {
        Arc::clone(&self.state)
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .nest("/api", chat::router().merge(voice::router(self.state.clone())))
            .nest("/ws", websocket::router(self.state.clone()))
            .merge(health::router())
            .merge(health::config_router(self.state.clone()));

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir)
                .not_found_service(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        router
            .layer(self.cors.clone())
            .layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");
        self.serve(listener).await
    }

    /// Serve on an already bound listener
    ///
    /// # Errors
    ///
    /// Returns error if the server fails while running
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Config(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }

    /// Run the API server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}

/// Resolve on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
