//! Configuration management for the SwipeBot gateway
//!
//! Read once at startup (env > toml > default) and immutable afterwards.

pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::voice::{DEFAULT_MODEL, TtsProvider};
use crate::{Error, Result};

use file::SwipebotConfigFile;

/// Default API server port
pub const DEFAULT_PORT: u16 = 8000;

/// Default origin allowed by CORS (Vite dev server)
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Default STT model
pub const DEFAULT_STT_MODEL: &str = "whisper-1";

/// Default bound on a single synthesis call
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(30);

/// SwipeBot gateway configuration
#[derive(Debug)]
pub struct Config {
    /// Voice configuration
    pub voice: VoiceConfig,

    /// API keys
    pub api_keys: ApiKeys,

    /// HTTP API server configuration
    pub api_server: ApiServerConfig,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Origin allowed to make cross-origin requests
    pub allowed_origin: String,

    /// Path to static files directory (web UI)
    pub static_dir: Option<PathBuf>,
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// Which TTS provider synthesizes replies
    pub tts_provider: TtsProvider,

    /// TTS model identifier
    pub tts_model: String,

    /// Configured TTS voice; `None` means the provider default
    pub tts_voice: Option<String>,

    /// STT model for the legacy talk endpoint
    pub stt_model: String,

    /// Upper bound on a single synthesis call
    pub synthesis_timeout: Duration,
}

impl VoiceConfig {
    /// Voice to synthesize with when a request names none
    #[must_use]
    pub fn voice_id(&self) -> &str {
        self.tts_voice
            .as_deref()
            .unwrap_or_else(|| self.tts_provider.default_voice())
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            tts_provider: TtsProvider::ElevenLabs,
            tts_model: DEFAULT_MODEL.to_string(),
            tts_voice: None,
            stt_model: DEFAULT_STT_MODEL.to_string(),
            synthesis_timeout: DEFAULT_SYNTHESIS_TIMEOUT,
        }
    }
}

/// API keys for external services
#[derive(Debug, Default)]
pub struct ApiKeys {
    /// `ElevenLabs` API key (default TTS)
    pub elevenlabs: Option<SecretString>,

    /// `OpenAI` API key (Whisper STT, optional TTS)
    pub openai: Option<SecretString>,
}

impl Config {
    /// Load configuration from `.env`, the config file, and the process environment
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "failed to load .env file"),
        }

        let path = std::env::var("SWIPEBOT_CONFIG").ok().map(PathBuf::from);
        let fc = file::load_config_file(path.as_deref());
        Self::from_sources(fc, |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed config file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a value is present but invalid
    pub fn from_sources(
        fc: SwipebotConfigFile,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // API keys (env > toml > None)
        let api_keys = ApiKeys {
            elevenlabs: lookup("ELEVENLABS_API_KEY")
                .or(fc.api_keys.elevenlabs)
                .map(SecretString::from),
            openai: lookup("OPENAI_API_KEY")
                .or(fc.api_keys.openai)
                .map(SecretString::from),
        };

        // API server config (env > toml > default)
        let port = match lookup("SWIPEBOT_PORT").or_else(|| lookup("PORT")) {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid port: {raw}")))?,
            None => fc.server.port.unwrap_or(DEFAULT_PORT),
        };
        let api_server = ApiServerConfig {
            port,
            allowed_origin: lookup("ALLOWED_ORIGIN")
                .or(fc.server.allowed_origin)
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            static_dir: lookup("SWIPEBOT_STATIC_DIR")
                .or(fc.server.static_dir)
                .map(PathBuf::from),
        };

        // Voice config (env > toml > default)
        let tts_provider = lookup("SWIPEBOT_TTS_PROVIDER")
            .or(fc.voice.provider)
            .map(|p| p.parse::<TtsProvider>())
            .transpose()?
            .unwrap_or(TtsProvider::ElevenLabs);
        let synthesis_timeout = match lookup("SWIPEBOT_SYNTHESIS_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| Error::Config(format!("invalid synthesis timeout: {raw}")))?,
            None => fc
                .voice
                .synthesis_timeout_secs
                .unwrap_or(DEFAULT_SYNTHESIS_TIMEOUT.as_secs()),
        };
        if synthesis_timeout == 0 {
            return Err(Error::Config("synthesis timeout must be positive".to_string()));
        }

        let voice = VoiceConfig {
            tts_provider,
            tts_model: lookup("ELEVENLABS_MODEL")
                .or(fc.voice.model)
                .unwrap_or_else(|| tts_provider.default_model().to_string()),
            tts_voice: lookup("ELEVENLABS_VOICE_ID").or(fc.voice.voice_id),
            stt_model: lookup("SWIPEBOT_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| DEFAULT_STT_MODEL.to_string()),
            synthesis_timeout: Duration::from_secs(synthesis_timeout),
        };

        Ok(Self {
            voice,
            api_keys,
            api_server,
        })
    }

    /// API key for the selected TTS provider
    ///
    /// # Errors
    ///
    /// Returns error if the key for the selected provider is not configured
    pub fn tts_api_key(&self) -> Result<&str> {
        let (key, name) = match self.voice.tts_provider {
            TtsProvider::ElevenLabs => (&self.api_keys.elevenlabs, "ELEVENLABS_API_KEY"),
            TtsProvider::OpenAI => (&self.api_keys.openai, "OPENAI_API_KEY"),
        };
        key.as_ref()
            .map(|key| key.expose_secret())
            .ok_or_else(|| Error::Config(format!("{name} is required for speech synthesis")))
    }

    /// API key for speech-to-text, if one is configured
    #[must_use]
    pub fn stt_api_key(&self) -> Option<&str> {
        self.api_keys.openai.as_ref().map(|key| key.expose_secret())
    }
}
