//! TOML configuration file loading
//!
//! Supports `~/.config/swipebot/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwipebotConfigFile {
    /// Speech synthesis/transcription configuration
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceFileConfig {
    /// TTS provider ("elevenlabs" or "openai")
    pub provider: Option<String>,

    /// TTS model (e.g. "eleven_monolingual_v1")
    pub model: Option<String>,

    /// TTS voice identifier
    pub voice_id: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub stt_model: Option<String>,

    /// Upper bound on a single synthesis call
    pub synthesis_timeout_secs: Option<u64>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiKeysFileConfig {
    pub elevenlabs: Option<String>,
    pub openai: Option<String>,
}

/// Server configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Origin allowed to make cross-origin requests
    pub allowed_origin: Option<String>,

    /// Directory of static web UI files
    pub static_dir: Option<String>,
}

/// Parse config file contents
///
/// # Errors
///
/// Returns error if the contents are not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<SwipebotConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load the TOML config file from `path`, or from the standard path
///
/// Returns `SwipebotConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file(path: Option<&Path>) -> SwipebotConfigFile {
    let Some(path) = path.map(Path::to_path_buf).or_else(config_file_path) else {
        return SwipebotConfigFile::default();
    };

    if !path.exists() {
        return SwipebotConfigFile::default();
    }

    match std::fs::read_to_string(&path) {
        Ok(content) => match parse_config_file(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                SwipebotConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            SwipebotConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/swipebot/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("swipebot").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_file() {
        let fc = parse_config_file(
            r#"
            [voice]
            voice_id = "abc123"
            synthesis_timeout_secs = 10

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        assert_eq!(fc.voice.voice_id.as_deref(), Some("abc123"));
        assert_eq!(fc.voice.synthesis_timeout_secs, Some(10));
        assert_eq!(fc.server.port, Some(9000));
        assert!(fc.api_keys.elevenlabs.is_none());
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(parse_config_file("[voice]\nspeed = 1.5\n").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let fc = load_config_file(Some(&dir.path().join("absent.toml")));
        assert!(fc.voice.model.is_none());
    }

    #[test]
    fn reads_file_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[api_keys]\nelevenlabs = \"xi-key\"\n").unwrap();

        let fc = load_config_file(Some(&path));
        assert_eq!(fc.api_keys.elevenlabs.as_deref(), Some("xi-key"));
    }
}
