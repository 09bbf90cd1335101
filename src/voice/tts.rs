//! Text-to-speech (TTS) processing

use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// Voice used when neither the request nor the configuration names one
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

/// Model used when neither the request nor the configuration names one
pub const DEFAULT_MODEL: &str = "eleven_monolingual_v1";

const ELEVENLABS_API_URL: &str = "https://api.elevenlabs.io";
const OPENAI_API_URL: &str = "https://api.openai.com";

/// Encoding of synthesized audio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
}

impl AudioFormat {
    /// Label sent to clients alongside the audio
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
        }
    }
}

/// What to synthesize, and with which voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub model: String,
}

/// Fully buffered synthesized audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
}

/// Outcome of a synthesis call
pub type SynthesisResult = Result<SynthesizedAudio>;

/// Turns text into encoded audio
///
/// Implementations are shared across every session and handler, so they must
/// not mutate shared state while synthesizing.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the request's text
    ///
    /// # Errors
    ///
    /// Returns [`Error::Synthesis`] when the provider rejects or fails the call
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult;
}

/// Run a synthesis call, failing it once `timeout` has elapsed
///
/// # Errors
///
/// Returns the synthesizer's error, or [`Error::Synthesis`] on timeout
pub async fn synthesize_with_timeout(
    synthesizer: &dyn SpeechSynthesizer,
    request: &SynthesisRequest,
    timeout: Duration,
) -> SynthesisResult {
    match tokio::time::timeout(timeout, synthesizer.synthesize(request)).await {
        Ok(result) => result,
        Err(_) => Err(Error::Synthesis(format!(
            "timed out after {}ms",
            timeout.as_millis()
        ))),
    }
}

/// TTS provider backend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TtsProvider {
    OpenAI,
    ElevenLabs,
}

impl TtsProvider {
    /// Model used when the configuration names none
    #[must_use]
    pub const fn default_model(self) -> &'static str {
        match self {
            Self::ElevenLabs => DEFAULT_MODEL,
            Self::OpenAI => "tts-1",
        }
    }

    /// Voice used when neither the request nor the configuration names one
    #[must_use]
    pub const fn default_voice(self) -> &'static str {
        match self {
            Self::ElevenLabs => DEFAULT_VOICE_ID,
            Self::OpenAI => "alloy",
        }
    }
}

impl std::str::FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "elevenlabs" | "eleven_labs" => Ok(Self::ElevenLabs),
            "openai" => Ok(Self::OpenAI),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// Synthesizes speech from text over a provider's HTTP API
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a new TTS instance using ElevenLabs
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_elevenlabs(api_key: String) -> Result<Self> {
        Self::new(TtsProvider::ElevenLabs, api_key)
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: String) -> Result<Self> {
        Self::new(TtsProvider::OpenAI, api_key)
    }

    /// Create a new TTS instance for the given provider
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new(provider: TtsProvider, api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            let name = match provider {
                TtsProvider::OpenAI => "OpenAI",
                TtsProvider::ElevenLabs => "ElevenLabs",
            };
            return Err(Error::Config(format!("{name} API key required for TTS")));
        }

        let base_url = match provider {
            TtsProvider::OpenAI => OPENAI_API_URL,
            TtsProvider::ElevenLabs => ELEVENLABS_API_URL,
        };

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: base_url.to_string(),
            provider,
        })
    }

    /// Point the client at a different API host
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Provider this client talks to
    #[must_use]
    pub const fn provider(&self) -> TtsProvider {
        self.provider
    }

    /// Synthesize using ElevenLabs TTS
    async fn synthesize_elevenlabs(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        let url = format!("{}/v1/text-to-speech/{}", self.base_url, request.voice_id);

        let body = ElevenLabsRequest {
            text: &request.text,
            model_id: &request.model,
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header("Accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("ElevenLabs request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!(
                "ElevenLabs TTS error {status}: {body}"
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(format!("ElevenLabs audio read failed: {e}")))?;
        Ok(audio.to_vec())
    }

    /// Synthesize using `OpenAI` TTS
    async fn synthesize_openai(&self, request: &SynthesisRequest) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            response_format: &'a str,
        }

        let body = TtsRequest {
            model: &request.model,
            input: &request.text,
            voice: &request.voice_id,
            response_format: AudioFormat::Mp3.label(),
        };

        let response = self
            .client
            .post(format!("{}/v1/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Synthesis(format!("OpenAI request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Synthesis(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Synthesis(format!("OpenAI audio read failed: {e}")))?;
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechSynthesizer for TextToSpeech {
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        if request.text.trim().is_empty() {
            return Err(Error::Synthesis("no text to synthesize".to_string()));
        }

        tracing::debug!(
            provider = ?self.provider,
            voice_id = %request.voice_id,
            model = %request.model,
            chars = request.text.len(),
            "synthesizing speech"
        );

        let bytes = match self.provider {
            TtsProvider::ElevenLabs => self.synthesize_elevenlabs(request).await?,
            TtsProvider::OpenAI => self.synthesize_openai(request).await?,
        };

        if bytes.is_empty() {
            return Err(Error::Synthesis("provider returned no audio".to_string()));
        }

        Ok(SynthesizedAudio {
            bytes,
            format: AudioFormat::Mp3,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest {
            text: text.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    #[test]
    fn rejects_empty_api_key() {
        let err = TextToSpeech::new_elevenlabs(String::new()).err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn parses_provider_names() {
        assert_eq!("ElevenLabs".parse::<TtsProvider>().unwrap(), TtsProvider::ElevenLabs);
        assert_eq!("openai".parse::<TtsProvider>().unwrap(), TtsProvider::OpenAI);
        assert!("polly".parse::<TtsProvider>().is_err());
    }

    #[tokio::test]
    async fn elevenlabs_posts_text_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/v1/text-to-speech/{DEFAULT_VOICE_ID}")))
            .and(header("xi-api-key", "test-key"))
            .and(body_json(serde_json::json!({
                "text": "hello",
                "model_id": DEFAULT_MODEL,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xFB, 0x90]))
            .expect(1)
            .mount(&server)
            .await;

        let tts = TextToSpeech::new_elevenlabs("test-key".to_string())
            .unwrap()
            .with_base_url(server.uri());
        let audio = tts.synthesize(&request("hello")).await.unwrap();

        assert_eq!(audio.bytes, vec![0xFF, 0xFB, 0x90]);
        assert_eq!(audio.format.label(), "mp3");
    }

    #[tokio::test]
    async fn provider_error_becomes_synthesis_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let tts = TextToSpeech::new_elevenlabs("bad".to_string())
            .unwrap()
            .with_base_url(server.uri());
        let err = tts.synthesize(&request("hello")).await.unwrap_err();

        match err {
            Error::Synthesis(msg) => {
                assert!(msg.contains("401"));
                assert!(msg.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_audio_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let tts = TextToSpeech::new_elevenlabs("key".to_string())
            .unwrap()
            .with_base_url(server.uri());
        let err = tts.synthesize(&request("hello")).await.unwrap_err();
        assert!(matches!(err, Error::Synthesis(_)));
    }

    #[tokio::test]
    async fn openai_uses_speech_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/audio/speech"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .expect(1)
            .mount(&server)
            .await;

        let tts = TextToSpeech::new_openai("sk-test".to_string())
            .unwrap()
            .with_base_url(server.uri());
        let mut req = request("hi there");
        req.voice_id = "alloy".to_string();
        req.model = "tts-1".to_string();
        let audio = tts.synthesize(&req).await.unwrap();
        assert_eq!(audio.bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn slow_synthesis_times_out() {
        struct Stalled;

        #[async_trait]
        impl SpeechSynthesizer for Stalled {
            async fn synthesize(&self, _request: &SynthesisRequest) -> SynthesisResult {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Err(Error::Synthesis("unreachable".to_string()))
            }
        }

        let err = synthesize_with_timeout(&Stalled, &request("hello"), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }
}
