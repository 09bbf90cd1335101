//! Shared test utilities
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use swipebot_gateway::config::VoiceConfig;
use swipebot_gateway::voice::{
    AudioFormat, SpeechSynthesizer, SynthesisRequest, SynthesisResult, SynthesizedAudio,
    Transcriber,
};
use swipebot_gateway::{ApiServer, ApiServerBuilder, Error, Result};

/// Audio every fake synthesizer returns on success
pub const FAKE_AUDIO: &[u8] = b"ID3\x04fake-mp3-frames";

/// Succeeds every call and remembers what it was asked
#[derive(Default)]
pub struct FixedSynthesizer {
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl FixedSynthesizer {
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FixedSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> SynthesisResult {
        self.requests.lock().unwrap().push(request.clone());
        Ok(SynthesizedAudio {
            bytes: FAKE_AUDIO.to_vec(),
            format: AudioFormat::Mp3,
        })
    }
}

/// Fails every call
pub struct FailingSynthesizer(pub &'static str);

#[async_trait]
impl SpeechSynthesizer for FailingSynthesizer {
    async fn synthesize(&self, _request: &SynthesisRequest) -> SynthesisResult {
        Err(Error::Synthesis(self.0.to_string()))
    }
}

/// Fails the first call, then behaves like [`FixedSynthesizer`]
#[derive(Default)]
pub struct FlakySynthesizer {
    calls: AtomicUsize,
}

#[async_trait]
impl SpeechSynthesizer for FlakySynthesizer {
    async fn synthesize(&self, _request: &SynthesisRequest) -> SynthesisResult {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(Error::Synthesis("upstream 503".to_string()));
        }
        Ok(SynthesizedAudio {
            bytes: FAKE_AUDIO.to_vec(),
            format: AudioFormat::Mp3,
        })
    }
}

/// Hears the same sentence every time and remembers the MIME types it got
pub struct FakeTranscriber {
    pub heard: &'static str,
    mime_types: Mutex<Vec<String>>,
}

impl FakeTranscriber {
    pub fn new(heard: &'static str) -> Self {
        Self {
            heard,
            mime_types: Mutex::new(Vec::new()),
        }
    }

    pub fn mime_types(&self) -> Vec<String> {
        self.mime_types.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, _audio: Vec<u8>, mime_type: &str) -> Result<String> {
        self.mime_types.lock().unwrap().push(mime_type.to_string());
        Ok(self.heard.to_string())
    }
}

/// Build a server around a synthesizer with default voice settings
pub fn build_test_server(synthesizer: Arc<dyn SpeechSynthesizer>) -> ApiServer {
    build_test_server_with(synthesizer, None, VoiceConfig::default())
}

/// Build a server with full control over its providers
pub fn build_test_server_with(
    synthesizer: Arc<dyn SpeechSynthesizer>,
    transcriber: Option<Arc<dyn Transcriber>>,
    voice: VoiceConfig,
) -> ApiServer {
    let mut builder = ApiServerBuilder::new(synthesizer, voice);
    if let Some(transcriber) = transcriber {
        builder = builder.transcriber(transcriber);
    }
    builder.build().expect("failed to build test server")
}
