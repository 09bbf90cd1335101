//! Voice processing module
//!
//! Speech synthesis and transcription clients. Both are external providers
//! reached over HTTP and shared read-only by every handler.

mod stt;
mod tts;

pub use stt::{SpeechToText, Transcriber};
pub use tts::{
    AudioFormat, DEFAULT_MODEL, DEFAULT_VOICE_ID, SpeechSynthesizer, SynthesisRequest,
    SynthesisResult, SynthesizedAudio, TextToSpeech, TtsProvider, synthesize_with_timeout,
};
