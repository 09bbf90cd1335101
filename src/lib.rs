//! SwipeBot Gateway - Real-time voice sales agent backend
//!
//! This library provides the core functionality for the SwipeBot gateway:
//! - Rule-based reply generation
//! - Text-to-speech and speech-to-text provider clients
//! - HTTP endpoints and persistent WebSocket conversation sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Clients                          │
//! │     Browser UI  │  HTTP callers  │  WebSocket        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                SwipeBot Gateway                      │
//! │   API routes  │  Sessions  │  Brain  │  Config       │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Speech providers                        │
//! │        ElevenLabs  │  OpenAI TTS  │  Whisper         │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod brain;
pub mod config;
pub mod error;
pub mod voice;

pub use api::{ApiServer, ApiServerBuilder, ApiState};
pub use brain::{ChatRequest, ChatResponse, think};
pub use config::Config;
pub use error::{Error, Result};
