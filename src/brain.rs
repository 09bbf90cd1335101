//! Rule-based response generator
//!
//! Maps a chat request to a reply and an intent tag. Rules are a strict
//! priority chain: the first rule that matches produces the reply.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persona prompt for an LLM-backed responder; the rule chain below ignores it
pub const SYSTEM_PROMPT: &str = "You are SwipeBot, a polite, concise, persuasive voice sales agent. \
Gather requirements, recommend products, overcome objections, and help close the sale. \
You can ask clarifying questions.";

/// Reply for empty or whitespace-only input
pub const GREETING: &str = "Hi! How can I help today?";

/// Reply for anything mentioning price
pub const PRICING_PITCH: &str =
    "Our plans start at $29/mo and scale with usage. Want a quick rundown?";

/// Inbound chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    pub text: String,
    /// Opaque caller context, passed through untouched
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

impl ChatRequest {
    /// Request carrying only text
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            user_id: None,
            text: text.into(),
            context: None,
        }
    }
}

/// Generated reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    #[serde(default)]
    pub meta: Option<Map<String, Value>>,
}

impl ChatResponse {
    fn tagged(reply: String, key: &str, value: &str) -> Self {
        let mut meta = Map::new();
        meta.insert(key.to_string(), Value::String(value.to_string()));
        Self {
            reply,
            meta: Some(meta),
        }
    }

    /// Value of the `intent` tag, if the reply carries one
    #[must_use]
    pub fn intent(&self) -> Option<&str> {
        self.meta_str("intent")
    }

    /// Value of the `policy` tag, if the reply carries one
    #[must_use]
    pub fn policy(&self) -> Option<&str> {
        self.meta_str("policy")
    }

    fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.as_ref()?.get(key)?.as_str()
    }
}

/// Produce the reply for a request
///
/// Pure and total: identical input text always yields an identical reply.
#[must_use]
pub fn think(request: &ChatRequest) -> ChatResponse {
    let user_text = request.text.trim();

    if user_text.is_empty() {
        return ChatResponse::tagged(GREETING.to_string(), "policy", "fallback");
    }

    if user_text.to_lowercase().contains("price") {
        return ChatResponse::tagged(PRICING_PITCH.to_string(), "intent", "pricing");
    }

    ChatResponse::tagged(
        format!("Got it: '{user_text}'. Can you tell me a bit more so I can help best?"),
        "intent",
        "clarify",
    )
}
