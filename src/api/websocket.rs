//! WebSocket conversation sessions
//!
//! Each connection runs one [`ConversationSession`]. A session reads
//! transcripts in arrival order, replies to each with synthesized speech, and
//! reports per-message failures as `error` frames without leaving the `Open`
//! state. Only a disconnect or a socket fault closes it.

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
    routing::get,
};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::ApiState;
use super::voice::AudioResponse;
use crate::brain::{self, ChatRequest};
use crate::{Error, Result};

/// Message types a client may send
const KNOWN_MESSAGE_TYPES: &[&str] = &["transcript"];

/// Incoming WebSocket message from client
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionMessage {
    /// Text heard from the user
    Transcript { text: String },
}

impl SessionMessage {
    /// Decode a text frame
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for malformed payloads and
    /// [`Error::UnrecognizedMessageType`] for a `type` outside the known set
    pub fn decode(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| Error::Validation(format!("malformed JSON: {e}")))?;

        let kind = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Validation("missing string field `type`".to_string()))?;

        if !KNOWN_MESSAGE_TYPES.contains(&kind) {
            return Err(Error::UnrecognizedMessageType(kind.to_string()));
        }

        serde_json::from_value(value).map_err(|e| Error::Validation(e.to_string()))
    }
}

/// Outgoing WebSocket message to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionReply {
    /// Spoken reply to a transcript
    Response {
        text: String,
        /// Base64-encoded audio
        audio: String,
        format: String,
    },
    /// The triggering message could not be answered
    Error { message: String },
}

impl SessionReply {
    fn from_error(err: &Error) -> Self {
        let message = match err {
            Error::Synthesis(reason) => format!("TTS generation failed: {reason}"),
            other => other.to_string(),
        };
        Self::Error { message }
    }

    fn encode(&self) -> Result<Message> {
        Ok(Message::Text(serde_json::to_string(self)?.into()))
    }
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Accepting messages
    Open,
    /// Connection torn down; terminal
    Closed,
}

/// Counters reported when a session ends
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    /// Text frames processed, successful or not
    pub messages_handled: u64,
    /// `error` frames delivered
    pub errors_sent: u64,
}

/// What to do after reading one frame
enum Step {
    Reply(SessionReply),
    Skip,
    Close,
}

/// One persistent conversation bound to one connection
pub struct ConversationSession {
    id: Uuid,
    state: SessionState,
    api: Arc<ApiState>,
    summary: SessionSummary,
}

impl ConversationSession {
    /// Create a session in the `Open` state
    #[must_use]
    pub fn new(api: Arc<ApiState>) -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Open,
            api,
            summary: SessionSummary::default(),
        }
    }

    /// Session identifier used in logs
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Drive the session until the peer disconnects or the socket faults
    ///
    /// Messages are handled strictly one at a time: the next frame is not
    /// read until the previous reply has been written.
    pub async fn run<S, R, E>(mut self, mut sender: S, mut receiver: R) -> SessionSummary
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
        R: Stream<Item = std::result::Result<Message, E>> + Unpin,
        E: Display,
    {
        tracing::info!(session_id = %self.id, "conversation session opened");

        while self.state == SessionState::Open {
            let step = match receiver.next().await {
                None => {
                    tracing::info!(session_id = %self.id, "peer disconnected");
                    Step::Close
                }
                Some(Err(e)) => {
                    tracing::warn!(session_id = %self.id, error = %e, "socket read failed");
                    if let Err(e) = sender.send(Message::Close(None)).await {
                        tracing::debug!(session_id = %self.id, error = %e, "close frame not delivered");
                    }
                    Step::Close
                }
                Some(Ok(message)) => self.handle_frame(message).await,
            };

            match step {
                Step::Reply(reply) => self.deliver(&mut sender, &reply).await,
                Step::Skip => {}
                Step::Close => self.state = SessionState::Closed,
            }
        }

        tracing::info!(
            session_id = %self.id,
            messages = self.summary.messages_handled,
            errors = self.summary.errors_sent,
            "conversation session closed"
        );

        self.summary
    }

    async fn handle_frame(&mut self, message: Message) -> Step {
        match message {
            Message::Text(text) => {
                self.summary.messages_handled += 1;
                Step::Reply(self.answer(text.as_str()).await)
            }
            Message::Binary(data) => {
                self.summary.messages_handled += 1;
                tracing::warn!(session_id = %self.id, len = data.len(), "binary frame rejected");
                Step::Reply(SessionReply::from_error(&Error::Validation(
                    "binary frames are not supported".to_string(),
                )))
            }
            Message::Ping(data) => {
                // axum answers pings itself
                tracing::trace!(len = data.len(), "received ping");
                Step::Skip
            }
            Message::Pong(_) => Step::Skip,
            Message::Close(frame) => {
                tracing::info!(session_id = %self.id, ?frame, "session closed by client");
                Step::Close
            }
        }
    }

    /// Reply to one text frame; failures become `error` replies
    async fn answer(&self, raw: &str) -> SessionReply {
        match self.respond(raw).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(session_id = %self.id, error = %e, "message failed");
                SessionReply::from_error(&e)
            }
        }
    }

    async fn respond(&self, raw: &str) -> Result<SessionReply> {
        let SessionMessage::Transcript { text } = SessionMessage::decode(raw)?;

        let response = brain::think(&ChatRequest::from_text(text));
        tracing::debug!(
            session_id = %self.id,
            intent = ?response.intent(),
            policy = ?response.policy(),
            "generated reply"
        );

        let request = self.api.synthesis_request(response.reply, None, None);
        let audio = self.api.synthesize(&request).await?;
        let AudioResponse { audio, format } = AudioResponse::from(&audio);

        Ok(SessionReply::Response {
            text: request.text,
            audio,
            format,
        })
    }

    /// Write a reply; a failed write closes the session without retrying
    async fn deliver<S>(&mut self, sender: &mut S, reply: &SessionReply)
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
    {
        let frame = match reply.encode() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(session_id = %self.id, error = %e, "failed to encode reply");
                return;
            }
        };

        match sender.send(frame).await {
            Ok(()) => {
                if matches!(reply, SessionReply::Error { .. }) {
                    self.summary.errors_sent += 1;
                }
            }
            Err(e) => {
                let err = Error::Transport(e.to_string());
                tracing::warn!(session_id = %self.id, error = %err, "socket write failed");
                self.state = SessionState::Closed;
            }
        }
    }
}

/// Build WebSocket router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/conversation", get(ws_upgrade))
        .with_state(state)
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let (sender, receiver) = socket.split();
    ConversationSession::new(state).run(sender, receiver).await;
}
