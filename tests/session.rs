//! End-to-end conversation sessions over a real WebSocket

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use swipebot_gateway::brain::{GREETING, PRICING_PITCH};
use swipebot_gateway::voice::SpeechSynthesizer;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

mod common;
use common::{FailingSynthesizer, FixedSynthesizer, FlakySynthesizer, build_test_server};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Start a server on an ephemeral port
async fn start_server(synthesizer: Arc<dyn SpeechSynthesizer>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = build_test_server(synthesizer);
    tokio::spawn(server.serve(listener));
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws/conversation"))
        .await
        .expect("websocket handshake failed");
    client
}

async fn say(client: &mut Client, text: &str) {
    let frame = serde_json::json!({ "type": "transcript", "text": text }).to_string();
    client.send(Message::text(frame)).await.unwrap();
}

/// Next text frame, parsed
async fn next_reply(client: &mut Client) -> serde_json::Value {
    loop {
        let msg = client.next().await.expect("stream ended").unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn pricing_question_gets_spoken_pitch() {
    let addr = start_server(Arc::new(FixedSynthesizer::default())).await;
    let mut client = connect(addr).await;

    say(&mut client, "What's the price?").await;
    let reply = next_reply(&mut client).await;

    assert_eq!(reply["type"], "response");
    assert_eq!(reply["text"], PRICING_PITCH);
    assert_eq!(reply["format"], "mp3");
    assert!(!reply["audio"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn replies_arrive_in_message_order() {
    let addr = start_server(Arc::new(FixedSynthesizer::default())).await;
    let mut client = connect(addr).await;

    say(&mut client, "").await;
    say(&mut client, "price").await;
    say(&mut client, "tell me more").await;

    assert_eq!(next_reply(&mut client).await["text"], GREETING);
    assert_eq!(next_reply(&mut client).await["text"], PRICING_PITCH);
    assert_eq!(
        next_reply(&mut client).await["text"],
        "Got it: 'tell me more'. Can you tell me a bit more so I can help best?"
    );
}

#[tokio::test]
async fn session_survives_synthesis_failure() {
    let addr = start_server(Arc::new(FlakySynthesizer::default())).await;
    let mut client = connect(addr).await;

    say(&mut client, "hello").await;
    let first = next_reply(&mut client).await;
    assert_eq!(first["type"], "error");
    assert_eq!(first["message"], "TTS generation failed: upstream 503");

    say(&mut client, "and the price?").await;
    let second = next_reply(&mut client).await;
    assert_eq!(second["type"], "response");
    assert_eq!(second["text"], PRICING_PITCH);
}

#[tokio::test]
async fn unknown_message_type_is_reported() {
    let addr = start_server(Arc::new(FixedSynthesizer::default())).await;
    let mut client = connect(addr).await;

    client
        .send(Message::text(r#"{"type":"audio_chunk","data":"AAAA"}"#))
        .await
        .unwrap();
    let reply = next_reply(&mut client).await;
    assert_eq!(reply["type"], "error");
    assert!(reply["message"].as_str().unwrap().contains("audio_chunk"));

    // Still open afterwards
    say(&mut client, "price").await;
    assert_eq!(next_reply(&mut client).await["type"], "response");
}

#[tokio::test]
async fn malformed_json_is_reported() {
    let addr = start_server(Arc::new(FixedSynthesizer::default())).await;
    let mut client = connect(addr).await;

    client.send(Message::text("{not json")).await.unwrap();
    let reply = next_reply(&mut client).await;
    assert_eq!(reply["type"], "error");
}

#[tokio::test]
async fn sessions_are_independent() {
    let addr = start_server(Arc::new(FailingSynthesizer("down"))).await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;

    say(&mut first, "hi").await;
    assert_eq!(next_reply(&mut first).await["type"], "error");

    first.close(None).await.unwrap();

    say(&mut second, "hi").await;
    assert_eq!(next_reply(&mut second).await["type"], "error");
}
