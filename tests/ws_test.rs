//! WebSocket tests: the router is served on an ephemeral port with the Gemini
//! endpoint mocked by wiremock, and a tungstenite client drives one session.

mod common;

use std::sync::Arc;
use std::time::Duration;

use acegrammar::config::{AppConfig, SessionCfg};
use acegrammar::credentials::ApiKeySlot;
use acegrammar::routes::build_router;
use acegrammar::state::AppState;
use common::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const BAD_KEY: &str = "revoked-key";

/// Serve the app with a short drafting dwell and return a connected client.
async fn connect(server_uri: &str, key: Option<&str>) -> Client {
    let config = AppConfig {
        generation: generation_cfg(server_uri),
        session: SessionCfg { draft_dwell_ms: 20 },
        ..Default::default()
    };
    let state = AppState::with_config(config, ApiKeySlot::new(key.map(str::to_string))).expect("state");
    let app = build_router(Arc::new(state));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    let (ws, _) = connect_async(format!("ws://{}/ws", addr)).await.expect("ws connect");
    ws
}

async fn send(ws: &mut Client, msg: Value) {
    ws.send(Message::Text(msg.to_string())).await.expect("ws send");
}

async fn send_raw(ws: &mut Client, txt: &str) {
    ws.send(Message::Text(txt.to_string())).await.expect("ws send");
}

/// Next JSON text frame from the server.
async fn recv(ws: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("server went quiet")
            .expect("stream ended")
            .expect("ws error");
        if let Message::Text(txt) = frame {
            return serde_json::from_str(&txt).expect("server sent JSON");
        }
    }
}

async fn recv_view(ws: &mut Client) -> Value {
    let msg = recv(ws).await;
    assert_eq!(msg["type"], "view", "expected a view, got {}", msg);
    msg["view"].clone()
}

/// Phases of the views pushed until the session leaves the loading states.
async fn phases_until_settled(ws: &mut Client) -> (Vec<String>, Value) {
    let mut phases = Vec::new();
    loop {
        let view = recv_view(ws).await;
        let phase = view["phase"].as_str().unwrap_or_default().to_string();
        phases.push(phase.clone());
        if phase != "drafting" && phase != "analyzing" {
            return (phases, view);
        }
    }
}

#[tokio::test]
async fn test_session_round_trip_to_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&question_payload().to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let mut ws = connect(&server.uri(), Some(TEST_KEY)).await;
    let view = recv_view(&mut ws).await;
    assert_eq!(view["phase"], "idle");
    assert_eq!(view["has_key"], true);

    send(&mut ws, json!({ "type": "ping" })).await;
    assert_eq!(recv(&mut ws).await["type"], "pong");

    send_raw(&mut ws, "not json").await;
    let err = recv(&mut ws).await;
    assert_eq!(err["type"], "error");
    assert!(err["message"].as_str().unwrap().contains("Invalid JSON"));

    send(&mut ws, json!({ "type": "select_category", "category": "関係詞" })).await;
    assert_eq!(recv_view(&mut ws).await["selection"]["category"], "関係詞");

    send(&mut ws, json!({ "type": "generate" })).await;
    let (phases, view) = phases_until_settled(&mut ws).await;
    assert_eq!(phases, vec!["drafting", "analyzing", "ready"]);
    assert_eq!(view["body"]["kind"], "question");
    assert_eq!(view["body"]["choices"][0]["mark"], "open");

    send(&mut ws, json!({ "type": "choose", "index": 0 })).await;
    let view = recv_view(&mut ws).await;
    assert_eq!(view["body"]["choices"][0]["mark"], "incorrect");
    assert_eq!(view["body"]["choices"][2]["mark"], "correct");
    assert_eq!(view["body"]["feedback"]["correct"], false);
}

#[tokio::test]
async fn test_rejected_key_is_dropped_until_a_new_one_arrives() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", BAD_KEY))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", TEST_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&question_payload().to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let mut ws = connect(&server.uri(), Some(BAD_KEY)).await;
    assert_eq!(recv_view(&mut ws).await["has_key"], true);

    send(&mut ws, json!({ "type": "generate" })).await;
    let (phases, view) = phases_until_settled(&mut ws).await;
    assert_eq!(phases, vec!["drafting", "analyzing", "error"]);
    assert_eq!(view["has_key"], false);
    assert!(view["body"]["message"].as_str().unwrap().contains("APIキーを再度選択"));

    // Retrying with the rejected key fails locally.
    send(&mut ws, json!({ "type": "generate" })).await;
    let (_, view) = phases_until_settled(&mut ws).await;
    assert_eq!(view["phase"], "error");
    assert!(view["body"]["message"].as_str().unwrap().contains("APIキーが選択されていません"));

    send(&mut ws, json!({ "type": "select_key" })).await;
    assert_eq!(recv(&mut ws).await["type"], "select_key");
    recv_view(&mut ws).await;

    send(&mut ws, json!({ "type": "provide_key", "apiKey": TEST_KEY })).await;
    assert_eq!(recv_view(&mut ws).await["has_key"], true);

    send(&mut ws, json!({ "type": "generate" })).await;
    let (_, view) = phases_until_settled(&mut ws).await;
    assert_eq!(view["phase"], "ready");
}
