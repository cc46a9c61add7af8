//! WebSocket upgrade + session loop. One connection is one page lifetime:
//! it starts `idle` and its state is dropped on disconnect.
//!
//! Client messages are parsed as JSON and turned into session commands; the
//! session pushes `view` messages whenever its state changes.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};

use crate::credentials::BrowserKeyHost;
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::session::{Command, Session};
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "acegrammar", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "acegrammar", "WebSocket connected");

  let (out_tx, mut out_rx) = mpsc::unbounded_channel::<ServerWsMessage>();
  let key = state.session_key();
  let host = Arc::new(BrowserKeyHost::new(key.clone(), out_tx.clone()));
  let generator = state.generator_for(key.clone());
  let mut session = Session::start(generator, host, state.draft_dwell(), out_tx.clone()).await;

  loop {
    tokio::select! {
      incoming = socket.recv() => {
        let txt = match incoming {
          Some(Ok(Message::Text(txt))) => txt,
          Some(Ok(Message::Ping(payload))) => { let _ = socket.send(Message::Pong(payload)).await; continue; }
          Some(Ok(Message::Close(_))) | None => break,
          Some(Err(e)) => { error!(target: "acegrammar", error = %e, "WS receive error"); break; }
          Some(Ok(_)) => continue,
        };
        match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(msg) => {
            debug!(target: "acegrammar", "WS received: {:?}", msg_kind(&msg));
            match to_command(msg, &key) {
              Some(cmd) => session.handle(cmd).await,
              None => { let _ = out_tx.send(ServerWsMessage::Pong); }
            }
          }
          Err(e) => { let _ = out_tx.send(ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) }); }
        }
      }
      Some(ev) = session.next_event() => session.on_event(ev),
      Some(out) = out_rx.recv() => {
        let txt = serde_json::to_string(&out).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });
        if let Err(e) = socket.send(Message::Text(txt)).await {
          error!(target: "acegrammar", error = %e, "WS send error");
          break;
        }
      }
    }
  }
  info!(target: "acegrammar", "WebSocket disconnected");
}

/// Map a client message to a session command. `None` means "answer with pong".
/// A provided key is stored in the session's slot before the command runs.
fn to_command(msg: ClientWsMessage, key: &crate::credentials::ApiKeySlot) -> Option<Command> {
  match msg {
    ClientWsMessage::Ping => None,
    ClientWsMessage::SelectCategory { category } => Some(Command::SelectCategory(category)),
    ClientWsMessage::SelectDifficulty { difficulty } => Some(Command::SelectDifficulty(difficulty)),
    ClientWsMessage::Generate => Some(Command::Generate),
    ClientWsMessage::Reset => Some(Command::Reset),
    ClientWsMessage::Choose { index } => Some(Command::Choose(index)),
    ClientWsMessage::ToggleAnalysis => Some(Command::ToggleAnalysis),
    ClientWsMessage::SelectKey => Some(Command::SelectKey),
    ClientWsMessage::ProvideKey { api_key } => {
      key.set(api_key);
      Some(Command::KeyProvided)
    }
  }
}

// Debug output without the key.
fn msg_kind(msg: &ClientWsMessage) -> &'static str {
  match msg {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::SelectCategory { .. } => "select_category",
    ClientWsMessage::SelectDifficulty { .. } => "select_difficulty",
    ClientWsMessage::Generate => "generate",
    ClientWsMessage::Reset => "reset",
    ClientWsMessage::Choose { .. } => "choose",
    ClientWsMessage::ToggleAnalysis => "toggle_analysis",
    ClientWsMessage::SelectKey => "select_key",
    ClientWsMessage::ProvideKey { .. } => "provide_key",
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::credentials::ApiKeySlot;

  #[test]
  fn provide_key_fills_the_slot() {
    let key = ApiKeySlot::default();
    let cmd = to_command(ClientWsMessage::ProvideKey { api_key: "abc".into() }, &key);
    assert_eq!(cmd, Some(Command::KeyProvided));
    assert_eq!(key.get().as_deref(), Some("abc"));
  }

  #[test]
  fn ping_maps_to_pong() {
    assert_eq!(to_command(ClientWsMessage::Ping, &ApiKeySlot::default()), None);
  }
}
