//! Credential boundary: where the API key lives and how a session asks the
//! host to pick one.
//!
//! The host exposes two operations, "has a key been selected" and "open the
//! key selection UI". For a browser session the second one is a message asking
//! the page to show its dialog; the page answers with `provide_key`.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::protocol::ServerWsMessage;

/// Shared, per-session key cell. Blank keys count as absent.
#[derive(Clone, Default)]
pub struct ApiKeySlot {
  inner: Arc<RwLock<Option<String>>>,
}

impl ApiKeySlot {
  pub fn new(key: Option<String>) -> Self {
    let slot = Self::default();
    if let Some(k) = key {
      slot.set(k);
    }
    slot
  }

  /// Seed from GEMINI_API_KEY, falling back to API_KEY.
  pub fn from_env() -> Self {
    let key = std::env::var("GEMINI_API_KEY")
      .ok()
      .filter(|k| !k.trim().is_empty())
      .or_else(|| std::env::var("API_KEY").ok());
    Self::new(key)
  }

  pub fn get(&self) -> Option<String> {
    match self.inner.read() {
      Ok(g) => g.clone(),
      Err(poisoned) => poisoned.into_inner().clone(),
    }
  }

  pub fn set(&self, key: String) {
    let key = key.trim().to_string();
    let value = if key.is_empty() { None } else { Some(key) };
    match self.inner.write() {
      Ok(mut g) => *g = value,
      Err(poisoned) => *poisoned.into_inner() = value,
    }
  }

  pub fn clear(&self) {
    self.set(String::new());
  }

  pub fn is_present(&self) -> bool {
    self.get().is_some()
  }
}

// Never print the key itself.
impl std::fmt::Debug for ApiKeySlot {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ApiKeySlot").field("present", &self.is_present()).finish()
  }
}

/// Host capability injected into a session.
#[async_trait]
pub trait CredentialHost: Send + Sync {
  /// Has the user (or the environment) provided a key?
  async fn has_selected_key(&self) -> bool;

  /// Open the host's key selection UI. Assumed to succeed once invoked.
  async fn open_select_key(&self);

  /// Drop a key the upstream rejected, so the next call fails fast until a
  /// new one is selected.
  fn forget_key(&self);
}

/// Host for a WebSocket session: the browser owns the dialog.
pub struct BrowserKeyHost {
  slot: ApiKeySlot,
  outbound: UnboundedSender<ServerWsMessage>,
}

impl BrowserKeyHost {
  pub fn new(slot: ApiKeySlot, outbound: UnboundedSender<ServerWsMessage>) -> Self {
    Self { slot, outbound }
  }
}

#[async_trait]
impl CredentialHost for BrowserKeyHost {
  async fn has_selected_key(&self) -> bool {
    self.slot.is_present()
  }

  async fn open_select_key(&self) {
    debug!(target: "acegrammar", "Asking browser to open key selection");
    if self.outbound.send(ServerWsMessage::SelectKey).is_err() {
      warn!(target: "acegrammar", "Key selection request dropped: connection closed");
    }
  }

  fn forget_key(&self) {
    debug!(target: "acegrammar", "Dropping rejected key");
    self.slot.clear();
  }
}
