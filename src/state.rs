//! Application state shared by all handlers.
//!
//! This module owns:
//!   - the loaded configuration (prompts, generation backend, session timing)
//!   - the Gemini client template (one reqwest pool, per-session key cells)
//!   - the server-wide default key from the environment
//!
//! Nothing here is mutable after startup; per-user state lives in `Session`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::credentials::ApiKeySlot;
use crate::gemini::Gemini;
use crate::generator::QuestionGenerator;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub gemini: Gemini,
    /// Key from GEMINI_API_KEY / API_KEY, used by the stateless HTTP endpoint
    /// and to pre-fill every new session.
    pub default_key: ApiKeySlot,
}

impl AppState {
    /// Build state from env: load config, read the default key, init the Gemini client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(AppConfig::load(), ApiKeySlot::from_env())
    }

    pub fn with_config(config: AppConfig, default_key: ApiKeySlot) -> Result<Self, reqwest::Error> {
        let gemini = Gemini::new(&config.generation, config.prompts.clone(), default_key.clone())?;

        if default_key.is_present() {
            info!(target: "acegrammar", base_url = %gemini.base_url, model = %gemini.model, "Gemini enabled with server key.");
        } else {
            warn!(target: "acegrammar", model = %gemini.model, "No GEMINI_API_KEY/API_KEY set. Sessions must select a key.");
        }

        Ok(Self { config, gemini, default_key })
    }

    pub fn draft_dwell(&self) -> Duration {
        Duration::from_millis(self.config.session.draft_dwell_ms)
    }

    /// Fresh key cell for a new session, pre-filled with the server key.
    pub fn session_key(&self) -> ApiKeySlot {
        ApiKeySlot::new(self.default_key.get())
    }

    /// Generator bound to a session's key cell.
    pub fn generator_for(&self, key: ApiKeySlot) -> Arc<dyn QuestionGenerator> {
        Arc::new(self.gemini.with_key(key))
    }
}
