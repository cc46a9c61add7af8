//! Minimal Gemini client for our one use-case.
//!
//! We only call `models/{model}:generateContent` with a structured-output schema.
//! Calls are instrumented and log model name, latency, and token usage (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::config::{GenerationCfg, Prompts};
use crate::credentials::ApiKeySlot;
use crate::domain::{Difficulty, GrammarCategory, GrammarQuestion, Selection};
use crate::error::GenerationError;
use crate::generator::QuestionGenerator;
use crate::parse::question_from_json;
use crate::prompt::build_request;
use crate::util::trunc_for_log;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub key: ApiKeySlot,
  pub base_url: String,
  pub model: String,
  pub temperature: Option<f32>,
  pub prompts: Prompts,
}

impl Gemini {
  /// Build the client. The key slot is read on every call, so a key chosen
  /// later in the session is picked up without rebuilding.
  pub fn new(cfg: &GenerationCfg, prompts: Prompts, key: ApiKeySlot) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.request_timeout_secs))
      .build()?;
    Ok(Self {
      client,
      key,
      base_url: cfg.base_url.trim_end_matches('/').to_string(),
      model: cfg.model.clone(),
      temperature: cfg.temperature,
      prompts,
    })
  }

  /// Same client and settings, different key cell (one per session).
  pub fn with_key(&self, key: ApiKeySlot) -> Self {
    Self { key, ..self.clone() }
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }

  /// One structured-output call returning the raw JSON text of the first candidate.
  #[instrument(level = "info", skip(self, api_key), fields(model = %self.model))]
  async fn generate_json(&self, api_key: &str, selection: Selection) -> Result<String, GenerationError> {
    let req = build_request(&self.prompts, selection, self.temperature);

    let res = self.client.post(self.endpoint())
      .header(USER_AGENT, "acegrammar/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, api_key)
      .json(&req).send().await
      .map_err(|e| GenerationError::Upstream { status: None, message: transport_message(&e) })?;

    if !res.status().is_success() {
      let status = res.status();
      let msg = match res.text().await {
        Ok(body) => extract_gemini_error(&body).unwrap_or(body),
        Err(e) => format!("error body unreadable: {}", transport_message(&e)),
      };
      let msg = if msg.trim().is_empty() { format!("HTTP {}", status) } else { msg };
      return Err(GenerationError::from_upstream(Some(status.as_u16()), msg));
    }

    let body = res.text().await
      .map_err(|e| GenerationError::Upstream { status: None, message: transport_message(&e) })?;
    let envelope: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
      GenerationError::Protocol(format!("unreadable response envelope: {} ({})", e, trunc_for_log(&body, 120)))
    })?;

    if let Some(usage) = &envelope.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        candidates_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }

    let text: String = envelope.candidates.first()
      .and_then(|c| c.content.as_ref())
      .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
      .unwrap_or_default();

    if text.trim().is_empty() {
      let reason = envelope.candidates.first()
        .and_then(|c| c.finish_reason.clone())
        .or_else(|| envelope.prompt_feedback.and_then(|f| f.block_reason))
        .unwrap_or_else(|| "no candidates".into());
      return Err(GenerationError::Protocol(format!("empty candidate text ({})", reason)));
    }

    debug!(preview = %trunc_for_log(&text, 80), "Candidate text received");
    Ok(text)
  }
}

#[async_trait]
impl QuestionGenerator for Gemini {
  #[instrument(level = "info", skip(self), fields(%category, %difficulty, model = %self.model))]
  async fn generate(
    &self,
    category: GrammarCategory,
    difficulty: Difficulty,
  ) -> Result<GrammarQuestion, GenerationError> {
    let api_key = self.key.get().ok_or(GenerationError::CredentialMissing)?;
    let selection = Selection { category, difficulty };

    let start = Instant::now();
    let result = self.generate_json(&api_key, selection).await
      .and_then(|text| question_from_json(&text, selection));
    let elapsed = start.elapsed();

    match &result {
      Ok(q) => info!(
        target: "question",
        ?elapsed,
        question_id = %q.id,
        rating = q.analysis.overall_rating.label(),
        text_preview = %trunc_for_log(&q.question_text, 40),
        "Question generated"
      ),
      Err(e) => error!(target: "question", ?elapsed, error = %e, "Question generation failed"),
    }
    result
  }
}

fn transport_message(e: &reqwest::Error) -> String {
  if e.is_timeout() {
    format!("request timed out: {}", e)
  } else {
    e.to_string()
  }
}

// --- Response DTOs ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default)]
  prompt_feedback: Option<PromptFeedback>,
  #[serde(default)]
  usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  #[serde(default)] content: Option<CandidateContent>,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<CandidatePart> }
#[derive(Deserialize)]
struct CandidatePart { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback { #[serde(default)] block_reason: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extracts_message_from_error_body() {
    let body = r#"{"error":{"code":404,"message":"Requested entity was not found.","status":"NOT_FOUND"}}"#;
    assert_eq!(extract_gemini_error(body).as_deref(), Some("Requested entity was not found."));
    assert_eq!(extract_gemini_error("<html>bad gateway</html>"), None);
  }

  #[test]
  fn endpoint_joins_base_and_model() {
    let cfg = GenerationCfg { base_url: "http://localhost:9/v1beta/".into(), ..Default::default() };
    let g = Gemini::new(&cfg, Prompts::default(), ApiKeySlot::default()).unwrap();
    assert_eq!(g.endpoint(), "http://localhost:9/v1beta/models/gemini-3-pro-preview:generateContent");
  }

  #[tokio::test]
  async fn missing_key_fails_before_any_request() {
    // Port 9 (discard) would error as Upstream if a request were attempted.
    let cfg = GenerationCfg { base_url: "http://127.0.0.1:9".into(), ..Default::default() };
    let g = Gemini::new(&cfg, Prompts::default(), ApiKeySlot::default()).unwrap();
    let err = g.generate(GrammarCategory::Tense, Difficulty::Basic).await.unwrap_err();
    assert_eq!(err, GenerationError::CredentialMissing);
  }
}
