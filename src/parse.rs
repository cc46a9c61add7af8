//! Turning the model's JSON text into a validated `GrammarQuestion`.

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::domain::{GrammarQuestion, QuestionAnalysis, Selection, CHOICE_COUNT};
use crate::error::GenerationError;
use crate::util::count_blanks;

/// Shape the model is asked to return. Category/difficulty are echoed as plain
/// strings; the request's own selection is authoritative.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
  #[serde(default)]
  id: String,
  #[serde(default)]
  category: String,
  #[serde(default)]
  difficulty: String,
  question_text: String,
  choices: Vec<String>,
  correct_index: i64,
  translation: String,
  explanation: String,
  analysis: QuestionAnalysis,
}

/// Parse and validate. Any schema violation is a `Protocol` error; no partial
/// question is ever returned.
pub fn question_from_json(text: &str, selection: Selection) -> Result<GrammarQuestion, GenerationError> {
  let raw: RawQuestion = serde_json::from_str(text.trim())
    .map_err(|e| GenerationError::Protocol(format!("JSON parse error: {}", e)))?;

  let choices: [String; CHOICE_COUNT] = raw.choices.try_into().map_err(|v: Vec<String>| {
    GenerationError::Protocol(format!("expected {} choices, got {}", CHOICE_COUNT, v.len()))
  })?;

  let correct_index = usize::try_from(raw.correct_index)
    .ok()
    .filter(|i| *i < CHOICE_COUNT)
    .ok_or_else(|| GenerationError::Protocol(format!("correctIndex {} out of range", raw.correct_index)))?;

  let blanks = count_blanks(&raw.question_text);
  if blanks != 1 {
    return Err(GenerationError::Protocol(format!("question text has {} blanks, expected 1", blanks)));
  }

  if let Some((c, s)) = raw.analysis.iter().find(|(_, s)| s.score > 100) {
    return Err(GenerationError::Protocol(format!("{} score {} exceeds 100", c.wire_key(), s.score)));
  }

  if raw.category != selection.category.label() || raw.difficulty != selection.difficulty.label() {
    warn!(
      target: "question",
      requested_category = %selection.category,
      requested_difficulty = %selection.difficulty,
      echoed_category = %raw.category,
      echoed_difficulty = %raw.difficulty,
      "Model echoed a different selection; keeping the requested one"
    );
  }

  let id = if raw.id.trim().is_empty() { Uuid::new_v4().to_string() } else { raw.id };

  Ok(GrammarQuestion {
    id,
    category: selection.category,
    difficulty: selection.difficulty,
    question_text: raw.question_text,
    choices,
    correct_index,
    translation: raw.translation,
    explanation: raw.explanation,
    analysis: raw.analysis,
  })
}
