//! Builds the single generate-and-review request sent to the model.
//!
//! Pure: the same prompts + model + selection always serialize to the same bytes.
//! The response schema forces one JSON object shaped like `GrammarQuestion`,
//! with all nine criteria and the closed rating set required.

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::config::Prompts;
use crate::domain::{Criterion, Difficulty, OverallRating, Selection, CHOICE_COUNT};
use crate::util::fill_template;

/// Body of a Gemini `models/{model}:generateContent` call.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
  pub system_instruction: Content,
  pub contents: Vec<Content>,
  pub generation_config: GenerationConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Content {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub role: Option<String>,
  pub parts: Vec<Part>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Part {
  pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
  pub response_mime_type: String,
  pub response_schema: Value,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub temperature: Option<f32>,
}

/// User turn: category, difficulty and the score-band legend.
pub fn user_prompt(prompts: &Prompts, selection: Selection) -> String {
  let bands = Difficulty::band_legend();
  fill_template(&prompts.user_template, &[
    ("category", selection.category.label()),
    ("difficulty", selection.difficulty.label()),
    ("bands", &bands),
  ])
}

pub fn build_request(prompts: &Prompts, selection: Selection, temperature: Option<f32>) -> GenerateContentRequest {
  GenerateContentRequest {
    system_instruction: Content {
      role: None,
      parts: vec![Part { text: prompts.system_instruction.clone() }],
    },
    contents: vec![Content {
      role: Some("user".into()),
      parts: vec![Part { text: user_prompt(prompts, selection) }],
    }],
    generation_config: GenerationConfig {
      response_mime_type: "application/json".into(),
      response_schema: response_schema(),
      temperature,
    },
  }
}

fn criterion_schema() -> Value {
  json!({
    "type": "OBJECT",
    "properties": {
      "score": { "type": "INTEGER" },
      "comment": { "type": "STRING" }
    },
    "required": ["score", "comment"]
  })
}

/// Structured-output schema in the provider's OpenAPI subset.
pub fn response_schema() -> Value {
  let mut analysis_props = Map::new();
  for c in Criterion::ALL {
    analysis_props.insert(c.wire_key().into(), criterion_schema());
  }
  let ratings: Vec<&str> = OverallRating::ALL.iter().map(|r| r.label()).collect();
  analysis_props.insert("overallRating".into(), json!({ "type": "STRING", "enum": ratings }));

  let mut analysis_required: Vec<&str> = Criterion::ALL.iter().map(|c| c.wire_key()).collect();
  analysis_required.push("overallRating");

  json!({
    "type": "OBJECT",
    "properties": {
      "id": { "type": "STRING" },
      "category": { "type": "STRING" },
      "difficulty": { "type": "STRING" },
      "questionText": { "type": "STRING", "description": "問題文（空欄は ____ で表現）" },
      "choices": {
        "type": "ARRAY",
        "items": { "type": "STRING" },
        "minItems": CHOICE_COUNT,
        "maxItems": CHOICE_COUNT,
        "description": "4つの選択肢"
      },
      "correctIndex": { "type": "INTEGER", "description": "正解のインデックス(0-3)" },
      "translation": { "type": "STRING", "description": "問題文の和訳" },
      "explanation": { "type": "STRING", "description": "詳しい解説" },
      "analysis": {
        "type": "OBJECT",
        "properties": Value::Object(analysis_props),
        "required": analysis_required
      }
    },
    "required": [
      "id", "category", "difficulty", "questionText", "choices",
      "correctIndex", "translation", "explanation", "analysis"
    ]
  })
}
