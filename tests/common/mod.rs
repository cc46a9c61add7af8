//! Shared fixtures for integration tests.

#![allow(dead_code)]

use acegrammar::config::{GenerationCfg, Prompts};
use acegrammar::credentials::ApiKeySlot;
use acegrammar::gemini::Gemini;
use serde_json::{json, Value};

pub const TEST_KEY: &str = "test-key";
pub const TEST_MODEL: &str = "test-model";
pub const GENERATE_PATH: &str = "/v1beta/models/test-model:generateContent";

/// Well-formed question JSON as the model would produce it (answer at index 2).
pub fn question_payload() -> Value {
    let c = |score: u8| json!({ "score": score, "comment": "問題なし" });
    json!({
        "id": "q-rel-001",
        "category": "関係詞",
        "difficulty": "標準",
        "questionText": "This is the house ____ my grandfather was born.",
        "choices": ["which", "that", "where", "what"],
        "correctIndex": 2,
        "translation": "これは私の祖父が生まれた家です。",
        "explanation": "先行詞が場所で後ろが完全文なので関係副詞 where。",
        "analysis": {
            "academicLevel": c(85),
            "logicalConsistency": c(90),
            "uniquenessOfAnswer": c(95),
            "validityOfSolution": c(88),
            "educationalValue": c(80),
            "naturalness": c(92),
            "formatAppropriateness": c(90),
            "timeAppropriateness": c(85),
            "aiErrorDetection": c(100),
            "overallRating": "良問"
        }
    })
}

/// generateContent envelope wrapping `text` as the first candidate.
pub fn envelope(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 812, "candidatesTokenCount": 640, "totalTokenCount": 1452 }
    })
}

pub fn generation_cfg(server_uri: &str) -> GenerationCfg {
    GenerationCfg {
        base_url: format!("{}/v1beta", server_uri),
        model: TEST_MODEL.into(),
        request_timeout_secs: 5,
        ..Default::default()
    }
}

pub fn client(server_uri: &str, key: Option<&str>) -> Gemini {
    Gemini::new(
        &generation_cfg(server_uri),
        Prompts::default(),
        ApiKeySlot::new(key.map(str::to_string)),
    )
    .expect("client builds")
}
