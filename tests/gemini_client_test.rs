//! Gemini client tests using wiremock.
//!
//! These verify the request shape, the single-request-per-call rule, and the
//! mapping of upstream failures to generation error kinds.

mod common;

use acegrammar::domain::{Difficulty, GrammarCategory};
use acegrammar::error::GenerationError;
use acegrammar::generator::QuestionGenerator;
use common::*;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_generate_success_parses_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", TEST_KEY))
        .and(body_partial_json(json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&question_payload().to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let q = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Relative, Difficulty::Standard)
        .await
        .expect("question");

    assert_eq!(q.choices.len(), 4);
    assert_eq!(q.correct_index, 2);
    assert_eq!(q.category, GrammarCategory::Relative);
    assert_eq!(q.difficulty, Difficulty::Standard);
}

#[tokio::test]
async fn test_user_prompt_carries_selection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&question_payload().to_string())))
        .mount(&server)
        .await;

    client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Subjunctive, Difficulty::Elite)
        .await
        .expect("question");

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let text = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(text.contains("項目: 仮定法"));
    assert!(text.contains("難易度: 最難関"));
}

#[tokio::test]
async fn test_entity_not_found_is_credential_invalid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Tense, Difficulty::Basic)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::CredentialInvalid(ref m) if m.contains("Requested entity was not found")));
}

#[tokio::test]
async fn test_rate_limit_is_upstream_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted (e.g. check quota).", "status": "RESOURCE_EXHAUSTED" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Tense, Difficulty::Basic)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        GenerationError::Upstream {
            status: Some(429),
            message: "Resource has been exhausted (e.g. check quota).".into()
        }
    );
}

#[tokio::test]
async fn test_server_error_with_plain_body_keeps_body_as_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("service unavailable"))
        .mount(&server)
        .await;

    let err = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Tense, Difficulty::Basic)
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::Upstream { status: Some(503), message: "service unavailable".into() });
}

#[tokio::test]
async fn test_server_error_with_empty_body_names_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Tense, Difficulty::Basic)
        .await
        .unwrap_err();
    match err {
        GenerationError::Upstream { status, message } => {
            assert_eq!(status, Some(500));
            assert!(message.contains("500"), "message was {:?}", message);
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_candidate_json_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope("{\"id\": \"q1\", \"choices\": [")))
        .mount(&server)
        .await;

    let err = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Tense, Difficulty::Basic)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Protocol(_)));
}

#[tokio::test]
async fn test_unreadable_envelope_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Tense, Difficulty::Basic)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Protocol(ref m) if m.contains("envelope")));
}

#[tokio::test]
async fn test_blocked_prompt_is_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = client(&server.uri(), Some(TEST_KEY))
        .generate(GrammarCategory::Tense, Difficulty::Basic)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::Protocol(ref m) if m.contains("SAFETY")));
}

#[tokio::test]
async fn test_identical_calls_are_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&question_payload().to_string())))
        .expect(2)
        .mount(&server)
        .await;

    let gemini = client(&server.uri(), Some(TEST_KEY));
    for _ in 0..2 {
        gemini.generate(GrammarCategory::Relative, Difficulty::Standard).await.expect("question");
    }
}

#[tokio::test]
async fn test_missing_key_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server.uri(), None)
        .generate(GrammarCategory::Relative, Difficulty::Standard)
        .await
        .unwrap_err();
    assert_eq!(err, GenerationError::CredentialMissing);
}
