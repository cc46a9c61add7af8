//! HTTP endpoint handlers. These are thin wrappers that forward to the generator.
//! Each handler is instrumented and logs parameters and basic result info.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::error::GenerationError;
use crate::generator::QuestionGenerator;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut {
    ok: true,
    has_key: state.default_key.is_present(),
    model: state.gemini.model.clone(),
  })
}

#[instrument(level = "info")]
pub async fn http_get_options() -> impl IntoResponse {
  Json(OptionsOut::build())
}

/// One-shot generation with the server key. No session, no dwell.
#[instrument(level = "info", skip(state, body), fields(category = %body.category, difficulty = %body.difficulty))]
pub async fn http_post_question(
  State(state): State<Arc<AppState>>,
  Json(body): Json<QuestionIn>,
) -> impl IntoResponse {
  match state.gemini.generate(body.category, body.difficulty).await {
    Ok(question) => {
      info!(target: "question", id = %question.id, "HTTP question served");
      (StatusCode::OK, Json(QuestionOut { question })).into_response()
    }
    Err(e) => {
      info!(target: "question", error = %e, "HTTP question failed");
      (status_for(&e), Json(ErrorOut::from(&e))).into_response()
    }
  }
}

fn status_for(e: &GenerationError) -> StatusCode {
  match e {
    GenerationError::CredentialMissing | GenerationError::CredentialInvalid(_) => StatusCode::UNAUTHORIZED,
    GenerationError::Protocol(_) => StatusCode::UNPROCESSABLE_ENTITY,
    GenerationError::Upstream { .. } => StatusCode::BAD_GATEWAY,
  }
}
