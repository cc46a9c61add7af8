//! The seam between sessions and whatever produces questions.

use async_trait::async_trait;

use crate::domain::{Difficulty, GrammarCategory, GrammarQuestion};
use crate::error::GenerationError;

/// Drafts and self-reviews one question per call.
///
/// No caching and no retries: every call is one fresh generation, and a failed
/// call never yields a partial question.
#[async_trait]
pub trait QuestionGenerator: Send + Sync {
  async fn generate(
    &self,
    category: GrammarCategory,
    difficulty: Difficulty,
  ) -> Result<GrammarQuestion, GenerationError>;
}
