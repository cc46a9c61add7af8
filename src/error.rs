//! Failure kinds of a question generation.
//!
//! Every kind is caught at the generation boundary and turned into the `error`
//! view with a localized message. Nothing here is fatal to the process.

use thiserror::Error;

/// Phrase the upstream uses when the key's project can't be resolved.
pub const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
  /// No key selected; raised before any network call.
  #[error("API key is not set")]
  CredentialMissing,

  /// Upstream rejected the key/project. The user must pick a key again.
  #[error("credential rejected: {0}")]
  CredentialInvalid(String),

  /// Upstream answered, but not with a usable question.
  #[error("malformed upstream response: {0}")]
  Protocol(String),

  /// Anything else: rate limit, server error, timeout, transport.
  #[error("upstream error{}: {message}", status_suffix(.status))]
  Upstream { status: Option<u16>, message: String },
}

fn status_suffix(status: &Option<u16>) -> String {
  status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

impl GenerationError {
  /// Classify an upstream rejection message.
  pub fn from_upstream(status: Option<u16>, message: String) -> Self {
    if message.contains(ENTITY_NOT_FOUND) {
      GenerationError::CredentialInvalid(message)
    } else {
      GenerationError::Upstream { status, message }
    }
  }

  /// True for the kinds after which the user should (re)select a key.
  pub fn needs_key_selection(&self) -> bool {
    matches!(self, GenerationError::CredentialMissing | GenerationError::CredentialInvalid(_))
  }

  /// Message shown in the error view.
  pub fn user_message(&self) -> String {
    match self {
      GenerationError::CredentialMissing => {
        "APIキーが選択されていません。APIキーを選択してから再度お試しください。".into()
      }
      GenerationError::CredentialInvalid(_) => {
        "APIキーが見つかりませんでした。有料プロジェクトのAPIキーを再度選択してください。".into()
      }
      GenerationError::Protocol(_) => {
        "AIからの応答を正しく読み取れませんでした。もう一度お試しください。".into()
      }
      GenerationError::Upstream { message, .. } => {
        format!("問題生成サービスでエラーが発生しました: {}", message)
      }
    }
  }
}
