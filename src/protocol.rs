//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{Criterion, Difficulty, GrammarCategory, GrammarQuestion, OverallRating};
use crate::error::GenerationError;
use crate::render::ViewModel;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    SelectCategory {
        category: GrammarCategory,
    },
    SelectDifficulty {
        difficulty: Difficulty,
    },
    Generate,
    Reset,
    Choose {
        index: usize,
    },
    ToggleAnalysis,
    /// Ask the server-side host to start key selection.
    SelectKey,
    /// The browser's answer to `select_key`.
    ProvideKey {
        #[serde(rename = "apiKey")]
        api_key: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    View {
        view: ViewModel,
    },
    /// Open the key selection dialog.
    SelectKey,
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct QuestionIn {
    pub category: GrammarCategory,
    pub difficulty: Difficulty,
}

#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub question: GrammarQuestion,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    CredentialMissing,
    CredentialInvalid,
    Protocol,
    Upstream,
}

#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&GenerationError> for ErrorOut {
    fn from(e: &GenerationError) -> Self {
        let kind = match e {
            GenerationError::CredentialMissing => ErrorKind::CredentialMissing,
            GenerationError::CredentialInvalid(_) => ErrorKind::CredentialInvalid,
            GenerationError::Protocol(_) => ErrorKind::Protocol,
            GenerationError::Upstream { .. } => ErrorKind::Upstream,
        };
        ErrorOut { kind, message: e.user_message() }
    }
}

#[derive(Serialize)]
pub struct LabeledOption<T: Serialize> {
    pub value: T,
    pub label: &'static str,
}

#[derive(Serialize)]
pub struct DifficultyOption {
    pub value: Difficulty,
    pub label: &'static str,
    pub score_band: &'static str,
}

#[derive(Serialize)]
pub struct OptionsOut {
    pub categories: Vec<LabeledOption<GrammarCategory>>,
    pub difficulties: Vec<DifficultyOption>,
    pub criteria: Vec<LabeledOption<Criterion>>,
    pub ratings: Vec<LabeledOption<OverallRating>>,
}

impl OptionsOut {
    pub fn build() -> Self {
        Self {
            categories: GrammarCategory::ALL
                .iter()
                .map(|c| LabeledOption { value: *c, label: c.label() })
                .collect(),
            difficulties: Difficulty::ALL
                .iter()
                .map(|d| DifficultyOption { value: *d, label: d.label(), score_band: d.score_band() })
                .collect(),
            criteria: Criterion::ALL
                .iter()
                .map(|c| LabeledOption { value: *c, label: c.label() })
                .collect(),
            ratings: OverallRating::ALL
                .iter()
                .map(|r| LabeledOption { value: *r, label: r.label() })
                .collect(),
        }
    }
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub has_key: bool,
    pub model: String,
}
