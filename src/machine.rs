//! View state machine: `idle → drafting → analyzing → {ready | error}`.
//!
//! Pure and synchronous. Timers and network calls live in `session`; they
//! report back here with the ticket they were started for, and anything
//! carrying an outdated ticket is dropped.

use tracing::debug;

use crate::domain::{Difficulty, GrammarCategory, GrammarQuestion, Selection};
use crate::error::GenerationError;

/// Ready question plus the learner's local interaction with it.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveQuestion {
  pub question: GrammarQuestion,
  pub selected: Option<usize>,
  pub show_explanation: bool,
  pub show_analysis: bool,
}

impl ActiveQuestion {
  fn new(question: GrammarQuestion) -> Self {
    Self { question, selected: None, show_explanation: false, show_analysis: false }
  }
}

/// Exactly one of question / error message, never both.
#[derive(Clone, Debug, PartialEq)]
pub enum ViewState {
  Idle,
  Drafting,
  Analyzing,
  Ready(Box<ActiveQuestion>),
  Error(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Idle,
  Drafting,
  Analyzing,
  Ready,
  Error,
}

impl ViewState {
  pub fn phase(&self) -> Phase {
    match self {
      ViewState::Idle => Phase::Idle,
      ViewState::Drafting => Phase::Drafting,
      ViewState::Analyzing => Phase::Analyzing,
      ViewState::Ready(_) => Phase::Ready,
      ViewState::Error(_) => Phase::Error,
    }
  }
}

/// Handle for one generation attempt; the selection is frozen inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
  pub id: u64,
  pub selection: Selection,
}

pub type Outcome = Result<GrammarQuestion, GenerationError>;

/// What a choice click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChoiceResult {
  pub index: usize,
  pub correct: bool,
}

#[derive(Debug, Default)]
pub struct ViewMachine {
  state: ViewState,
  selection: Selection,
  current: u64,
  // Result that arrived before the drafting dwell elapsed.
  pending: Option<Outcome>,
}

impl Default for ViewState {
  fn default() -> Self { ViewState::Idle }
}

impl ViewMachine {
  pub fn state(&self) -> &ViewState {
    &self.state
  }

  pub fn selection(&self) -> Selection {
    self.selection
  }

  /// A generation is in flight; selection and generate are locked.
  pub fn is_busy(&self) -> bool {
    matches!(self.state, ViewState::Drafting | ViewState::Analyzing)
  }

  pub fn select_category(&mut self, category: GrammarCategory) -> bool {
    if self.is_busy() {
      return false;
    }
    self.selection.category = category;
    true
  }

  pub fn select_difficulty(&mut self, difficulty: Difficulty) -> bool {
    if self.is_busy() {
      return false;
    }
    self.selection.difficulty = difficulty;
    true
  }

  /// Enter `drafting`. Returns `None` (no-op) while another generation runs.
  pub fn generate(&mut self) -> Option<Ticket> {
    if self.is_busy() {
      debug!(target: "question", "Generate ignored: request already in flight");
      return None;
    }
    self.current += 1;
    self.pending = None;
    self.state = ViewState::Drafting;
    Some(Ticket { id: self.current, selection: self.selection })
  }

  /// `ticket` belongs to the generation currently in flight.
  pub fn is_live(&self, ticket: u64) -> bool {
    ticket == self.current && self.is_busy()
  }

  /// Drafting dwell is over: move to `analyzing`. A result that came in
  /// early stays held until `apply_pending`. Returns whether the state changed.
  pub fn dwell_elapsed(&mut self, ticket: u64) -> bool {
    if !self.is_live(ticket) || self.state != ViewState::Drafting {
      debug!(target: "question", ticket, "Stale dwell timer dropped");
      return false;
    }
    self.state = ViewState::Analyzing;
    true
  }

  /// Apply a result held during `drafting`. No-op outside `analyzing`.
  pub fn apply_pending(&mut self) -> bool {
    if self.state != ViewState::Analyzing {
      return false;
    }
    match self.pending.take() {
      Some(outcome) => {
        self.apply(outcome);
        true
      }
      None => false,
    }
  }

  /// The generation call finished. Applied in `analyzing`, held in `drafting`,
  /// dropped when the ticket is stale. Returns whether the state changed.
  pub fn resolve(&mut self, ticket: u64, outcome: Outcome) -> bool {
    if !self.is_live(ticket) {
      debug!(target: "question", ticket, current = self.current, "Stale generation result dropped");
      return false;
    }
    if self.state == ViewState::Drafting {
      self.pending = Some(outcome);
      return false;
    }
    self.apply(outcome);
    true
  }

  fn apply(&mut self, outcome: Outcome) {
    self.state = match outcome {
      Ok(q) => ViewState::Ready(Box::new(ActiveQuestion::new(q))),
      Err(e) => ViewState::Error(e.user_message()),
    };
  }

  /// Back to `idle` from anywhere. Any in-flight result is discarded on arrival.
  pub fn reset(&mut self) {
    self.current += 1;
    self.pending = None;
    self.state = ViewState::Idle;
  }

  /// Pick an answer. Only the first pick counts.
  pub fn choose(&mut self, index: usize) -> Option<ChoiceResult> {
    let ViewState::Ready(active) = &mut self.state else { return None };
    if active.selected.is_some() || index >= active.question.choices.len() {
      return None;
    }
    active.selected = Some(index);
    active.show_explanation = true;
    Some(ChoiceResult { index, correct: active.question.is_correct(index) })
  }

  pub fn toggle_analysis(&mut self) -> bool {
    let ViewState::Ready(active) = &mut self.state else { return false };
    active.show_analysis = !active.show_analysis;
    true
  }
}
