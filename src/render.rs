//! Presentation: session data → serializable view model. No decisions are
//! made here beyond what to show for the current state.

use serde::Serialize;

use crate::domain::{Criterion, Difficulty, GrammarCategory, OverallRating, Selection};
use crate::machine::{ActiveQuestion, Phase, ViewMachine, ViewState};

#[derive(Clone, Debug, Serialize)]
pub struct ViewModel {
  pub phase: Phase,
  pub selection: Selection,
  /// Category/difficulty pickers and the generate button.
  pub controls_enabled: bool,
  pub has_key: bool,
  pub body: ViewBody,
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewBody {
  Idle,
  Loading { steps: Vec<LoadingStep> },
  Question(QuestionCard),
  Error { message: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
  Pending,
  Active,
  Done,
}

#[derive(Clone, Debug, Serialize)]
pub struct LoadingStep {
  pub label: &'static str,
  pub description: &'static str,
  pub status: StepStatus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceMark {
  /// Nothing picked yet.
  Open,
  Correct,
  Incorrect,
  Dimmed,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChoiceView {
  pub number: usize,
  pub text: String,
  pub mark: ChoiceMark,
}

#[derive(Clone, Debug, Serialize)]
pub struct Feedback {
  pub correct: bool,
  pub headline: &'static str,
  pub translation: String,
  pub explanation: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct CriterionView {
  pub key: Criterion,
  pub label: String,
  pub score: u8,
  pub comment: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnalysisPanel {
  pub overall_rating: OverallRating,
  pub expanded: bool,
  /// Only filled while expanded.
  pub criteria: Vec<CriterionView>,
}

#[derive(Clone, Debug, Serialize)]
pub struct QuestionCard {
  pub id: String,
  pub category: GrammarCategory,
  pub difficulty: Difficulty,
  pub question_text: String,
  pub choices: Vec<ChoiceView>,
  pub feedback: Option<Feedback>,
  pub analysis: AnalysisPanel,
}

pub fn render(machine: &ViewMachine, has_key: bool) -> ViewModel {
  let state = machine.state();
  let body = match state {
    ViewState::Idle => ViewBody::Idle,
    ViewState::Drafting | ViewState::Analyzing => ViewBody::Loading { steps: loading_steps(state.phase()) },
    ViewState::Ready(active) => ViewBody::Question(question_card(active)),
    ViewState::Error(message) => ViewBody::Error { message: message.clone() },
  };
  ViewModel {
    phase: state.phase(),
    selection: machine.selection(),
    controls_enabled: !machine.is_busy(),
    has_key,
    body,
  }
}

fn loading_steps(phase: Phase) -> Vec<LoadingStep> {
  let (draft, review) = match phase {
    Phase::Drafting => (StepStatus::Active, StepStatus::Pending),
    _ => (StepStatus::Done, StepStatus::Active),
  };
  vec![
    LoadingStep { label: "ドラフト問題の生成", description: "文脈と文法ポイントの構築中...", status: draft },
    LoadingStep { label: "9項目の厳格な品質分析", description: "論理・難易度・自然さをチェック...", status: review },
    LoadingStep { label: "最終的な洗練と校正", description: "「良問」としての最終調整...", status: StepStatus::Pending },
  ]
}

pub fn choice_mark(active: &ActiveQuestion, index: usize) -> ChoiceMark {
  match active.selected {
    None => ChoiceMark::Open,
    Some(_) if index == active.question.correct_index => ChoiceMark::Correct,
    Some(picked) if picked == index => ChoiceMark::Incorrect,
    Some(_) => ChoiceMark::Dimmed,
  }
}

fn question_card(active: &ActiveQuestion) -> QuestionCard {
  let q = &active.question;
  let choices = q.choices.iter().enumerate()
    .map(|(i, text)| ChoiceView { number: i + 1, text: text.clone(), mark: choice_mark(active, i) })
    .collect();

  let feedback = match active.selected {
    Some(picked) if active.show_explanation => {
      let correct = q.is_correct(picked);
      Some(Feedback {
        correct,
        headline: if correct { "正解です！" } else { "残念、不正解です" },
        translation: q.translation.clone(),
        explanation: q.explanation.clone(),
      })
    }
    _ => None,
  };

  let criteria = if active.show_analysis {
    q.analysis.iter()
      .enumerate()
      .map(|(i, (c, s))| CriterionView {
        key: c,
        label: format!("{}. {}", i + 1, c.label()),
        score: s.score,
        comment: s.comment.clone(),
      })
      .collect()
  } else {
    Vec::new()
  };

  QuestionCard {
    id: q.id.clone(),
    category: q.category,
    difficulty: q.difficulty,
    question_text: q.question_text.clone(),
    choices,
    feedback,
    analysis: AnalysisPanel {
      overall_rating: q.analysis.overall_rating,
      expanded: active.show_analysis,
      criteria,
    },
  }
}
