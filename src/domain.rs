//! Domain models: grammar categories, difficulty levels, the nine review
//! criteria, and the generated question itself.
//!
//! Closed sets are enums. Their wire form is the Japanese label the front end
//! shows; English aliases are accepted on input so API callers don't need to
//! type Japanese.

use serde::{Deserialize, Serialize};

/// Grammar topic a question is about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrammarCategory {
  #[serde(rename = "時制", alias = "tense")]
  Tense,
  #[serde(rename = "助動詞", alias = "modal", alias = "modals")]
  Modal,
  #[serde(rename = "受動態", alias = "passive")]
  Passive,
  #[serde(rename = "不定詞", alias = "infinitive", alias = "infinitives")]
  Infinitive,
  #[serde(rename = "動名詞", alias = "gerund", alias = "gerunds")]
  Gerund,
  #[serde(rename = "分詞", alias = "participle", alias = "participles")]
  Participle,
  #[serde(rename = "関係詞", alias = "relative", alias = "relative_clauses")]
  Relative,
  #[serde(rename = "仮定法", alias = "subjunctive")]
  Subjunctive,
  #[serde(rename = "比較", alias = "comparison")]
  Comparison,
  #[serde(rename = "接続詞", alias = "conjunction", alias = "conjunctions")]
  Conjunction,
  #[serde(rename = "前置詞", alias = "preposition", alias = "prepositions")]
  Preposition,
}

impl GrammarCategory {
  pub const ALL: [GrammarCategory; 11] = [
    GrammarCategory::Tense,
    GrammarCategory::Modal,
    GrammarCategory::Passive,
    GrammarCategory::Infinitive,
    GrammarCategory::Gerund,
    GrammarCategory::Participle,
    GrammarCategory::Relative,
    GrammarCategory::Subjunctive,
    GrammarCategory::Comparison,
    GrammarCategory::Conjunction,
    GrammarCategory::Preposition,
  ];

  /// Label used in prompts and on screen.
  pub fn label(self) -> &'static str {
    match self {
      GrammarCategory::Tense => "時制",
      GrammarCategory::Modal => "助動詞",
      GrammarCategory::Passive => "受動態",
      GrammarCategory::Infinitive => "不定詞",
      GrammarCategory::Gerund => "動名詞",
      GrammarCategory::Participle => "分詞",
      GrammarCategory::Relative => "関係詞",
      GrammarCategory::Subjunctive => "仮定法",
      GrammarCategory::Comparison => "比較",
      GrammarCategory::Conjunction => "接続詞",
      GrammarCategory::Preposition => "前置詞",
    }
  }
}

impl Default for GrammarCategory {
  fn default() -> Self { GrammarCategory::Relative }
}

impl std::fmt::Display for GrammarCategory {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Exam difficulty, ordered from easiest to hardest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Difficulty {
  #[serde(rename = "基礎", alias = "basic")]
  Basic,
  #[serde(rename = "標準", alias = "standard")]
  Standard,
  #[serde(rename = "難関", alias = "advanced")]
  Advanced,
  #[serde(rename = "最難関", alias = "elite")]
  Elite,
}

impl Difficulty {
  pub const ALL: [Difficulty; 4] =
    [Difficulty::Basic, Difficulty::Standard, Difficulty::Advanced, Difficulty::Elite];

  pub fn label(self) -> &'static str {
    match self {
      Difficulty::Basic => "基礎",
      Difficulty::Standard => "標準",
      Difficulty::Advanced => "難関",
      Difficulty::Elite => "最難関",
    }
  }

  /// Deviation-score (偏差値) band the level targets.
  pub fn score_band(self) -> &'static str {
    match self {
      Difficulty::Basic => "45-50",
      Difficulty::Standard => "50-60",
      Difficulty::Advanced => "60-70",
      Difficulty::Elite => "70+",
    }
  }

  /// The legend embedded in the user prompt, e.g. "基礎: 偏差値45-50, 標準: 50-60, ...".
  pub fn band_legend() -> String {
    Difficulty::ALL
      .iter()
      .enumerate()
      .map(|(i, d)| {
        if i == 0 {
          format!("{}: 偏差値{}", d.label(), d.score_band())
        } else {
          format!("{}: {}", d.label(), d.score_band())
        }
      })
      .collect::<Vec<_>>()
      .join(", ")
  }
}

impl Default for Difficulty {
  fn default() -> Self { Difficulty::Standard }
}

impl std::fmt::Display for Difficulty {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// Verdict the generator gives its own question. Not computed from scores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverallRating {
  #[serde(rename = "良問", alias = "good")]
  Good,
  #[serde(rename = "標準問", alias = "standard")]
  Standard,
  #[serde(rename = "要改善", alias = "needs-improvement")]
  NeedsImprovement,
}

impl OverallRating {
  pub const ALL: [OverallRating; 3] =
    [OverallRating::Good, OverallRating::Standard, OverallRating::NeedsImprovement];

  pub fn label(self) -> &'static str {
    match self {
      OverallRating::Good => "良問",
      OverallRating::Standard => "標準問",
      OverallRating::NeedsImprovement => "要改善",
    }
  }
}

/// The nine fixed review dimensions, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Criterion {
  AcademicLevel,
  LogicalConsistency,
  UniquenessOfAnswer,
  ValidityOfSolution,
  EducationalValue,
  Naturalness,
  FormatAppropriateness,
  TimeAppropriateness,
  AiErrorDetection,
}

impl Criterion {
  pub const ALL: [Criterion; 9] = [
    Criterion::AcademicLevel,
    Criterion::LogicalConsistency,
    Criterion::UniquenessOfAnswer,
    Criterion::ValidityOfSolution,
    Criterion::EducationalValue,
    Criterion::Naturalness,
    Criterion::FormatAppropriateness,
    Criterion::TimeAppropriateness,
    Criterion::AiErrorDetection,
  ];

  /// Key used in the structured model response.
  pub fn wire_key(self) -> &'static str {
    match self {
      Criterion::AcademicLevel => "academicLevel",
      Criterion::LogicalConsistency => "logicalConsistency",
      Criterion::UniquenessOfAnswer => "uniquenessOfAnswer",
      Criterion::ValidityOfSolution => "validityOfSolution",
      Criterion::EducationalValue => "educationalValue",
      Criterion::Naturalness => "naturalness",
      Criterion::FormatAppropriateness => "formatAppropriateness",
      Criterion::TimeAppropriateness => "timeAppropriateness",
      Criterion::AiErrorDetection => "aiErrorDetection",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Criterion::AcademicLevel => "学力レベル",
      Criterion::LogicalConsistency => "論理的一貫性",
      Criterion::UniquenessOfAnswer => "解答の一意性",
      Criterion::ValidityOfSolution => "解法の妥当性",
      Criterion::EducationalValue => "受験的価値",
      Criterion::Naturalness => "英語の自然さ",
      Criterion::FormatAppropriateness => "出題形式",
      Criterion::TimeAppropriateness => "解答時間",
      Criterion::AiErrorDetection => "AIエラー検証",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriterionScore {
  pub score: u8,
  pub comment: String,
}

/// Self-review attached to every generated question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionAnalysis {
  pub academic_level: CriterionScore,
  pub logical_consistency: CriterionScore,
  pub uniqueness_of_answer: CriterionScore,
  pub validity_of_solution: CriterionScore,
  pub educational_value: CriterionScore,
  pub naturalness: CriterionScore,
  pub format_appropriateness: CriterionScore,
  pub time_appropriateness: CriterionScore,
  pub ai_error_detection: CriterionScore,
  pub overall_rating: OverallRating,
}

impl QuestionAnalysis {
  pub fn get(&self, c: Criterion) -> &CriterionScore {
    match c {
      Criterion::AcademicLevel => &self.academic_level,
      Criterion::LogicalConsistency => &self.logical_consistency,
      Criterion::UniquenessOfAnswer => &self.uniqueness_of_answer,
      Criterion::ValidityOfSolution => &self.validity_of_solution,
      Criterion::EducationalValue => &self.educational_value,
      Criterion::Naturalness => &self.naturalness,
      Criterion::FormatAppropriateness => &self.format_appropriateness,
      Criterion::TimeAppropriateness => &self.time_appropriateness,
      Criterion::AiErrorDetection => &self.ai_error_detection,
    }
  }

  /// Criteria paired with their scores, in display order.
  pub fn iter(&self) -> impl Iterator<Item = (Criterion, &CriterionScore)> {
    Criterion::ALL.into_iter().map(move |c| (c, self.get(c)))
  }
}

/// Number of answer choices every question carries.
pub const CHOICE_COUNT: usize = 4;

/// A finished four-choice question. Only built through `parse::question_from_json`,
/// which enforces the choice count and index range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarQuestion {
  pub id: String,
  pub category: GrammarCategory,
  pub difficulty: Difficulty,
  pub question_text: String,
  pub choices: [String; CHOICE_COUNT],
  pub correct_index: usize,
  pub translation: String,
  pub explanation: String,
  pub analysis: QuestionAnalysis,
}

impl GrammarQuestion {
  pub fn is_correct(&self, index: usize) -> bool {
    index == self.correct_index
  }
}

/// Category + difficulty picked by the user; frozen for one request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
  pub category: GrammarCategory,
  pub difficulty: Difficulty,
}
