//! Loading configuration (prompts, generation backend, session timing) from
//! TOML and the environment.
//!
//! Every table is optional; missing keys fall back to the defaults below.
//! Environment variables win over the file.
//!
//! ```toml
//! [generation]
//! model = "gemini-3-pro-preview"
//! request_timeout_secs = 120
//!
//! [session]
//! draft_dwell_ms = 1500
//!
//! [prompts]
//! user_template = "項目: {category}\n難易度: {difficulty} ({bands})"
//! ```

use serde::Deserialize;
use tracing::{error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AppConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: GenerationCfg,
  #[serde(default)]
  pub session: SessionCfg,
}

/// Where and how the question generator is called.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationCfg {
  pub base_url: String,
  pub model: String,
  /// Sampling temperature; the provider default when unset.
  pub temperature: Option<f32>,
  pub request_timeout_secs: u64,
}

impl Default for GenerationCfg {
  fn default() -> Self {
    Self {
      base_url: DEFAULT_BASE_URL.into(),
      model: DEFAULT_MODEL.into(),
      temperature: None,
      request_timeout_secs: 120,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SessionCfg {
  /// Minimum time the "drafting" phase stays on screen.
  pub draft_dwell_ms: u64,
}

impl Default for SessionCfg {
  fn default() -> Self { Self { draft_dwell_ms: 1500 } }
}

/// Prompts sent to the generator. Defaults target Japanese university entrance exams.
/// `user_template` understands `{category}`, `{difficulty}` and `{bands}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub system_instruction: String,
  pub user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system_instruction: DEFAULT_SYSTEM_INSTRUCTION.into(),
      user_template: DEFAULT_USER_TEMPLATE.into(),
    }
  }
}

const DEFAULT_SYSTEM_INSTRUCTION: &str = r#"
あなたは大学受験英語の最高峰のスペシャリスト（河合塾・駿台レベルの予備校講師）です。
ユーザーから指定された「文法項目」と「難易度」に基づき、大学入試の4択英文法問題を作成し、さらにそれを自ら9つの観点で批判的に分析・改善して最終回答を出力してください。

【9つの分析・改善基準】
1. 学力レベルの適切性（偏差値帯に合致しているか）
2. 論理的一貫性（文脈が破綻していないか）
3. 解答の一意性（正解が一つだけであり、誤答が明確に誤りか）
4. 解法の妥当性（標準的な受験解法で解けるか）
5. 受験問題としての価値（本質的な理解を問う「良問」か）
6. 自然さ（英語として不自然な語彙選択がないか）
7. 出題形式の適切さ（選択肢のバランスは良いか）
8. 解答時間の妥当性（重すぎず、軽すぎないか）
9. AI特有のエラー検出（途中で設定が変わる、存在しない単語など）

【最終出力形式】
必ず指定されたJSONスキーマに従って返してください。
「分析」の結果、もし初期案に不備があれば自動的に修正・洗練した後の「最終的な問題」を出力に含めてください。
"#;

const DEFAULT_USER_TEMPLATE: &str = "以下の条件で大学入試レベルの英文法問題を作成し、分析レポートを添えて出力してください。
項目: {category}
難易度: {difficulty} ({bands})
";

impl AppConfig {
  /// File (if `QUIZ_CONFIG_PATH` is set and readable) plus env overrides.
  pub fn load() -> Self {
    let mut cfg = load_config_from_env().unwrap_or_default();
    cfg.apply_env_overrides();
    cfg
  }

  fn apply_env_overrides(&mut self) {
    if let Ok(v) = std::env::var("GEMINI_BASE_URL") {
      self.generation.base_url = v;
    }
    if let Ok(v) = std::env::var("GEMINI_MODEL") {
      self.generation.model = v;
    }
    if let Ok(v) = std::env::var("DRAFT_DWELL_MS") {
      match v.parse::<u64>() {
        Ok(ms) => self.session.draft_dwell_ms = ms,
        Err(e) => warn!(target: "acegrammar", value = %v, error = %e, "Ignoring invalid DRAFT_DWELL_MS"),
      }
    }
  }
}

/// Attempt to load `AppConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_config_from_env() -> Option<AppConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AppConfig>(&s) {
      Ok(cfg) => {
        info!(target: "acegrammar", %path, "Loaded config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "acegrammar", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "acegrammar", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
