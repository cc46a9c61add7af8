//! AceGrammar · English grammar question generator for Japanese entrance exams.
//!
//! One structured model call drafts a four-choice question and reviews it
//! against nine criteria; a per-connection session walks the view through
//! `idle → drafting → analyzing → ready | error`.

pub mod config;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod gemini;
pub mod generator;
pub mod machine;
pub mod parse;
pub mod prompt;
pub mod protocol;
pub mod render;
pub mod routes;
pub mod session;
pub mod state;
pub mod telemetry;
pub mod util;
