//! Logging setup on top of tracing-subscriber.
//!
//! `LOG_LEVEL` takes any EnvFilter directive string. Without it, generation
//! lifecycle events (target `question`) and app events (target `acegrammar`)
//! log at debug, everything else at info.
//!
//! `LOG_FORMAT=json` switches to one JSON object per line; anything else is
//! the human-readable format. Per-request spans come from the router's
//! TraceLayer.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,question=debug,acegrammar=debug,tower_http=info,axum=info";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn from_env_value(v: Option<&str>) -> Self {
        match v.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = LogFormat::from_env_value(std::env::var("LOG_FORMAT").ok().as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // The two formats are different subscriber types, so each branch inits its own.
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}
