//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL: EnvFilter directives, e.g. "debug" or
//!   "info,generator=debug,question_maker=debug,tower_http=info". Invalid
//!   directives fall back to the default filter with a warning.
//! - LOG_FORMAT: "json" for structured logs, anything else is human-readable.
//!
//! Per-request spans come from the TraceLayer in `routes`.

use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "info,question_maker=debug,generator=debug,tower_http=info,axum=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn from_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Returns the filter plus the rejected directive string, if any, so the
/// caller can report it once a subscriber is installed.
fn build_filter(directives: Option<&str>) -> (EnvFilter, Option<String>) {
    match directives.map(str::trim).filter(|d| !d.is_empty()) {
        None => (EnvFilter::new(DEFAULT_FILTER), None),
        Some(d) => match EnvFilter::try_new(d) {
            Ok(f) => (f, None),
            Err(_) => (EnvFilter::new(DEFAULT_FILTER), Some(d.to_string())),
        },
    }
}

pub fn init_tracing() {
    let level = std::env::var("LOG_LEVEL").ok();
    let format = LogFormat::from_value(std::env::var("LOG_FORMAT").ok().as_deref());
    let (filter, rejected) = build_filter(level.as_deref());

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }

    if let Some(d) = rejected {
        warn!(target: "question_maker", directives = %d, fallback = DEFAULT_FILTER, "Invalid LOG_LEVEL, using default filter");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_selection() {
        assert_eq!(LogFormat::from_value(Some("json")), LogFormat::Json);
        assert_eq!(LogFormat::from_value(Some(" JSON ")), LogFormat::Json);
        assert_eq!(LogFormat::from_value(Some("pretty")), LogFormat::Pretty);
        assert_eq!(LogFormat::from_value(None), LogFormat::Pretty);
    }

    #[test]
    fn test_filter_fallbacks() {
        assert!(build_filter(None).1.is_none());
        assert!(build_filter(Some("   ")).1.is_none());
        assert!(build_filter(Some("debug,tower_http=info")).1.is_none());
        assert_eq!(build_filter(Some("foo=[[")).1.as_deref(), Some("foo=[["));
    }
}
