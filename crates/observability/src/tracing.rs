//! Tracing/logging initialization.
//!
//! JSON lines on stdout. `RUST_LOG` wins when set; otherwise the service-level
//! variable (e.g. `LOG_LEVEL=DEBUG`) picks a single global level.

use tracing_subscriber::EnvFilter;

/// Variable consulted when the caller has no preference.
pub const DEFAULT_LEVEL_ENV: &str = "LOG_LEVEL";

/// Map a level name to a tracing directive.
///
/// Accepts `PANIC|FATAL|ERROR|WARN|INFO|DEBUG|TRACE` in any case. `PANIC` and
/// `FATAL` have no tracing equivalent and collapse to `error`. Anything
/// unknown or absent falls back to `info`.
pub fn level_directive(level: Option<&str>) -> &'static str {
    let Some(level) = level else {
        return "info";
    };

    match level.trim().to_ascii_uppercase().as_str() {
        "PANIC" | "FATAL" | "ERROR" => "error",
        "WARN" | "WARNING" => "warn",
        "DEBUG" => "debug",
        "TRACE" => "trace",
        _ => "info",
    }
}

fn build_filter(rust_log: Option<String>, level: Option<String>) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(level_directive(level.as_deref())))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(level_env: &str) {
    let filter = build_filter(
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
        std::env::var(level_env).ok(),
    );

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_current_span(true)
        .try_init();
}
