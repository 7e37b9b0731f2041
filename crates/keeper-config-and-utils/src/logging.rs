//! Logging initialization.
//!
//! Wires the observability crate's JSONL subscriber for Session Keeper
//! processes. Logs go to `~/.session-keeper/logs/dev.jsonl` unless a path is
//! given.

use crate::CoreResult;
use std::path::PathBuf;

const SERVICE_NAME: &str = "session-keeper";

/// Initialize the logging system.
///
/// This sets up tracing with:
/// - Structured JSONL output to `log_path` (or the central default)
/// - Log level from RUST_LOG env var or the provided default
/// - Compact stderr output for foreground use
/// - Credential redaction, unless `SESSION_KEEPER_LOG_SECRETS=1`
///
/// # Example
///
/// ```ignore
/// init_logging("info", None)?;
/// tracing::info!("Session keeper started");
/// ```
pub fn init_logging(level: &str, log_path: Option<PathBuf>) -> CoreResult<()> {
    let log_secrets = std::env::var("SESSION_KEEPER_LOG_SECRETS")
        .map(|raw| matches!(raw.trim(), "1" | "true"))
        .unwrap_or(false);

    observability::init_with_config(observability::LogConfig {
        service_name: SERVICE_NAME.into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        log_path,
        also_stderr: true,
        redact_secrets: !log_secrets,
    })?;

    Ok(())
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
