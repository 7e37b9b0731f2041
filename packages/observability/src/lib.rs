//! # Observability
//!
//! Centralized logging layer for Session Keeper.
//!
//! Services call `observability::init()` once at startup and use standard
//! `tracing` macros everywhere else. They never decide where logs go.
//!
//! ## Dev Mode
//!
//! Every process writes structured JSONL to one central file:
//! `~/.session-keeper/logs/dev.jsonl`
//!
//! - `tail -f ~/.session-keeper/logs/dev.jsonl | jq` for pretty JSON
//! - `lnav ~/.session-keeper/logs/dev.jsonl` for interactive exploration
//!
//! Writes are append-only with per-line flush, so several processes can
//! share the file. Credential-looking fields are redacted before they are
//! written.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() -> std::io::Result<()> {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "session-keeper".into(),
//!         default_level: "debug".into(),
//!         also_stderr: true,
//!         ..Default::default()
//!     })?;
//!
//!     tracing::info!("service started");
//!     Ok(())
//! }
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;
mod redact;

use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

#[cfg(feature = "dev")]
pub use dev::{default_log_path, CentralLogWriter};
pub use json_layer::{JsonLayer, LogEntry};
pub use redact::REDACTED;

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "session-keeper").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.session-keeper/logs/dev.jsonl` in dev mode. Ignored
    /// without the `dev` feature, where logs only go to stderr.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,

    /// Replace credential-looking fields with a placeholder. Applies to the
    /// JSONL output, including the stderr-only fallback.
    pub redact_secrets: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            redact_secrets: true,
        }
    }
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) -> io::Result<()> {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    })
}

/// Initialize logging with custom configuration.
///
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
#[cfg(feature = "dev")]
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    dev::init_dev_subscriber(&config)
}

/// Initialize logging with custom configuration (stderr only, `log_path`
/// is not used).
#[cfg(not(feature = "dev"))]
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    use tracing_subscriber::util::SubscriberInitExt;
    stderr_subscriber(&config, io::stderr)
        .try_init()
        .map_err(io::Error::other)
}

pub(crate) fn env_filter_or(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Subscriber for processes without a log file. Redacted output is written
/// as JSON lines; with redaction off it is compact text.
pub(crate) fn stderr_subscriber<W>(
    config: &LogConfig,
    make_writer: W,
) -> Box<dyn tracing::Subscriber + Send + Sync>
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    if config.redact_secrets {
        let layer = JsonLayer::new(config.service_name.clone(), make_writer)
            .with_redaction(true)
            .with_filter(env_filter_or(&config.default_level));
        Box::new(tracing_subscriber::registry().with(layer))
    } else {
        Box::new(
            tracing_subscriber::fmt()
                .with_env_filter(env_filter_or(&config.default_level))
                .with_target(true)
                .compact()
                .with_writer(make_writer)
                .finish(),
        )
    }
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
