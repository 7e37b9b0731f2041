//! Configuration management.
//!
//! Values come from, in increasing precedence: built-in defaults, the JSON
//! config file, and `SESSION_KEEPER_*` environment variables.

use crate::{CoreResult, Paths};
use serde::{Deserialize, Serialize};
use session_refresh::{
    RefreshConfig, DEFAULT_CHECK_INTERVAL, DEFAULT_FAILURE_ALERT_AFTER, DEFAULT_REFRESH_THRESHOLD,
};
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Default Supabase URL (can be overridden at compile time via SUPABASE_URL env var).
/// Falls back to the local Supabase CLI stack.
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "http://127.0.0.1:54321",
};

/// Default Supabase publishable key (can be overridden at compile time via SUPABASE_PUBLISHABLE_KEY env var).
pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str = match option_env!("SUPABASE_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ENV_LOG_LEVEL: &str = "SESSION_KEEPER_LOG_LEVEL";
const ENV_SUPABASE_URL: &str = "SESSION_KEEPER_SUPABASE_URL";
const ENV_SUPABASE_PUBLISHABLE_KEY: &str = "SESSION_KEEPER_SUPABASE_PUBLISHABLE_KEY";

/// Main configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase publishable API key (public, safe to expose).
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
    /// Refresh this many seconds before the session expires.
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,
    /// Period of the safety check, in seconds.
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Consecutive transient refresh failures before logging at error level.
    #[serde(default = "default_failure_alert_after")]
    pub failure_alert_after: u32,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

fn default_refresh_threshold_secs() -> u64 {
    DEFAULT_REFRESH_THRESHOLD.as_secs()
}

fn default_check_interval_secs() -> u64 {
    DEFAULT_CHECK_INTERVAL.as_secs()
}

fn default_failure_alert_after() -> u32 {
    DEFAULT_FAILURE_ALERT_AFTER
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            supabase_url: default_supabase_url(),
            supabase_publishable_key: default_supabase_publishable_key(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
            check_interval_secs: default_check_interval_secs(),
            failure_alert_after: default_failure_alert_after(),
        }
    }
}

impl Config {
    /// Load configuration from the config file if present, then apply
    /// environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            debug!(path = %config_path.display(), "Loading config file");
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|name| std::env::var(name).ok());

        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Empty values are ignored.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(log_level) = non_empty(ENV_LOG_LEVEL) {
            self.log_level = log_level;
        }
        if let Some(url) = non_empty(ENV_SUPABASE_URL) {
            self.supabase_url = url;
        }
        if let Some(key) = non_empty(ENV_SUPABASE_PUBLISHABLE_KEY) {
            self.supabase_publishable_key = key;
        }
    }

    /// Get the Supabase URL as a parsed URL.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        Ok(Url::parse(&self.supabase_url)?)
    }

    /// Refresh timing policy, validated.
    pub fn refresh_config(&self) -> CoreResult<RefreshConfig> {
        let config = RefreshConfig {
            refresh_threshold: Duration::from_secs(self.refresh_threshold_secs),
            check_interval: Duration::from_secs(self.check_interval_secs),
            failure_alert_after: self.failure_alert_after,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
        assert_eq!(config.refresh_threshold_secs, 300);
        assert_eq!(config.check_interval_secs, 30);
        assert_eq!(config.failure_alert_after, 5);
    }

    #[test]
    fn test_config_load_from_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(
            &config_path,
            r#"{ "log_level": "debug", "refresh_threshold_secs": 600 }"#,
        )
        .unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.refresh_threshold_secs, 600);
        assert_eq!(config.check_interval_secs, 30);
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
    }

    #[test]
    fn test_config_load_from_malformed_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{ not json").unwrap();

        assert!(matches!(
            Config::load_from_file(&config_path),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn test_config_save_and_load_from_file() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().join("keeper"));

        let config = Config {
            log_level: "trace".to_string(),
            supabase_url: "https://project.supabase.co".to_string(),
            check_interval_secs: 15,
            ..Default::default()
        };
        config.save(&paths).unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_overrides_take_precedence() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SESSION_KEEPER_LOG_LEVEL", "warn"),
            ("SESSION_KEEPER_SUPABASE_URL", "https://override.supabase.co"),
            ("SESSION_KEEPER_SUPABASE_PUBLISHABLE_KEY", "  "),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.log_level, "warn");
        assert_eq!(config.supabase_url, "https://override.supabase.co");
        // Blank values are ignored
        assert_eq!(
            config.supabase_publishable_key,
            DEFAULT_SUPABASE_PUBLISHABLE_KEY
        );
    }

    #[test]
    fn test_config_supabase_url_parse() {
        let config = Config {
            supabase_url: "https://project.supabase.co".to_string(),
            ..Default::default()
        };
        let url = config.supabase_url().unwrap();
        assert_eq!(url.scheme(), "https");

        let invalid = Config {
            supabase_url: "not a valid url".to_string(),
            ..Default::default()
        };
        assert!(matches!(invalid.supabase_url(), Err(CoreError::InvalidUrl(_))));
    }

    #[test]
    fn test_refresh_config_conversion() {
        let refresh = Config::default().refresh_config().unwrap();
        assert_eq!(refresh, RefreshConfig::default());
    }

    #[test]
    fn test_refresh_config_rejects_slow_check_interval() {
        let config = Config {
            refresh_threshold_secs: 60,
            check_interval_secs: 120,
            ..Default::default()
        };
        assert!(matches!(config.refresh_config(), Err(CoreError::Config(_))));
    }
}
