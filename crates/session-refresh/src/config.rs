//! Refresh timing policy.

use crate::{AuthError, AuthResult};
use std::time::Duration;

/// Refresh must complete at least this long before expiry.
pub const DEFAULT_REFRESH_THRESHOLD: Duration = Duration::from_secs(5 * 60);

/// Period of the safety check.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(30);

/// Consecutive transient failures before the coordinator logs at error level.
pub const DEFAULT_FAILURE_ALERT_AFTER: u32 = 5;

/// Configuration for when the coordinator refreshes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshConfig {
    /// Safety margin subtracted from expiry.
    pub refresh_threshold: Duration,
    /// How often the periodic safety check runs.
    pub check_interval: Duration,
    /// Consecutive transient refresh failures before escalating the log level.
    pub failure_alert_after: u32,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_threshold: DEFAULT_REFRESH_THRESHOLD,
            check_interval: DEFAULT_CHECK_INTERVAL,
            failure_alert_after: DEFAULT_FAILURE_ALERT_AFTER,
        }
    }
}

impl RefreshConfig {
    /// Reject values the coordinator cannot run with at all.
    pub fn ensure_runnable(&self) -> AuthResult<()> {
        if self.refresh_threshold.is_zero() {
            return Err(AuthError::Config(
                "refresh threshold must be greater than zero".to_string(),
            ));
        }
        if self.check_interval.is_zero() {
            return Err(AuthError::Config(
                "check interval must be greater than zero".to_string(),
            ));
        }
        if self.failure_alert_after == 0 {
            return Err(AuthError::Config(
                "failure_alert_after must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Check that the timing values are usable together.
    ///
    /// The periodic check must run more often than the threshold window is
    /// wide, otherwise a missed one-shot timer could let the session lapse.
    pub fn validate(&self) -> AuthResult<()> {
        self.ensure_runnable()?;
        if self.check_interval >= self.refresh_threshold {
            return Err(AuthError::Config(format!(
                "check interval ({}s) must be shorter than the refresh threshold ({}s)",
                self.check_interval.as_secs(),
                self.refresh_threshold.as_secs()
            )));
        }
        Ok(())
    }

    pub(crate) fn threshold_millis(&self) -> i64 {
        i64::try_from(self.refresh_threshold.as_millis()).unwrap_or(i64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_config_default() {
        let config = RefreshConfig::default();
        assert_eq!(config.refresh_threshold, Duration::from_secs(300));
        assert_eq!(config.check_interval, Duration::from_secs(30));
        assert_eq!(config.failure_alert_after, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_check_interval_must_be_shorter_than_threshold() {
        let config = RefreshConfig {
            refresh_threshold: Duration::from_secs(30),
            check_interval: Duration::from_secs(30),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_zero_values_rejected() {
        let zero_threshold = RefreshConfig {
            refresh_threshold: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_threshold.validate().is_err());

        let zero_interval = RefreshConfig {
            check_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(zero_interval.validate().is_err());

        let zero_alert = RefreshConfig {
            failure_alert_after: 0,
            ..Default::default()
        };
        assert!(zero_alert.validate().is_err());
    }

    #[test]
    fn test_slow_check_interval_is_runnable_but_invalid() {
        let config = RefreshConfig {
            check_interval: Duration::from_secs(100_000),
            ..Default::default()
        };
        assert!(config.ensure_runnable().is_ok());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_millis() {
        assert_eq!(RefreshConfig::default().threshold_millis(), 300_000);
    }
}
