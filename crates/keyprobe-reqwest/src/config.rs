//! Timeout and user agent shared by both transport clients.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Seconds a single probe request may take before it counts as a timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// HTTP settings for [`ReqwestTransport`](crate::ReqwestTransport).
///
/// A zero timeout or a blank user agent falls back to the defaults rather
/// than disabling the setting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ReqwestConfig {
    /// Per-request timeout in seconds
    #[cfg_attr(
        feature = "config",
        arg(long = "http-timeout", env = "HTTP_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)
    )]
    #[serde(default = "default_timeout_secs")]
    pub http_timeout: u64,

    /// User-Agent sent to providers (default: keyprobe/<version>)
    #[cfg_attr(
        feature = "config",
        arg(long = "http-user-agent", env = "HTTP_USER_AGENT")
    )]
    #[serde(default)]
    pub user_agent: Option<String>,
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ReqwestConfig {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_SECS)
    }
}

impl ReqwestConfig {
    /// Configuration with the given timeout and the default user agent.
    pub fn new(http_timeout: u64) -> Self {
        Self {
            http_timeout,
            user_agent: None,
        }
    }

    pub fn effective_timeout(&self) -> Duration {
        match self.http_timeout {
            0 => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            secs => Duration::from_secs(secs),
        }
    }

    pub fn effective_user_agent(&self) -> String {
        match self.user_agent.as_deref().map(str::trim) {
            Some(agent) if !agent.is_empty() => agent.to_owned(),
            _ => concat!("keyprobe/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ReqwestConfig::default();
        assert_eq!(config.http_timeout, 10);
        assert!(config.user_agent.is_none());
        assert_eq!(config.effective_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_custom_user_agent() {
        let config = ReqwestConfig {
            http_timeout: 3,
            user_agent: Some("ci-check/1.0".to_owned()),
        };

        assert_eq!(config.effective_timeout(), Duration::from_secs(3));
        assert_eq!(config.effective_user_agent(), "ci-check/1.0");
    }

    #[test]
    fn test_effective_values_fall_back_to_defaults() {
        let config = ReqwestConfig {
            http_timeout: 0,
            user_agent: Some("  ".to_owned()),
        };

        assert_eq!(
            config.effective_timeout(),
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
        assert!(config.effective_user_agent().starts_with("keyprobe/"));
    }
}
