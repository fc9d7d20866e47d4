//! Logging and report output configuration.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

/// How the probe result is written to stdout.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable status report.
    #[default]
    Text,
    /// Single JSON document.
    Json,
}

/// Telemetry configuration options.
#[derive(Debug, Clone, Serialize, Deserialize, Args)]
pub struct TelemetryConfig {
    /// Log filter used when `RUST_LOG` is not set.
    ///
    /// Logs go to stderr so they never mix with the report.
    #[arg(long = "log-level", env = "KEYPROBE_LOG", default_value = "warn")]
    pub log_level: String,

    /// Report format written to stdout.
    #[arg(long, env = "KEYPROBE_OUTPUT", value_enum, default_value_t = OutputFormat::Text)]
    #[serde(default)]
    pub output: OutputFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            output: OutputFormat::Text,
        }
    }
}
