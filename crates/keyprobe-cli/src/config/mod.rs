//! CLI configuration management.
//!
//! This module defines the complete CLI configuration hierarchy:
//!
//! ```text
//! Cli
//! ├── command: Command            # facebook | openai | sentry
//! ├── http: ReqwestConfig         # Timeout, user agent
//! ├── probe: ProbeOptions         # TLS fallback policy
//! └── telemetry: TelemetryConfig  # Log level, output format
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! # Check the Sentry token from .env
//! keyprobe sentry
//!
//! # Or pass everything explicitly
//! OPENAI_API_KEY="sk-..." keyprobe --http-timeout 5 openai --output json
//! ```

mod provider;
mod telemetry;

use clap::Parser;
use keyprobe_core::ProbeOptions;
use keyprobe_reqwest::ReqwestConfig;
pub use provider::Command;
pub use telemetry::{OutputFormat, TelemetryConfig};

use crate::TRACING_TARGET_CONFIG;

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "keyprobe")]
#[command(about = "Checks whether a third-party API credential is still active")]
#[command(version)]
pub struct Cli {
    /// Provider to check.
    #[command(subcommand)]
    pub command: Command,

    /// HTTP transport configuration.
    #[clap(flatten)]
    pub http: ReqwestConfig,

    /// Probe behaviour (TLS fallback).
    #[clap(flatten)]
    pub probe: ProbeOptions,

    /// Logging and report output.
    #[clap(flatten)]
    pub telemetry: TelemetryConfig,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    ///
    /// The .env file is loaded before clap parses arguments so that
    /// credentials from .env are picked up through clap's `env` support.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Logs configuration at debug level (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            version = env!("CARGO_PKG_VERSION"),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::debug!(
            target: TRACING_TARGET_CONFIG,
            provider = %self.command.provider(),
            http_timeout_secs = self.http.effective_timeout().as_secs(),
            user_agent = %self.http.effective_user_agent(),
            strict_tls = self.probe.strict_tls,
            output = ?self.telemetry.output,
            "Probe configuration"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use keyprobe_core::Provider;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::try_parse_from([
            "keyprobe",
            "--http-timeout",
            "3",
            "--strict-tls",
            "--output",
            "json",
            "sentry",
            "--auth-token",
            "sntrys_abc",
        ])
        .unwrap();

        assert_eq!(cli.command.provider(), Provider::Sentry);
        assert_eq!(cli.http.http_timeout, 3);
        assert!(cli.probe.strict_tls);
        assert_eq!(cli.telemetry.output, OutputFormat::Json);
    }
}
