//! Tracing initialization and configuration.

use std::io::{self, IsTerminal};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initializes the tracing subscriber for structured logging.
///
/// # Configuration
///
/// `RUST_LOG` takes precedence. Otherwise `fallback` (from `--log-level`
/// or `KEYPROBE_LOG`) is used.
///
/// # Examples
///
/// ```bash
/// RUST_LOG=keyprobe_core=debug keyprobe sentry
/// keyprobe --log-level trace openai
/// ```
///
/// # Errors
///
/// Returns an error if the filter is malformed or a subscriber is already set.
pub(super) fn init_tracing(fallback: &str) -> anyhow::Result<()> {
    let env_filter = create_env_filter(fallback)?;

    let fmt_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(io::stderr().is_terminal());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    Ok(())
}

/// Creates an environment filter for tracing.
fn create_env_filter(fallback: &str) -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_filter_is_parsed() {
        assert!(EnvFilter::try_new("keyprobe_core=debug,warn").is_ok());
        assert!(create_env_filter("info").is_ok());
    }
}
