#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod exit;
mod report;
mod telemetry;

use std::io::{self, Write};
use std::process;

use anyhow::Context;
use keyprobe_core::CredentialProbe;
use keyprobe_reqwest::ReqwestTransport;

use crate::config::Cli;
use crate::exit::ExitStatus;

// Tracing target constants
pub const TRACING_TARGET_CONFIG: &str = "keyprobe_cli::config";
pub const TRACING_TARGET_PROBE: &str = "keyprobe_cli::probe";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::init();

    let status = match run(&cli).await {
        Ok(status) => status,
        Err(error) => {
            if tracing::enabled!(tracing::Level::ERROR) {
                tracing::error!(
                    target: TRACING_TARGET_PROBE,
                    error = %error,
                    "keyprobe terminated with error"
                );
            }
            eprintln!("Error: {error:#}");
            println!("Status: ERROR");
            ExitStatus::Configuration
        }
    };

    process::exit(status.code());
}

/// Runs one probe and writes its report to stdout.
async fn run(cli: &Cli) -> anyhow::Result<ExitStatus> {
    telemetry::init_tracing(&cli.telemetry)?;
    cli.log();

    let provider = cli.command.provider();
    let credential = cli.command.credential();
    let plan = cli.command.plan();
    let format = cli.telemetry.output;

    let outcome = match ReqwestTransport::new(cli.http.clone()) {
        Ok(transport) => {
            let probe = CredentialProbe::with_options(transport, cli.probe.clone());
            probe.probe(&credential, &plan).await
        }
        Err(error) => Err(keyprobe_core::Error::from(error)),
    };

    let mut stdout = io::stdout().lock();
    let status = match outcome {
        Ok(result) => {
            report::render_result(&mut stdout, format, &result, &credential)
                .context("failed to write report")?;
            ExitStatus::from_result(&result)
        }
        Err(error) => {
            tracing::debug!(
                target: TRACING_TARGET_PROBE,
                provider = %provider,
                error = %error,
                "Probe did not produce a result"
            );
            report::render_failure(&mut stdout, format, provider, &credential, &error)
                .context("failed to write report")?;
            ExitStatus::from_error_kind(error.kind())
        }
    };

    stdout.flush().context("failed to flush stdout")?;
    Ok(status)
}
