//! Rendering of probe outcomes.
//!
//! Renderers never touch [`ProbeResult`] semantics: they only format what
//! the engine decided, into any [`Write`] sink.

mod json;
mod text;

use std::io::{self, Write};

use keyprobe_core::{CredentialSpec, Error, ProbeResult, Provider};

use crate::config::OutputFormat;
use crate::exit::ExitStatus;

/// Writes the report for a completed probe.
pub fn render_result(
    out: &mut impl Write,
    format: OutputFormat,
    result: &ProbeResult,
    credential: &CredentialSpec,
) -> io::Result<()> {
    let prefix = credential.prefix(result.provider.prefix_len());
    let exit = ExitStatus::from_result(result);

    match format {
        OutputFormat::Text => text::write_result(out, result, prefix.as_deref()),
        OutputFormat::Json => json::write_result(out, result, prefix.as_deref(), exit),
    }
}

/// Writes the report for a probe that could not produce a result.
pub fn render_failure(
    out: &mut impl Write,
    format: OutputFormat,
    provider: Provider,
    credential: &CredentialSpec,
    error: &Error,
) -> io::Result<()> {
    let exit = ExitStatus::from_error_kind(error.kind());

    match format {
        OutputFormat::Text => text::write_failure(out, provider, credential, error),
        OutputFormat::Json => json::write_failure(out, provider, error, exit),
    }
}
