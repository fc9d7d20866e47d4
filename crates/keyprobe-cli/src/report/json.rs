//! JSON report.

use std::io::{self, Write};

use keyprobe_core::{Error, ErrorKind, ProbeResult, Provider};
use serde::Serialize;

use crate::exit::ExitStatus;

#[derive(Serialize)]
struct ResultDocument<'a> {
    #[serde(flatten)]
    result: &'a ProbeResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    credential_prefix: Option<&'a str>,
    exit_code: i32,
}

#[derive(Serialize)]
struct FailureCause {
    kind: ErrorKind,
    message: String,
}

#[derive(Serialize)]
struct FailureDocument {
    provider: Provider,
    status: &'static str,
    cause: FailureCause,
    exit_code: i32,
}

pub(super) fn write_result(
    out: &mut impl Write,
    result: &ProbeResult,
    prefix: Option<&str>,
    exit: ExitStatus,
) -> io::Result<()> {
    let document = ResultDocument {
        result,
        credential_prefix: prefix,
        exit_code: exit.code(),
    };

    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)
}

pub(super) fn write_failure(
    out: &mut impl Write,
    provider: Provider,
    error: &Error,
    exit: ExitStatus,
) -> io::Result<()> {
    let status = match error.kind() {
        ErrorKind::Configuration => "not_configured",
        _ => "error",
    };

    let document = FailureDocument {
        provider,
        status,
        cause: FailureCause {
            kind: error.kind(),
            message: error.describe(),
        },
        exit_code: exit.code(),
    };

    serde_json::to_writer_pretty(&mut *out, &document)?;
    writeln!(out)
}
