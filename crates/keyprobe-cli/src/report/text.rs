//! Human-readable report.

use std::io::{self, Write};

use jiff::Timestamp;
use keyprobe_core::{CredentialSpec, Error, ErrorKind, ProbeResult, ProbeStatus, Provider};
use serde_json::Value;

const RULE_WIDTH: usize = 60;

/// Detail keys rendered for each provider, in display order.
fn detail_labels(provider: Provider) -> &'static [(&'static str, &'static str)] {
    match provider {
        Provider::Facebook => &[
            ("app_id", "App ID"),
            ("type", "Type"),
            ("user_id", "User ID"),
            ("expires_at", "Expires at"),
            ("scopes", "Scopes"),
            ("name", "Name"),
            ("id", "ID"),
        ],
        Provider::OpenAi => &[
            ("model_count", "Models available"),
            ("model", "Model"),
            ("total_tokens", "Tokens used"),
            ("reply", "Reply"),
            ("created", "Validated at"),
        ],
        Provider::Sentry => &[("organization_count", "Organizations"), ("project_count", "Projects")],
    }
}

/// A list extracted alongside a count: (count key, list key, item title, noun).
const SAMPLES: &[(&str, &str, &str, &str)] = &[
    ("organization_count", "organizations", "Organization", "organization(s)"),
    ("project_count", "projects", "Project", "project(s)"),
];

/// Labels for fields inside sampled list items, in display order.
const SAMPLE_FIELDS: &[(&str, &str)] = &[
    ("slug", "Slug"),
    ("name", "Name"),
    ("platform", "Platform"),
    ("id", "ID"),
    ("status", "Status"),
];

pub(super) fn write_result(
    out: &mut impl Write,
    result: &ProbeResult,
    prefix: Option<&str>,
) -> io::Result<()> {
    let provider = result.provider;
    let name = provider.display_name();
    let label = provider.credential_label();

    banner(out)?;

    match result.status {
        ProbeStatus::Active => {
            writeln!(out, "✓ Active Secret - {name} confirmed this {label} is active")?;
            write_prefix(out, provider, prefix)?;
            writeln!(out, "  Status: ACTIVE and operational")?;
        }
        ProbeStatus::ActiveWithWarning => {
            writeln!(out, "✓ Active Secret - {name} confirmed this {label} is active")?;
            write_prefix(out, provider, prefix)?;
            writeln!(out, "  Status: ACTIVE with restrictions")?;
            if let Some(warning) = &result.warning {
                writeln!(out, "  ⚠ {warning}")?;
            }
        }
        ProbeStatus::Inactive if result.cause_kind() == Some(ErrorKind::Protocol) => {
            writeln!(out, "✗ Unexpected Response - {name} answered in an unknown format")?;
            write_prefix(out, provider, prefix)?;
            writeln!(out, "  Status: UNKNOWN (unexpected response)")?;
        }
        ProbeStatus::Inactive => {
            writeln!(out, "✗ Invalid Secret - {name} rejected this {label}")?;
            write_prefix(out, provider, prefix)?;
            writeln!(out, "  Status: INVALID, EXPIRED, or REVOKED")?;
        }
        ProbeStatus::Indeterminate => {
            writeln!(out, "? Unverified Secret - {name} could not be reached")?;
            write_prefix(out, provider, prefix)?;
            writeln!(out, "  Status: UNKNOWN (could not verify)")?;
        }
    }

    if let Some(cause) = &result.cause {
        writeln!(out, "  Reason: {}", cause.message)?;
        if let Some(message) = &cause.provider_message {
            writeln!(out, "  Error: {message}")?;
        }
        if let Some(code) = &cause.provider_code {
            writeln!(out, "  Code: {code}")?;
        }
        if let Some(status) = result.raw_http_status {
            writeln!(out, "  HTTP status: {status}")?;
        }
    }

    for (key, title) in detail_labels(provider) {
        if let Some(text) = detail_line(result, key) {
            writeln!(out, "  {title}: {text}")?;
        }
        for (_, list, item, noun) in SAMPLES.iter().filter(|sample| sample.0 == *key) {
            write_sample(out, result, key, list, item, noun)?;
        }
    }

    for note in &result.notes {
        writeln!(out, "  Note: {note}")?;
    }

    rule(out)?;

    if result.tls_bypassed {
        writeln!(
            out,
            "⚠ Warning: certificate verification was bypassed. Install the system CA certificates to restore it."
        )?;
    }

    Ok(())
}

pub(super) fn write_failure(
    out: &mut impl Write,
    provider: Provider,
    credential: &CredentialSpec,
    error: &Error,
) -> io::Result<()> {
    let name = provider.display_name();
    let label = provider.credential_label();

    if error.kind() == ErrorKind::Configuration {
        writeln!(out, "✗ {} not set or still has its default value!", credential.name())?;
        writeln!(out)?;
        writeln!(out, "Please update the .env file with your actual {label}:")?;
        writeln!(out, "  1. Open the .env file in this directory")?;
        writeln!(
            out,
            "  2. Replace '{}' with your actual {name} {label}",
            credential.placeholder()
        )?;
        writeln!(out)?;
        banner(out)?;
        writeln!(out, "✗ Missing Secret - no {name} {label} is configured")?;
        writeln!(out, "  Status: NOT CONFIGURED")?;
    } else {
        banner(out)?;
        writeln!(out, "✗ Probe Failed - the {name} check could not run")?;
        writeln!(out, "  Reason: {}", error.describe())?;
        writeln!(out, "  Status: ERROR")?;
    }

    rule(out)
}

fn banner(out: &mut impl Write) -> io::Result<()> {
    rule(out)?;
    writeln!(out, "🔑 KEY VALIDATION STATUS")?;
    rule(out)
}

fn rule(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH))
}

/// Lists sampled items, then how many were left out.
fn write_sample(
    out: &mut impl Write,
    result: &ProbeResult,
    count_key: &str,
    list_key: &str,
    item: &str,
    noun: &str,
) -> io::Result<()> {
    let Some(items) = result.detail.get(list_key).and_then(Value::as_array) else {
        return Ok(());
    };

    for (index, entry) in items.iter().enumerate() {
        writeln!(out, "  {item} {}:", index + 1)?;
        for (field, label) in SAMPLE_FIELDS {
            if let Some(value) = entry.get(*field) {
                let text = value.as_str().map_or_else(|| value.to_string(), str::to_owned);
                writeln!(out, "    {label}: {text}")?;
            }
        }
    }

    let total = result.detail.get(count_key).and_then(Value::as_u64).unwrap_or(0);
    let shown = items.len() as u64;
    if total > shown {
        writeln!(out, "  ... and {} more {noun}", total - shown)?;
    }

    Ok(())
}

fn write_prefix(out: &mut impl Write, provider: Provider, prefix: Option<&str>) -> io::Result<()> {
    let Some(prefix) = prefix else {
        return Ok(());
    };

    let title = match provider {
        Provider::OpenAi => "Key",
        Provider::Facebook | Provider::Sentry => "Token",
    };
    writeln!(out, "  {title} prefix: {prefix}...")
}

/// Renders one detail value, formatting epoch seconds as UTC timestamps.
fn detail_line(result: &ProbeResult, key: &str) -> Option<String> {
    match (key, result.detail.get(key)?) {
        ("expires_at", Value::Number(n)) if n.as_i64() == Some(0) => {
            Some("Never (long-lived token)".to_owned())
        }
        ("expires_at" | "created", Value::Number(n)) => {
            let seconds = n.as_i64()?;
            match Timestamp::from_second(seconds) {
                Ok(ts) => Some(ts.strftime("%Y-%m-%d %H:%M:%S UTC").to_string()),
                Err(_) => Some(seconds.to_string()),
            }
        }
        _ => result.detail_text(key),
    }
}
