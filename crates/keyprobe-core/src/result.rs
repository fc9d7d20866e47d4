//! Probe outcome types.

use std::collections::BTreeMap;

use jiff::Timestamp;
use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display};

use crate::{ErrorKind, Provider};

/// Liveness classification of a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProbeStatus {
    /// The provider accepted the credential.
    Active,
    /// The provider rejected the credential or answered unexpectedly.
    Inactive,
    /// The credential is accepted but restricted (permissions, quota).
    ActiveWithWarning,
    /// Liveness could not be determined (transport failure).
    Indeterminate,
}

impl ProbeStatus {
    /// Returns `true` for statuses that prove the credential works.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Active | Self::ActiveWithWarning)
    }
}

/// Why a probe did not end in `Active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cause {
    pub kind: ErrorKind,
    pub message: String,
    /// Error message embedded in the provider's response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_message: Option<String>,
    /// Error code embedded in the provider's response body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_code: Option<String>,
}

impl Cause {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider_message: None,
            provider_code: None,
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Passed,
    Rejected,
    Warning,
    Skipped,
    Failed,
}

/// What happened for a single verification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepReport {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    pub outcome: StepOutcome,
}

/// Terminal result of a probe.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub provider: Provider,
    pub status: ProbeStatus,
    /// Metadata extracted from responses, informational only.
    pub detail: BTreeMap<String, Value>,
    /// Last HTTP status observed, if any response arrived.
    pub raw_http_status: Option<u16>,
    pub tls_bypassed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Cause>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    pub steps: Vec<StepReport>,
    pub checked_at: Timestamp,
}

impl ProbeResult {
    /// Returns a detail value rendered as plain text.
    pub fn detail_text(&self, key: &str) -> Option<String> {
        self.detail.get(key).map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", "),
            other => other.to_string(),
        })
    }

    /// Returns the kind of the failure cause, if any.
    pub fn cause_kind(&self) -> Option<ErrorKind> {
        self.cause.as_ref().map(|cause| cause.kind)
    }
}
