//! A single HTTP call in a verification plan.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use super::predicate::{Extraction, Predicate, is_empty};
use crate::transport::{HttpRequest, Method};
use crate::{Error, Result};

/// How the secret is attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMode {
    /// The secret is sent as each of the named query parameters.
    Query { params: Vec<String> },
    /// The secret is sent as `Authorization: Bearer <secret>`.
    Bearer,
}

impl AuthMode {
    /// Query parameter authentication with the given parameter names.
    pub fn query<I, S>(params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Query {
            params: params.into_iter().map(Into::into).collect(),
        }
    }
}

/// A provider-specific status meaning "valid, but restricted".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningStatus {
    pub status: u16,
    pub note: String,
}

/// One request of a verification plan and the rules to classify its response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationStep {
    pub name: String,
    pub method: Method,
    /// URL template; `{key}` is replaced with an earlier extracted field.
    pub endpoint: String,
    pub auth_mode: AuthMode,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub expected_success_status: u16,
    pub warning_status: Option<WarningStatus>,
    /// Pointer that must exist in a successful body.
    pub envelope: Option<String>,
    pub success_predicate: Predicate,
    pub extract: Vec<Extraction>,
    /// Context keys that must be present and non-empty for this step to run.
    pub requires: Vec<String>,
    /// Failures after liveness is established only add a note.
    pub best_effort: bool,
    pub error_message: Vec<String>,
    pub error_code: Vec<String>,
}

impl VerificationStep {
    /// Creates a `GET` step expecting `200` with no predicate.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>, auth_mode: AuthMode) -> Self {
        Self {
            name: name.into(),
            method: Method::Get,
            endpoint: endpoint.into(),
            auth_mode,
            query: Vec::new(),
            body: None,
            expected_success_status: 200,
            warning_status: None,
            envelope: None,
            success_predicate: Predicate::Always,
            extract: Vec::new(),
            requires: Vec::new(),
            best_effort: false,
            error_message: Vec::new(),
            error_code: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_success_status(mut self, status: u16) -> Self {
        self.expected_success_status = status;
        self
    }

    #[must_use]
    pub fn with_warning_status(mut self, status: u16, note: impl Into<String>) -> Self {
        self.warning_status = Some(WarningStatus {
            status,
            note: note.into(),
        });
        self
    }

    #[must_use]
    pub fn with_envelope(mut self, pointer: impl Into<String>) -> Self {
        self.envelope = Some(pointer.into());
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.success_predicate = predicate;
        self
    }

    #[must_use]
    pub fn with_extract(mut self, extraction: Extraction) -> Self {
        self.extract.push(extraction);
        self
    }

    #[must_use]
    pub fn requires(mut self, key: impl Into<String>) -> Self {
        self.requires.push(key.into());
        self
    }

    #[must_use]
    pub fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    #[must_use]
    pub fn with_error_message(mut self, pointer: impl Into<String>) -> Self {
        self.error_message.push(pointer.into());
        self
    }

    #[must_use]
    pub fn with_error_code(mut self, pointer: impl Into<String>) -> Self {
        self.error_code.push(pointer.into());
        self
    }

    /// Returns the first required context key that is absent or empty.
    pub fn missing_requirement(&self, context: &BTreeMap<String, Value>) -> Option<&str> {
        self.requires
            .iter()
            .find(|key| context.get(key.as_str()).is_none_or(is_empty))
            .map(String::as_str)
    }

    /// Builds the request for this step with the secret attached.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`] if the template references a
    /// missing key or the resulting URL does not parse.
    ///
    /// [`ErrorKind::InvalidInput`]: crate::ErrorKind::InvalidInput
    pub fn build_request(
        &self,
        secret: &str,
        context: &BTreeMap<String, Value>,
    ) -> Result<HttpRequest> {
        let endpoint = render_template(&self.endpoint, context)?;
        let mut url = Url::parse(&endpoint)?;

        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
            if let AuthMode::Query { params } = &self.auth_mode {
                for name in params {
                    pairs.append_pair(name, secret);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let mut request = HttpRequest::new(self.method, url);
        if self.auth_mode == AuthMode::Bearer {
            request = request.with_header("Authorization", format!("Bearer {secret}"));
        }
        if let Some(body) = &self.body {
            request = request
                .with_header("Content-Type", "application/json")
                .with_body(body.clone());
        }

        Ok(request)
    }
}

/// Replaces every `{key}` in `template` with the matching context value,
/// percent-encoded as a path segment.
pub fn render_template(template: &str, context: &BTreeMap<String, Value>) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        output.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(Error::invalid_input()
                .with_message(format!("unterminated placeholder in endpoint '{template}'")));
        };

        let key = &after[..end];
        let value = context.get(key).filter(|v| !is_empty(v)).ok_or_else(|| {
            Error::invalid_input().with_message(format!("endpoint placeholder '{key}' has no value"))
        })?;
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        output.push_str(&encode_segment(&text));
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

fn encode_segment(text: &str) -> String {
    url::form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
