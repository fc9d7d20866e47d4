//! HTTP transport abstraction used by the probe engine.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};
use url::Url;

use crate::Result;

/// HTTP verbs used by verification steps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
}

/// Whether the server certificate is verified for a request.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    /// Normal certificate verification.
    #[default]
    Verified,
    /// Certificate verification disabled.
    Unverified,
}

/// A fully resolved request, ready to be sent.
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL including query parameters.
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub tls: TlsMode,
}

// Query strings and headers carry the secret.
impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut endpoint = self.url.clone();
        endpoint.set_query(None);

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("endpoint", &endpoint.as_str())
            .field("tls", &self.tls)
            .finish_non_exhaustive()
    }
}

impl HttpRequest {
    /// Creates a request without headers or body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
            tls: TlsMode::Verified,
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the TLS verification mode.
    #[must_use]
    pub fn with_tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Returns the value of the first header with the given name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the value of the first query parameter with the given name.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// Raw response from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    /// Creates a new response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Sends HTTP requests on behalf of the probe engine.
///
/// Implementations map certificate failures to [`ErrorKind::Tls`] so the
/// engine can decide whether to retry without verification.
///
/// [`ErrorKind::Tls`]: crate::ErrorKind::Tls
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends a single request and returns the response.
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}
