//! In-memory transport for testing probes without a network.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! keyprobe-core = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use keyprobe_core::mock::{MockTransport, Reply};
//!
//! let transport = MockTransport::new()
//!     .on("/api/0/organizations/", Reply::json(200, serde_json::json!([])));
//! let probe = CredentialProbe::new(transport);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;

use crate::transport::{HttpRequest, HttpResponse, TlsMode, Transport};
use crate::{Error, ErrorKind, Result};

/// A canned answer from [`MockTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// An HTTP response.
    Response(HttpResponse),
    /// A transport-level failure of the given kind.
    Error(ErrorKind),
}

impl Reply {
    /// Response with a JSON body.
    pub fn json(status: u16, body: Value) -> Self {
        Self::Response(HttpResponse::new(status, body.to_string()))
    }

    /// Response with a raw text body.
    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::Response(HttpResponse::new(status, body))
    }

    /// Transport failure.
    pub fn error(kind: ErrorKind) -> Self {
        Self::Error(kind)
    }
}

#[derive(Debug, Default)]
struct State {
    once: VecDeque<(String, Reply)>,
    routes: Vec<(String, Reply)>,
    requests: Vec<HttpRequest>,
}

/// Scripted [`Transport`] that records every request it receives.
///
/// Replies registered with [`once`](Self::once) are consumed in order before
/// the repeatable routes registered with [`on`](Self::on). Routes match on
/// the URL path suffix. Unmatched requests get a `404`.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
    broken_certificate: bool,
}

impl MockTransport {
    /// Creates a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers every request whose path ends with `path`.
    #[must_use]
    pub fn on(self, path: impl Into<String>, reply: Reply) -> Self {
        self.lock().routes.push((path.into(), reply));
        self
    }

    /// Answers the next request whose path ends with `path`, once.
    #[must_use]
    pub fn once(self, path: impl Into<String>, reply: Reply) -> Self {
        self.lock().once.push_back((path.into(), reply));
        self
    }

    /// Fails every certificate-verified request with a TLS error.
    #[must_use]
    pub fn with_broken_certificate(mut self) -> Self {
        self.broken_certificate = true;
        self
    }

    /// Returns a copy of every request received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    /// Returns the number of requests received so far.
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut state = self.lock();
        state.requests.push(request.clone());

        if self.broken_certificate && request.tls == TlsMode::Verified {
            return Err(Error::tls().with_message("invalid peer certificate: UnknownIssuer"));
        }

        let path = request.url.path().to_owned();
        let reply = match state.once.iter().position(|(p, _)| path.ends_with(p.as_str())) {
            Some(index) => state.once.remove(index).map(|(_, reply)| reply),
            None => state
                .routes
                .iter()
                .find(|(p, _)| path.ends_with(p.as_str()))
                .map(|(_, reply)| reply.clone()),
        };

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(kind)) => Err(Error::new(kind).with_message("scripted failure")),
            None => Ok(HttpResponse::new(404, r#"{"detail":"Not found"}"#)),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use url::Url;

    use super::*;
    use crate::transport::Method;

    fn get(url: &str) -> HttpRequest {
        HttpRequest::new(Method::Get, Url::parse(url).unwrap())
    }

    #[tokio::test]
    async fn test_once_before_routes() {
        let transport = MockTransport::new()
            .on("/me", Reply::json(200, json!({"id": "1"})))
            .once("/me", Reply::json(500, json!({})));

        let first = transport.send(&get("https://x.test/v18.0/me")).await.unwrap();
        let second = transport.send(&get("https://x.test/v18.0/me")).await.unwrap();

        assert_eq!(first.status, 500);
        assert_eq!(second.status, 200);
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unmatched_is_not_found() {
        let transport = MockTransport::new();
        let response = transport.send(&get("https://x.test/nothing")).await.unwrap();
        assert_eq!(response.status, 404);
    }
}
