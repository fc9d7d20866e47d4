//! Reqwest-based HTTP transport for credential probes.

use std::sync::Arc;

use keyprobe_core::transport::{HttpRequest, HttpResponse, Method, TlsMode, Transport};
use reqwest::Client;

use crate::{ReqwestConfig, Result, TRACING_TARGET};

/// Inner client that holds both HTTP clients and the configuration.
struct ReqwestTransportInner {
    verified: Client,
    unverified: Client,
    config: ReqwestConfig,
}

/// Reqwest-based [`Transport`] with a certificate-relaxed fallback client.
///
/// Two clients are built up front with identical timeouts and user agent.
/// The second one accepts invalid certificates and is only used for
/// requests marked [`TlsMode::Unverified`].
///
/// # Examples
///
/// ```rust,ignore
/// use keyprobe_core::{CredentialProbe, Provider};
/// use keyprobe_reqwest::{ReqwestConfig, ReqwestTransport};
///
/// let transport = ReqwestTransport::new(ReqwestConfig::default())?;
/// let probe = CredentialProbe::new(transport);
/// let credential = Provider::OpenAi.credential().from_env();
/// let result = probe.probe(&credential, &Provider::OpenAi.default_plan()).await?;
/// ```
#[derive(Clone)]
pub struct ReqwestTransport {
    inner: Arc<ReqwestTransportInner>,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Creates a new transport with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(config: ReqwestConfig) -> Result<Self> {
        let timeout = config.effective_timeout();
        let user_agent = config.effective_user_agent();

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_ms = timeout.as_millis(),
            user_agent = %user_agent,
            "Creating reqwest transport"
        );

        let verified = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .build()?;

        let unverified = Client::builder()
            .timeout(timeout)
            .user_agent(&user_agent)
            .danger_accept_invalid_certs(true)
            .build()?;

        let inner = ReqwestTransportInner {
            verified,
            unverified,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Gets the transport configuration.
    pub fn config(&self) -> &ReqwestConfig {
        &self.inner.config
    }

    /// Returns the client matching the requested TLS mode.
    fn http(&self, tls: TlsMode) -> &Client {
        match tls {
            TlsMode::Verified => &self.inner.verified,
            TlsMode::Unverified => &self.inner.unverified,
        }
    }

    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let http = self.http(request.tls);

        let mut builder = match request.method {
            Method::Get => http.get(request.url.clone()),
            Method::Post => http.post(request.url.clone()),
        };

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        if let Some(body) = &request.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse::new(status, body))
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> keyprobe_core::Result<HttpResponse> {
        tracing::debug!(
            target: TRACING_TARGET,
            request = ?request,
            "Sending probe request"
        );

        let response = self
            .execute(request)
            .await
            .map_err(keyprobe_core::Error::from)?;

        tracing::debug!(
            target: TRACING_TARGET,
            status_code = response.status,
            body_bytes = response.body.len(),
            "Probe request completed"
        );

        Ok(response)
    }
}
