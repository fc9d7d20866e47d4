//! Structured error type shared by the probe engine and transports.

use serde::Serialize;
use strum::{AsRefStr, Display, IntoStaticStr};
use thiserror::Error;

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Type alias for Results with our custom Error type.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Categories of errors that can occur while probing a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[derive(AsRefStr, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The credential is missing or still holds its placeholder value.
    Configuration,
    /// A verification plan or request could not be built.
    InvalidInput,
    /// DNS failure, refused connection or another network-level error.
    NetworkError,
    /// The request did not complete within the configured timeout.
    Timeout,
    /// TLS handshake or certificate verification failed.
    Tls,
    /// The provider answered with a body of unexpected shape.
    Protocol,
    /// The provider rejected the credential.
    Authentication,
    /// The credential is valid but not allowed to perform the call.
    Authorization,
    /// The provider is throttling the credential.
    RateLimited,
    /// The provider answered with an unexpected status code.
    ExternalError,
}

impl ErrorKind {
    /// Returns `true` for failures that happened below HTTP.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::NetworkError | Self::Timeout | Self::Tls)
    }
}

/// Structured error type with classification and an optional source.
#[must_use]
#[derive(Debug, Error)]
#[error("[{kind}]{}", message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional error message.
    pub message: Option<String>,
    /// Optional source error.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Creates a new configuration error.
    pub fn configuration() -> Self {
        Self::new(ErrorKind::Configuration)
    }

    /// Creates a new invalid input error.
    pub fn invalid_input() -> Self {
        Self::new(ErrorKind::InvalidInput)
    }

    /// Creates a new network error.
    pub fn network_error() -> Self {
        Self::new(ErrorKind::NetworkError)
    }

    /// Creates a new timeout error.
    pub fn timeout() -> Self {
        Self::new(ErrorKind::Timeout)
    }

    /// Creates a new TLS error.
    pub fn tls() -> Self {
        Self::new(ErrorKind::Tls)
    }

    /// Creates a new protocol error.
    pub fn protocol() -> Self {
        Self::new(ErrorKind::Protocol)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error kind as a string.
    pub fn kind_str(&self) -> &'static str {
        self.kind.into()
    }

    /// Returns the message, falling back to the kind name.
    pub fn describe(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => self.kind.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::protocol()
            .with_message("response body is not valid JSON")
            .with_source(error)
    }
}

impl From<url::ParseError> for Error {
    fn from(error: url::ParseError) -> Self {
        Self::invalid_input()
            .with_message(format!("invalid endpoint URL: {error}"))
            .with_source(error)
    }
}
