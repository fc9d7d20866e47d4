//! Error types for the reqwest transport.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Result type alias for reqwest transport operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for reqwest transport operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Returns the rustls error behind a failed request, if any.
///
/// rustls failures surface wrapped in an `io::Error`, whose `source()` skips
/// the wrapped value, so each `io::Error` in the chain is unwrapped by hand.
pub(crate) fn tls_failure<'a>(error: &'a (dyn StdError + 'static)) -> Option<&'a rustls::Error> {
    let mut current = Some(error);
    while let Some(err) = current {
        if let Some(tls) = err.downcast_ref::<rustls::Error>() {
            return Some(tls);
        }

        let wrapped = err
            .downcast_ref::<io::Error>()
            .and_then(io::Error::get_ref)
            .and_then(|inner| inner.downcast_ref::<rustls::Error>());
        if wrapped.is_some() {
            return wrapped;
        }

        current = err.source();
    }
    None
}

/// Returns the message of the innermost error in the chain.
fn root_cause(error: &(dyn StdError + 'static)) -> String {
    let mut current = error;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

impl From<Error> for keyprobe_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Reqwest(e) => {
                // The URL carries query-string credentials.
                let e = e.without_url();

                if e.is_timeout() {
                    keyprobe_core::Error::timeout()
                        .with_message("request timed out")
                        .with_source(e)
                } else if let Some(tls) = tls_failure(&e) {
                    let message = format!("certificate verification failed: {tls}");
                    keyprobe_core::Error::tls()
                        .with_message(message)
                        .with_source(e)
                } else if e.is_connect() {
                    let message = format!("connection failed: {}", root_cause(&e));
                    keyprobe_core::Error::network_error()
                        .with_message(message)
                        .with_source(e)
                } else {
                    keyprobe_core::Error::network_error()
                        .with_message(e.to_string())
                        .with_source(e)
                }
            }
            Error::Serde(e) => keyprobe_core::Error::invalid_input()
                .with_message(format!("request body could not be encoded: {e}"))
                .with_source(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use keyprobe_core::ErrorKind;
    use rustls::CertificateError;

    use super::*;

    #[derive(Debug)]
    struct Layer {
        message: &'static str,
        source: Option<Box<dyn StdError + Send + Sync>>,
    }

    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Layer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source
                .as_deref()
                .map(|s| s as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn test_rustls_error_inside_io_error() {
        let certificate = rustls::Error::InvalidCertificate(CertificateError::UnknownIssuer);
        let error = Layer {
            message: "client error (Connect)",
            source: Some(Box::new(io::Error::new(io::ErrorKind::InvalidData, certificate))),
        };

        let tls = tls_failure(&error).unwrap();
        assert!(matches!(tls, rustls::Error::InvalidCertificate(_)));
    }

    #[test]
    fn test_tls_words_in_messages_are_not_tls() {
        let error = Layer {
            message: "error sending request for url (http://tls.example/?token=ssl-handshake-certificate)",
            source: Some(Box::new(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "tls handshake certificate",
            ))),
        };
        assert!(tls_failure(&error).is_none());
    }

    #[test]
    fn test_root_cause() {
        let error = Layer {
            message: "error sending request",
            source: Some(Box::new(Layer {
                message: "Connection refused (os error 111)",
                source: None,
            })),
        };
        assert_eq!(root_cause(&error), "Connection refused (os error 111)");
    }

    #[test]
    fn test_serde_error_maps_to_invalid_input() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = keyprobe_core::Error::from(Error::Serde(source));
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
    }
}
