//! Credential resolution and the "configured" check.

use std::fmt;

use crate::{Error, Result};

/// A named credential read from the environment.
///
/// The secret itself never appears in `Debug` output.
#[derive(Clone)]
pub struct CredentialSpec {
    name: String,
    placeholder: String,
    value: Option<String>,
}

impl fmt::Debug for CredentialSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSpec")
            .field("name", &self.name)
            .field("configured", &self.is_configured())
            .finish_non_exhaustive()
    }
}

impl CredentialSpec {
    /// Creates an unresolved credential spec.
    pub fn new(name: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            placeholder: placeholder.into(),
            value: None,
        }
    }

    /// Sets the resolved secret value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the secret value if one was found.
    #[must_use]
    pub fn with_optional_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    /// Resolves the value from the process environment.
    #[must_use]
    pub fn from_env(self) -> Self {
        let value = std::env::var(&self.name).ok();
        self.with_optional_value(value)
    }

    /// Name of the environment variable holding the secret.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sentinel value meaning "not configured yet".
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Returns `true` if the value is non-empty and not the placeholder.
    pub fn is_configured(&self) -> bool {
        self.value
            .as_deref()
            .map(str::trim)
            .is_some_and(|v| !v.is_empty() && v != self.placeholder)
    }

    /// Returns the secret, or a configuration error if it is not usable.
    pub fn secret(&self) -> Result<&str> {
        if !self.is_configured() {
            return Err(Error::configuration().with_message(format!(
                "{} is not set or still has its default value",
                self.name
            )));
        }

        Ok(self.value.as_deref().map(str::trim).unwrap_or_default())
    }

    /// Returns the first `len` characters of the secret for display.
    pub fn prefix(&self, len: usize) -> Option<String> {
        let secret = self.secret().ok()?;
        Some(secret.chars().take(len).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const PLACEHOLDER: &str = "your-sentry-auth-token-here";

    #[test]
    fn test_missing_value_is_not_configured() {
        let spec = CredentialSpec::new("SENTRY_AUTH_TOKEN", PLACEHOLDER);
        assert!(!spec.is_configured());
        assert_eq!(spec.secret().unwrap_err().kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_empty_and_placeholder_values_are_not_configured() {
        let empty = CredentialSpec::new("SENTRY_AUTH_TOKEN", PLACEHOLDER).with_value("");
        let blank = CredentialSpec::new("SENTRY_AUTH_TOKEN", PLACEHOLDER).with_value("   ");
        let placeholder = CredentialSpec::new("SENTRY_AUTH_TOKEN", PLACEHOLDER).with_value(PLACEHOLDER);

        assert!(!empty.is_configured());
        assert!(!blank.is_configured());
        assert!(!placeholder.is_configured());
    }

    #[test]
    fn test_configured_value() {
        let spec = CredentialSpec::new("SENTRY_AUTH_TOKEN", PLACEHOLDER).with_value(" sntrys_abc \n");
        assert!(spec.is_configured());
        assert_eq!(spec.secret().unwrap(), "sntrys_abc");
    }

    #[test]
    fn test_prefix() {
        let spec = CredentialSpec::new("OPENAI_API_KEY", "x").with_value("sk-proj-1234567890");
        assert_eq!(spec.prefix(10).as_deref(), Some("sk-proj-12"));
        assert_eq!(spec.prefix(100).as_deref(), Some("sk-proj-1234567890"));

        let unset = CredentialSpec::new("OPENAI_API_KEY", "x");
        assert!(unset.prefix(10).is_none());
    }

    #[test]
    fn test_debug_hides_secret() {
        let spec = CredentialSpec::new("OPENAI_API_KEY", "x").with_value("sk-secret-value");
        let debug = format!("{spec:?}");

        assert!(debug.contains("OPENAI_API_KEY"));
        assert!(!debug.contains("sk-secret-value"));
    }
}
