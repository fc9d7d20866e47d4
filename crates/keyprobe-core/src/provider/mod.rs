//! Supported providers and their default verification plans.

mod facebook;
mod openai;
mod sentry;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoStaticStr};

pub use self::facebook::facebook_plan;
pub use self::openai::{COMPLETION_MODEL, openai_completion_plan, openai_plan};
pub use self::sentry::sentry_plan;
use crate::CredentialSpec;
use crate::plan::VerificationPlan;

/// A third-party API whose credentials can be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(AsRefStr, Display, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Facebook / Meta Graph API access tokens.
    Facebook,
    /// OpenAI API keys.
    #[strum(serialize = "openai")]
    #[serde(rename = "openai")]
    OpenAi,
    /// Sentry auth tokens.
    Sentry,
}

impl Provider {
    /// Human-readable provider name.
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Facebook => "Facebook/Meta",
            Self::OpenAi => "OpenAI",
            Self::Sentry => "Sentry",
        }
    }

    /// What the provider calls its credential.
    pub const fn credential_label(&self) -> &'static str {
        match self {
            Self::Facebook => "access token",
            Self::OpenAi => "API key",
            Self::Sentry => "auth token",
        }
    }

    /// Environment variable that holds the credential.
    pub const fn env_var(&self) -> &'static str {
        match self {
            Self::Facebook => "FACEBOOK_ACCESS_TOKEN",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Sentry => "SENTRY_AUTH_TOKEN",
        }
    }

    /// Value shipped in the sample `.env` file.
    pub const fn placeholder(&self) -> &'static str {
        match self {
            Self::Facebook => "your-facebook-access-token-here",
            Self::OpenAi => "your-openai-api-key-here",
            Self::Sentry => "your-sentry-auth-token-here",
        }
    }

    /// Number of leading secret characters shown in reports.
    pub const fn prefix_len(&self) -> usize {
        match self {
            Self::Facebook => 15,
            Self::OpenAi => 10,
            Self::Sentry => 20,
        }
    }

    /// Default API base URL.
    pub const fn default_base_url(&self) -> &'static str {
        match self {
            Self::Facebook => "https://graph.facebook.com",
            Self::OpenAi => "https://api.openai.com",
            Self::Sentry => "https://sentry.io",
        }
    }

    /// Returns an unresolved credential spec for this provider.
    pub fn credential(&self) -> CredentialSpec {
        CredentialSpec::new(self.env_var(), self.placeholder())
    }

    /// Returns the default read-only plan against `base_url`.
    pub fn plan(&self, base_url: &str) -> VerificationPlan {
        let base_url = base_url.trim_end_matches('/');
        match self {
            Self::Facebook => facebook_plan(base_url),
            Self::OpenAi => openai_plan(base_url),
            Self::Sentry => sentry_plan(base_url),
        }
    }

    /// Returns the default plan against the public API.
    pub fn default_plan(&self) -> VerificationPlan {
        self.plan(self.default_base_url())
    }
}
