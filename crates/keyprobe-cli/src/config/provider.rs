//! Per-provider subcommands.

use clap::{Args, Subcommand};
use keyprobe_core::plan::VerificationPlan;
use keyprobe_core::provider::{COMPLETION_MODEL, openai_completion_plan};
use keyprobe_core::{CredentialSpec, Provider};

/// Which credential to check.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Check a Facebook/Meta Graph API access token.
    Facebook(FacebookArgs),
    /// Check an OpenAI API key.
    #[command(name = "openai")]
    OpenAi(OpenAiArgs),
    /// Check a Sentry auth token.
    Sentry(SentryArgs),
}

/// Facebook/Meta options.
#[derive(Debug, Clone, Args)]
pub struct FacebookArgs {
    /// Access token to check
    #[arg(long = "access-token", env = "FACEBOOK_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Graph API base URL
    #[arg(long = "api-base", env = "FACEBOOK_API_BASE", default_value = "https://graph.facebook.com")]
    pub api_base: String,
}

/// OpenAI options.
#[derive(Debug, Clone, Args)]
pub struct OpenAiArgs {
    /// API key to check
    #[arg(long = "api-key", env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// OpenAI API base URL
    #[arg(long = "api-base", env = "OPENAI_API_BASE", default_value = "https://api.openai.com")]
    pub api_base: String,

    /// Send a tiny chat completion instead of listing models (uses quota)
    #[arg(long)]
    pub completion: bool,

    /// Model used with --completion
    #[arg(long, default_value = COMPLETION_MODEL, requires = "completion")]
    pub model: String,
}

/// Sentry options.
#[derive(Debug, Clone, Args)]
pub struct SentryArgs {
    /// Auth token to check
    #[arg(long = "auth-token", env = "SENTRY_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Sentry base URL (self-hosted installs)
    #[arg(long = "api-base", env = "SENTRY_API_BASE", default_value = "https://sentry.io")]
    pub api_base: String,
}

impl Command {
    /// Provider selected by this subcommand.
    pub fn provider(&self) -> Provider {
        match self {
            Self::Facebook(_) => Provider::Facebook,
            Self::OpenAi(_) => Provider::OpenAi,
            Self::Sentry(_) => Provider::Sentry,
        }
    }

    /// Credential resolved from arguments or the environment.
    pub fn credential(&self) -> CredentialSpec {
        let value = match self {
            Self::Facebook(args) => args.access_token.clone(),
            Self::OpenAi(args) => args.api_key.clone(),
            Self::Sentry(args) => args.auth_token.clone(),
        };
        self.provider().credential().with_optional_value(value)
    }

    /// Verification plan for the selected provider.
    pub fn plan(&self) -> VerificationPlan {
        match self {
            Self::OpenAi(args) if args.completion => {
                openai_completion_plan(args.api_base.trim_end_matches('/'), &args.model)
            }
            Self::Facebook(FacebookArgs { api_base, .. })
            | Self::OpenAi(OpenAiArgs { api_base, .. })
            | Self::Sentry(SentryArgs { api_base, .. }) => self.provider().plan(api_base),
        }
    }
}
