//! Process exit codes.

use keyprobe_core::{ErrorKind, ProbeResult, ProbeStatus};

/// Exit status reported to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The credential is live (possibly with a warning).
    Live = 0,
    /// The provider rejected the credential.
    Inactive = 1,
    /// The credential is missing or the invocation is invalid.
    Configuration = 2,
    /// No verdict: the provider could not be reached.
    Transport = 3,
    /// The provider answered with something that could not be interpreted.
    Protocol = 4,
}

impl ExitStatus {
    /// Maps a completed probe to an exit status.
    pub fn from_result(result: &ProbeResult) -> Self {
        match result.status {
            ProbeStatus::Active | ProbeStatus::ActiveWithWarning => Self::Live,
            ProbeStatus::Indeterminate => Self::Transport,
            ProbeStatus::Inactive => match result.cause_kind() {
                Some(ErrorKind::Protocol) => Self::Protocol,
                _ => Self::Inactive,
            },
        }
    }

    /// Maps an error that prevented the probe from producing a result.
    pub fn from_error_kind(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Configuration | ErrorKind::InvalidInput => Self::Configuration,
            ErrorKind::Protocol => Self::Protocol,
            ErrorKind::Authentication | ErrorKind::Authorization => Self::Inactive,
            ErrorKind::NetworkError
            | ErrorKind::Timeout
            | ErrorKind::Tls
            | ErrorKind::RateLimited
            | ErrorKind::ExternalError => Self::Transport,
        }
    }

    /// Numeric process exit code.
    pub const fn code(self) -> i32 {
        self as i32
    }
}
