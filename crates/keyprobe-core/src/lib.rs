#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for probe engine operations.
pub const TRACING_TARGET_PROBE: &str = "keyprobe_core::probe";

mod credential;
mod error;
mod probe;
mod result;

pub mod plan;
pub mod provider;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-utils")))]
pub mod mock;

pub use crate::credential::CredentialSpec;
pub use crate::error::{BoxedError, Error, ErrorKind, Result};
pub use crate::probe::{CredentialProbe, ProbeOptions};
pub use crate::provider::Provider;
pub use crate::result::{Cause, ProbeResult, ProbeStatus, StepOutcome, StepReport};
