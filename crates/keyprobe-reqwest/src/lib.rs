#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;

pub use crate::client::ReqwestTransport;
pub use crate::config::{DEFAULT_TIMEOUT_SECS, ReqwestConfig};
pub use crate::error::{Error, Result};

/// Tracing target for reqwest transport operations.
pub const TRACING_TARGET: &str = "keyprobe_reqwest::transport";
