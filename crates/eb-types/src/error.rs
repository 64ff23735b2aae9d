use thiserror::Error;

/// Errors produced by type construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("share address is empty")]
    EmptyShareAddress,

    #[error("invalid sync-server URL {url}: {reason}")]
    InvalidServerUrl { url: String, reason: String },
}
