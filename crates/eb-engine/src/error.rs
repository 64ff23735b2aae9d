use eb_types::ShareAddress;
use thiserror::Error;

/// Errors reported by the replication engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The share address failed validation.
    #[error("invalid share address {address}: {reason}")]
    InvalidShare { address: String, reason: String },

    /// The author short name failed validation.
    #[error("invalid author short name {name}: {reason}")]
    InvalidAuthor { name: String, reason: String },

    /// The peer already holds a replica for this share.
    #[error("peer already has a replica for {0}")]
    AlreadyAttached(ShareAddress),

    /// The replica has been closed.
    #[error("replica {0} is closed")]
    ReplicaClosed(ShareAddress),

    /// The cache has been closed.
    #[error("cache for {0} is closed")]
    CacheClosed(ShareAddress),

    /// Any other engine-side refusal.
    #[error("engine rejected the operation: {0}")]
    Rejected(String),
}

impl EngineError {
    /// `true` for validation failures (share or author).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidShare { .. } | Self::InvalidAuthor { .. })
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
