use eb_engine::EngineError;
use eb_types::ShareAddress;
use thiserror::Error;

/// Errors from binding a cache.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Neither an explicit share nor a session selection was available.
    #[error("no share selected")]
    NoSelection,

    /// The peer has no replica for the share.
    #[error("no such share attached: {0}")]
    NoSuchShare(ShareAddress),

    /// The engine could not open the cache.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

pub type CacheResult<T> = std::result::Result<T, CacheError>;
