//! Error types for share attachment.

use eb_engine::EngineError;
use eb_types::ShareAddress;
use thiserror::Error;

/// Why a share could not be attached.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PeerError {
    /// The replica factory refused the address.
    #[error("could not create a replica for {share}: {source}")]
    Factory {
        share: ShareAddress,
        #[source]
        source: EngineError,
    },

    /// The peer refused the replica.
    #[error("peer refused the replica for {share}: {source}")]
    Attach {
        share: ShareAddress,
        #[source]
        source: EngineError,
    },
}

impl PeerError {
    pub fn share(&self) -> &ShareAddress {
        match self {
            Self::Factory { share, .. } | Self::Attach { share, .. } => share,
        }
    }
}

pub type PeerResult<T> = std::result::Result<T, PeerError>;
