use eb_engine::EngineError;
use thiserror::Error;

/// Why an invitation could not be decoded or made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InviteError {
    #[error("not a valid URL")]
    NotAUrl,

    #[error("not a valid invitation URL")]
    NotAnInvitation,

    #[error("unrecognized invitation format version")]
    UnsupportedVersion,

    #[error("no share found in invitation")]
    MissingShare,

    /// The share failed the engine's validity check.
    #[error(transparent)]
    InvalidShare(#[from] EngineError),

    #[error("malformed sync-server URL found")]
    MalformedServerUrl,

    /// No explicit share and no selection to invite to.
    #[error("Couldn't create invitation code!")]
    NothingToInvite,
}

pub type InviteResult<T> = std::result::Result<T, InviteError>;
