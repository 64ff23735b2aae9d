use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("config error in {path}: {reason}")]
    Config { path: String, reason: String },

    #[error("session error: {0}")]
    Session(#[from] eb_session::SessionError),

    #[error("invitation error: {0}")]
    Invite(#[from] eb_invite::InviteError),

    #[error("cache error: {0}")]
    Cache(#[from] eb_cache::CacheError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SdkResult<T> = Result<T, SdkError>;
