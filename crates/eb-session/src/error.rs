//! Error types for session and storage operations.

use thiserror::Error;

/// Errors that can occur while reading or writing session state.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A stored value could not be encoded or decoded.
    #[error("serialization error for {key}: {reason}")]
    Serialization { key: String, reason: String },

    /// The backing file is not a JSON object of strings.
    #[error("corrupt session file {path}: {reason}")]
    CorruptFile { path: String, reason: String },

    /// I/O error in a file-backed store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
