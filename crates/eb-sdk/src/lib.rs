//! High-level API for Earthbind.
//!
//! [`Earthbind`] is the application root. It owns one of each component
//! (session store and its cross-instance sync, peer container, live sync
//! manager, cache binding) and exposes them to the view layer, which calls
//! [`Earthbind::tick`] once per scheduling pass.

pub mod app;
pub mod config;
pub mod error;

pub use app::{Earthbind, TickReport};
pub use config::AppConfig;
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use eb_engine::{Document, Peer, ReplicaCache};
pub use eb_peer::AddShare;
pub use eb_session::{DurableStore, JsonFileStore, MemoryBackend, MemoryStore, SessionState};
pub use eb_sync::SyncDelta;
pub use eb_types::{identity_label, Identity, ShareAddress, SyncServerUrl};
