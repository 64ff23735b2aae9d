//! Session state for Earthbind.
//!
//! A session is five values: the signed-in identity, the known sync servers,
//! the shares attached to the peer, the selected share, and the live flag.
//! [`SessionStore`] is the single source of truth for them. Every mutation is
//! written back to a [`DurableStore`] under a namespaced key scheme, and
//! [`PersistedSessionSync`] re-reads that store whenever another instance of
//! the application writes to it.
//!
//! # Modules
//!
//! - [`error`] -- Error types for session and storage operations
//! - [`keys`] -- The namespaced key scheme ([`SessionKeys`])
//! - [`durable`] -- The [`DurableStore`] contract
//! - [`memory`] -- [`MemoryBackend`], a store shared by several instances
//! - [`file`] -- [`JsonFileStore`], a JSON file on disk
//! - [`session`] -- [`SessionStore`] and [`SessionState`]
//! - [`persisted`] -- [`PersistedSessionSync`]

pub mod durable;
pub mod error;
pub mod file;
pub mod keys;
pub mod memory;
pub mod persisted;
pub mod session;

pub use durable::{DurableStore, InstanceId, StorageEvent};
pub use error::{SessionError, SessionResult};
pub use file::JsonFileStore;
pub use keys::SessionKeys;
pub use memory::{MemoryBackend, MemoryStore};
pub use persisted::{load_session, PersistedSessionSync};
pub use session::{SessionState, SessionStore};
