//! Peer ownership for Earthbind.
//!
//! One [`PeerContainer`] per application instance owns the engine peer. It
//! attaches shares through a caller-supplied [`ReplicaFactory`], records them
//! in the session, and validates the session's share selection against what
//! the peer actually holds. [`PeerChangeNotifier`] turns the peer's wildcard
//! event stream into revision bumps.

pub mod container;
pub mod error;
pub mod notifier;

pub use container::{memory_replicas, AddShare, PeerContainer, ReplicaFactory};
pub use error::{PeerError, PeerResult};
pub use notifier::PeerChangeNotifier;
