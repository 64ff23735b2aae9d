//! Live sync management for Earthbind.
//!
//! [`LiveSyncManager`] keeps exactly one open sync channel per known sync
//! server while the session's live flag is set, and none otherwise. It works
//! by reconciliation: each pass diffs the servers that should be open against
//! the channels that are open, closes the stale ones, and opens the missing
//! ones. Channels are [`eb_types::Subscription`]s, so dropping the manager
//! closes everything it opened.

pub mod manager;

pub use manager::{LiveSyncManager, SyncDelta};
