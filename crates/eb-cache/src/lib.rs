//! Replica cache binding for Earthbind.
//!
//! A [`ReplicaCacheBinding`] holds at most one open [`eb_engine::ReplicaCache`]
//! for the share the view is looking at. Cache updates are delivered through
//! an [`InvalidatorBatcher`], so a burst of updates inside one batch costs the
//! view a single re-read.

pub mod batcher;
pub mod binding;
pub mod error;

pub use batcher::InvalidatorBatcher;
pub use binding::ReplicaCacheBinding;
pub use error::{CacheError, CacheResult};
