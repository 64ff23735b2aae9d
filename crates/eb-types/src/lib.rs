//! Foundation types for Earthbind.
//!
//! Earthbind binds a local replicated-data peer to a view layer. This crate
//! holds the vocabulary shared by every other `eb-*` crate.
//!
//! # Key Types
//!
//! - [`ShareAddress`] -- Identifier of a replicated share
//! - [`SyncServerUrl`] -- A remote synchronization endpoint
//! - [`Identity`] -- An author keypair record, replaced wholesale on sign-in/out
//! - [`Subscription`] -- Scoped cancel handle, released exactly once
//! - [`Invalidator`] -- Revision counter that tells the view layer to re-read
//! - [`EventBus`] -- Fan-out listener registry

pub mod bus;
pub mod error;
pub mod identity;
pub mod server;
pub mod share;
pub mod signal;

pub use bus::EventBus;
pub use error::TypeError;
pub use identity::{identity_label, Identity, NOT_SIGNED_IN};
pub use server::SyncServerUrl;
pub use share::ShareAddress;
pub use signal::{Invalidator, Subscription};
