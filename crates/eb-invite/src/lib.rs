//! Invitation URLs for Earthbind.
//!
//! An invitation names one share and the sync servers the inviter uses for
//! it:
//!
//! ```text
//! earthstar:///?workspace=+gardening.abc&pub=https://a.example&pub=https://b.example&v=1
//! ```
//!
//! - [`decode`] parses and validates an invitation into an [`Invitation`]
//! - [`Invitation::redeem`] attaches the share and merges its servers into
//!   the session
//! - [`encode`] and [`make_invitation`] go the other way

pub mod codec;
pub mod error;

pub use codec::{
    decode, encode, make_invitation, Invitation, INVITATION_SCHEME, INVITATION_VERSION,
};
pub use error::{InviteError, InviteResult};
