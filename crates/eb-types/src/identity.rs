use std::fmt;

use serde::{Deserialize, Serialize};

/// Label shown when no identity is signed in.
pub const NOT_SIGNED_IN: &str = "Not signed in";

/// An author keypair record: public address plus secret.
///
/// Identities are never edited in place. Signing in or out replaces the
/// session's identity wholesale.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Public author address, e.g. `@suzy.bjzee56v2hd6mv5r5ar3xqg3x3oyugf7`.
    pub address: String,
    /// Signing secret. Never printed by `Debug`.
    pub secret: String,
}

impl Identity {
    pub fn new(address: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            secret: secret.into(),
        }
    }

    /// The short name between the leading `@` and the first `.`.
    pub fn short_name(&self) -> &str {
        short_name(&self.address)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("address", &self.address)
            .field("secret", &"<redacted>")
            .finish()
    }
}

fn short_name(address: &str) -> &str {
    let rest = address.strip_prefix('@').unwrap_or(address);
    rest.split('.').next().unwrap_or(rest)
}

/// `@<short name>` for a signed-in identity, [`NOT_SIGNED_IN`] otherwise.
pub fn identity_label(identity: Option<&Identity>) -> String {
    match identity {
        Some(identity) => format!("@{}", identity.short_name()),
        None => NOT_SIGNED_IN.to_string(),
    }
}
