//! Author identity generation.
//!
//! Addresses take the form `@<short name>.b<52 hex chars>`, where the tail is
//! derived from the secret with BLAKE3. A short name is exactly four
//! characters of `a-z0-9` starting with a letter.

use eb_types::Identity;
use rand::RngCore;

use crate::error::{EngineError, EngineResult};

const SHORT_NAME_LEN: usize = 4;
const ADDRESS_TAIL_LEN: usize = 52;

/// Generate a fresh author identity for `short_name`.
pub fn generate_identity(short_name: &str) -> EngineResult<Identity> {
    check_short_name(short_name)?;
    let mut secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    Ok(identity_from_secret(short_name, &secret))
}

/// Deterministically rebuild the identity for a known secret.
pub fn identity_from_secret(short_name: &str, secret: &[u8; 32]) -> Identity {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"eb-author-v1:");
    hasher.update(secret);
    let tail = hex::encode(hasher.finalize().as_bytes());
    Identity::new(
        format!("@{short_name}.b{}", &tail[..ADDRESS_TAIL_LEN]),
        hex::encode(secret),
    )
}

fn check_short_name(name: &str) -> EngineResult<()> {
    let invalid = |reason: &str| EngineError::InvalidAuthor {
        name: name.to_string(),
        reason: reason.to_string(),
    };
    if name.len() != SHORT_NAME_LEN {
        return Err(invalid("must be exactly 4 characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("must start with a lowercase letter"));
    }
    if !name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
        return Err(invalid("may only contain a-z and 0-9"));
    }
    Ok(())
}
