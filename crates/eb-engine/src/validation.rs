//! Share address validation.
//!
//! A share address is `+<name>.<suffix>`:
//!
//! - `name`: 1 to 15 characters of `a-z0-9`, starting with a letter
//! - `suffix`: 1 to 53 characters of `a-z0-9`

use crate::error::{EngineError, EngineResult};

const NAME_MAX: usize = 15;
const SUFFIX_MAX: usize = 53;

/// Check that `address` is a well-formed share address.
pub fn check_share_is_valid(address: &str) -> EngineResult<()> {
    let invalid = |reason: &str| EngineError::InvalidShare {
        address: address.to_string(),
        reason: reason.to_string(),
    };

    let rest = address
        .strip_prefix('+')
        .ok_or_else(|| invalid("must start with '+'"))?;
    let (name, suffix) = rest
        .split_once('.')
        .ok_or_else(|| invalid("must contain a '.' between name and suffix"))?;

    if name.is_empty() || name.len() > NAME_MAX {
        return Err(invalid("name must be 1 to 15 characters"));
    }
    if suffix.is_empty() || suffix.len() > SUFFIX_MAX {
        return Err(invalid("suffix must be 1 to 53 characters"));
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(invalid("name must start with a lowercase letter"));
    }
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
    if !name.chars().all(allowed) {
        return Err(invalid("name may only contain a-z and 0-9"));
    }
    if !suffix.chars().all(allowed) {
        return Err(invalid("suffix may only contain a-z and 0-9"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed() {
        check_share_is_valid("+share.foo").unwrap();
        check_share_is_valid("+a.b").unwrap();
        check_share_is_valid("+abc123.x9").unwrap();
    }

    #[test]
    fn rejects_missing_plus() {
        let err = check_share_is_valid("share.foo").unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("'+'"));
    }

    #[test]
    fn rejects_space() {
        assert!(check_share_is_valid(" share.foo").is_err());
        assert!(check_share_is_valid("+sha re.foo").is_err());
    }

    #[test]
    fn rejects_missing_suffix() {
        assert!(check_share_is_valid("+share").is_err());
        assert!(check_share_is_valid("+share.").is_err());
    }

    #[test]
    fn rejects_long_name() {
        assert!(check_share_is_valid("+abcdefghijklmnop.x").is_err());
        check_share_is_valid("+abcdefghijklmno.x").unwrap();
    }

    #[test]
    fn rejects_leading_digit_and_uppercase() {
        assert!(check_share_is_valid("+1share.foo").is_err());
        assert!(check_share_is_valid("+Share.foo").is_err());
        assert!(check_share_is_valid("+share.Foo").is_err());
    }
}
