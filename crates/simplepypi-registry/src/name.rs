//! Package and file name validation.
//!
//! The same rule applies to both: 1 to 40 characters from
//! `[A-Za-z0-9 ._-]`, and never the substring `..`.

use crate::error::{RegistryError, Result};

/// Longest accepted name, in characters.
pub const MAX_NAME_LEN: usize = 40;

/// Check whether `name` is an acceptable package or file name.
pub fn is_valid_name(name: &str) -> bool {
    (1..=MAX_NAME_LEN).contains(&name.len())
        && name.bytes().all(is_name_byte)
        && !name.contains("..")
}

/// Like [`is_valid_name`], but returns [`RegistryError::InvalidName`] on failure.
pub fn validate_name(name: &str) -> Result<()> {
    if is_valid_name(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidName {
            name: name.to_string(),
        })
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b' ' | b'.' | b'_' | b'-')
}
