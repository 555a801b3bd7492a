//! Registry error types.

use std::path::PathBuf;

/// Errors that can occur during registry operations.
///
/// All of them are scoped to a single request; none is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// Package or file name failed validation.
    #[error("invalid name: {name:?}")]
    InvalidName { name: String },

    /// Referenced package or artifact does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Missing or mismatched credentials.
    #[error("invalid username or password")]
    Unauthorized,

    /// Filename is not `<package>-<version>` plus an accepted extension.
    #[error("unsupported file '{filename}': only .tar.gz, .zip and .egg named <package>-<version> are accepted")]
    UnsupportedFormat { filename: String },

    /// The release slot is already taken.
    #[error("'{filename}' already exists for package '{package}'")]
    VersionExists { package: String, filename: String },

    /// Uploaded content does not hash to the declared digest.
    #[error("checksum mismatch for '{filename}': expected {expected}, got {actual}")]
    ChecksumMismatch {
        filename: String,
        expected: String,
        actual: String,
    },

    /// A sidecar metadata file could not be decoded.
    #[error("corrupt release record at {path}: {detail}")]
    CorruptRecord { path: PathBuf, detail: String },

    /// Underlying filesystem failure.
    #[error("storage error at {path}: {detail}")]
    Storage { path: PathBuf, detail: String },
}

impl RegistryError {
    pub(crate) fn storage(path: impl Into<PathBuf>, action: &str, err: std::io::Error) -> Self {
        RegistryError::Storage {
            path: path.into(),
            detail: format!("{action}: {err}"),
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        RegistryError::NotFound { what: what.into() }
    }
}

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
