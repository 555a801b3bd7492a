//! Content digests.
//!
//! Artifacts are identified by the SHA-256 of their bytes. Publishers declare
//! a digest up front and the server recomputes it after the upload lands.
//! Older upload tools only send MD5, which is verified as declared; the stored
//! checksum is always SHA-256.

use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};

use crate::error::{RegistryError, Result};

/// Hash function a publisher-declared digest was computed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Md5,
}

impl DigestAlgorithm {
    /// Hash `data` with this algorithm.
    pub fn hash(self, data: &[u8]) -> ContentHash {
        match self {
            DigestAlgorithm::Sha256 => ContentHash(hex_encode(&Sha256::digest(data))),
            DigestAlgorithm::Md5 => ContentHash(hex_encode(&Md5::digest(data))),
        }
    }

    /// Read a whole file and hash it with this algorithm.
    pub fn hash_file(self, path: &Path) -> Result<ContentHash> {
        let data = std::fs::read(path).map_err(|e| RegistryError::storage(path, "reading", e))?;
        Ok(self.hash(&data))
    }
}

impl std::fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DigestAlgorithm::Sha256 => write!(f, "sha256"),
            DigestAlgorithm::Md5 => write!(f, "md5"),
        }
    }
}

/// A content hash (lowercase hex digest, SHA-256 unless stated otherwise).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Compute the SHA-256 hash of the given data.
    pub fn compute(data: &[u8]) -> Self {
        DigestAlgorithm::Sha256.hash(data)
    }

    /// Read a whole file and hash it with SHA-256.
    pub fn compute_file(path: &Path) -> Result<Self> {
        DigestAlgorithm::Sha256.hash_file(path)
    }

    /// Get the hex string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a publisher-declared hex digest, ignoring case.
    pub fn matches(&self, declared: &str) -> bool {
        self.0.eq_ignore_ascii_case(declared.trim())
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode bytes as lowercase hex string.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
