//! Registry configuration.

use std::path::PathBuf;

use serde::Deserialize;
use subtle::ConstantTimeEq;

/// The static uploader credential pair.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Constant-time comparison of both fields.
    pub fn matches(&self, other: &Credentials) -> bool {
        let user = self.username.as_bytes().ct_eq(other.username.as_bytes());
        let pass = self.password.as_bytes().ct_eq(other.password.as_bytes());
        (user & pass).into()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Everything the [`Registry`](crate::Registry) needs: where artifacts live and
/// who may upload.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Root directory holding one subdirectory per package.
    pub root: PathBuf,
    /// The only credential pair accepted for uploads.
    pub credentials: Credentials,
}

impl RegistryConfig {
    pub fn new(root: impl Into<PathBuf>, credentials: Credentials) -> Self {
        RegistryConfig {
            root: root.into(),
            credentials,
        }
    }
}
