//! Storage engine for the simplepypi private package index.
//!
//! Accepts uploaded distribution archives, stores them in a
//! directory-per-package layout next to a binary sidecar describing each
//! release, and reads that metadata back for the index pages.
//!
//! # Architecture
//!
//! - **[`name`]** — Package and file name validation
//! - **[`store`]** — Filesystem layout, staging, and write-once commits
//! - **[`engine`]** — The [`Registry`] operations a request layer calls
//! - **[`audit`]** — Read-only consistency check over the whole store
//!
//! Layout:
//! ```text
//! <root>/
//!   <package>/
//!     <package>-<version><ext>     — artifact (.tar.gz, .zip, .egg)
//!     <package>-<version>.rel      — release sidecar
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod integrity;
pub mod name;
pub mod store;

// Re-exports for convenience.
pub use audit::{audit, format_report, AuditReport};
pub use config::{Credentials, RegistryConfig};
pub use engine::Registry;
pub use error::{RegistryError, Result};
pub use integrity::{ContentHash, DigestAlgorithm};
pub use name::is_valid_name;
pub use simplepypi_release::{ArtifactFormat, ReleaseRecord};
pub use store::ArtifactStore;
