//! Registry operations exposed to the request layer.
//!
//! [`Registry`] is the only component that checks credentials and enforces
//! the upload protocol. Every operation returns a typed [`RegistryError`]
//! for the caller to translate into a response; nothing is retried.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::Utc;
use simplepypi_release::{decode, encode, is_sidecar_for, ReleaseRecord};

use crate::config::{Credentials, RegistryConfig};
use crate::error::{RegistryError, Result};
use crate::name::{is_valid_name, validate_name};
use crate::integrity::DigestAlgorithm;
use crate::store::{is_reserved_package_name, is_staging_name, ArtifactStore};

/// A package registry over one artifact store.
///
/// Holds no mutable state; share it freely between request handlers.
#[derive(Debug, Clone)]
pub struct Registry {
    config: RegistryConfig,
    store: ArtifactStore,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        let store = ArtifactStore::new(config.root.clone());
        Registry { config, store }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Names of all packages, in directory order.
    pub fn list_packages(&self) -> Result<Vec<String>> {
        self.store.list_package_names()
    }

    /// Every committed release of `package`, in directory order.
    ///
    /// Sidecars that cannot be read or decoded are logged and skipped, as are
    /// sidecars whose artifact is missing.
    pub fn list_releases(&self, package: &str) -> Result<Vec<ReleaseRecord>> {
        validate_package(package)?;
        let dir = self.store.package_dir(package);
        let files = self.store.list_files(package)?;

        let mut releases = Vec::new();
        for file_name in files.iter().filter(|f| is_sidecar_for(package, f)) {
            let sidecar = dir.join(file_name);
            let record = match load_record(&sidecar) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable release record");
                    continue;
                }
            };
            if !artifact_present(&dir, &record.filename) {
                tracing::debug!(
                    sidecar = %sidecar.display(),
                    filename = %record.filename,
                    "skipping orphaned release record"
                );
                continue;
            }
            releases.push(record);
        }
        Ok(releases)
    }

    /// Location of a stored artifact, for the caller to stream back.
    pub fn resolve_artifact_path(&self, package: &str, filename: &str) -> Result<PathBuf> {
        validate_package(package)?;
        validate_name(filename)?;
        self.store.artifact_path(package, filename)
    }

    /// Publish one release whose `checksum` is a SHA-256 hex digest.
    ///
    /// Steps run in order and the first failure ends the attempt:
    /// credentials, names, filename convention, write-once check, upload,
    /// digest check, metadata. A failed attempt leaves neither the artifact
    /// nor its sidecar behind. On success the stored record is returned, with
    /// `created_at` set by the server and `checksum` normalised to lowercase.
    pub fn publish_release(
        &self,
        record: ReleaseRecord,
        content: impl Read,
        credentials: Option<&Credentials>,
    ) -> Result<ReleaseRecord> {
        self.publish_release_with(record, DigestAlgorithm::Sha256, content, credentials)
    }

    /// Like [`publish_release`](Self::publish_release), but `record.checksum`
    /// was computed with `algorithm`. The stored checksum is always the
    /// SHA-256 of the content.
    pub fn publish_release_with(
        &self,
        mut record: ReleaseRecord,
        algorithm: DigestAlgorithm,
        content: impl Read,
        credentials: Option<&Credentials>,
    ) -> Result<ReleaseRecord> {
        match credentials {
            Some(given) if self.config.credentials.matches(given) => {}
            _ => return Err(RegistryError::Unauthorized),
        }

        validate_package(&record.package)?;
        validate_name(&record.filename)?;

        let format = record
            .format()
            .ok_or_else(|| RegistryError::UnsupportedFormat {
                filename: record.filename.clone(),
            })?;

        let dir = self.store.ensure_package_dir(&record.package)?;
        let dest = dir.join(&record.filename);
        let sidecar = dir.join(record.sidecar_name());
        if dest.exists() || sidecar.exists() {
            return Err(RegistryError::VersionExists {
                package: record.package.clone(),
                filename: record.filename.clone(),
            });
        }

        let staged = self.store.stage(&record.package, content)?;
        let actual = staged.digest_as(algorithm)?;
        if !actual.matches(&record.checksum) {
            tracing::warn!(
                package = %record.package,
                filename = %record.filename,
                %algorithm,
                expected = %record.checksum,
                actual = %actual,
                "rejecting upload with mismatched checksum"
            );
            return Err(RegistryError::ChecksumMismatch {
                filename: record.filename.clone(),
                expected: record.checksum.clone(),
                actual: actual.0,
            });
        }
        let sha256 = match algorithm {
            DigestAlgorithm::Sha256 => actual,
            DigestAlgorithm::Md5 => staged.digest()?,
        };
        let artifact = staged.commit(&dest)?;

        record.checksum = sha256.0;
        record.created_at = Utc::now();

        if let Err(e) = self.write_record(&sidecar, &record) {
            self.store.remove(&artifact);
            return Err(e);
        }

        tracing::info!(
            package = %record.package,
            version = %record.version,
            filename = %record.filename,
            format = %format,
            "release published"
        );
        Ok(record)
    }

    fn write_record(&self, sidecar: &Path, record: &ReleaseRecord) -> Result<()> {
        let bytes = encode(record).map_err(|e| RegistryError::Storage {
            path: sidecar.to_path_buf(),
            detail: format!("encoding release record: {e}"),
        })?;
        self.store.write_if_absent(sidecar, bytes.as_slice())
    }
}

/// A valid name that also maps to its own subdirectory of the root.
fn validate_package(package: &str) -> Result<()> {
    validate_name(package)?;
    if is_reserved_package_name(package) {
        return Err(RegistryError::InvalidName {
            name: package.to_string(),
        });
    }
    Ok(())
}

/// Read and decode one sidecar.
pub(crate) fn load_record(path: &Path) -> Result<ReleaseRecord> {
    let bytes = std::fs::read(path).map_err(|e| RegistryError::storage(path, "reading", e))?;
    decode(&bytes).map_err(|e| RegistryError::CorruptRecord {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

/// Whether the artifact a record names is present beside it.
pub(crate) fn artifact_present(dir: &Path, filename: &str) -> bool {
    is_valid_name(filename) && !is_staging_name(filename) && dir.join(filename).is_file()
}
