//! Filesystem-backed artifact store.
//!
//! Maps `(package, filename)` pairs onto a directory-per-package tree and
//! provides the write-once primitive the registry builds on.
//!
//! Layout:
//! ```text
//! <root>/
//!   <package>/
//!     <filename>            — committed file
//!     .upload-XXXXXX        — staging file, only while an upload is in flight
//! ```
//!
//! Uploads are written to a staging file in the package directory first and
//! then linked into place with an exclusive create, so a committed name never
//! holds partial content and two writers can never both win the same name.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{RegistryError, Result};
use crate::integrity::{ContentHash, DigestAlgorithm};
use crate::name::is_valid_name;

/// Prefix of in-flight staging files. Never a valid committed name.
pub const STAGING_PREFIX: &str = ".upload-";

/// Whether `name` is reserved for staging files.
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with(STAGING_PREFIX)
}

/// Whether `name` cannot be a package: `.` is the root itself and staging
/// names are never committed.
pub fn is_reserved_package_name(name: &str) -> bool {
    name == "." || is_staging_name(name)
}

/// A package tree rooted at a configured directory.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

/// Content streamed into a package directory but not yet given its final
/// name. Dropping it deletes the staging file.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl ArtifactStore {
    /// Create a store rooted at the given directory.
    pub fn new(root: PathBuf) -> Self {
        ArtifactStore { root }
    }

    /// Get the root directory of this store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for `package`. Does not validate the name.
    pub fn package_dir(&self, package: &str) -> PathBuf {
        self.root.join(package)
    }

    /// Names of the immediate subdirectories of the root, in directory order.
    ///
    /// A root that does not exist yet holds no packages.
    pub fn list_package_names(&self) -> Result<Vec<String>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut packages = Vec::new();
        for entry in std::fs::read_dir(&self.root)
            .map_err(|e| RegistryError::storage(&self.root, "listing packages", e))?
        {
            let entry = entry.map_err(|e| RegistryError::storage(&self.root, "reading entry", e))?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    packages.push(name.to_string());
                }
            }
        }
        Ok(packages)
    }

    /// Names of the regular files in a package directory, in directory order.
    pub fn list_files(&self, package: &str) -> Result<Vec<String>> {
        let dir = self.package_dir(package);
        if !dir.is_dir() {
            return Err(RegistryError::not_found(format!("package '{package}'")));
        }

        let mut files = Vec::new();
        for entry in
            std::fs::read_dir(&dir).map_err(|e| RegistryError::storage(&dir, "listing files", e))?
        {
            let entry = entry.map_err(|e| RegistryError::storage(&dir, "reading entry", e))?;
            if entry.path().is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    files.push(name.to_string());
                }
            }
        }
        Ok(files)
    }

    /// Path of a committed file.
    ///
    /// Fails with `NotFound` when either name is invalid, names a staging
    /// file, or the path is not an existing regular file.
    pub fn artifact_path(&self, package: &str, filename: &str) -> Result<PathBuf> {
        if !is_valid_name(package)
            || is_reserved_package_name(package)
            || !is_valid_name(filename)
            || is_staging_name(filename)
        {
            return Err(RegistryError::not_found(format!("{package}/{filename}")));
        }
        let path = self.package_dir(package).join(filename);
        if !path.is_file() {
            return Err(RegistryError::not_found(format!("{package}/{filename}")));
        }
        Ok(path)
    }

    /// Create the package directory (and the root) if missing. Safe to race.
    pub fn ensure_package_dir(&self, package: &str) -> Result<PathBuf> {
        let dir = self.package_dir(package);
        std::fs::create_dir_all(&dir)
            .map_err(|e| RegistryError::storage(&dir, "creating package dir", e))?;
        Ok(dir)
    }

    /// Digest of the whole file at `path`.
    pub fn compute_digest(&self, path: &Path) -> Result<ContentHash> {
        ContentHash::compute_file(path)
    }

    /// Stream `content` into a fresh staging file inside the package directory.
    ///
    /// The directory must already exist.
    pub fn stage(&self, package: &str, content: impl Read) -> Result<StagedFile> {
        stage_in(&self.package_dir(package), content)
    }

    /// Write `content` to `path` unless something already exists there.
    ///
    /// Fails with `VersionExists` if the name is taken, including when another
    /// writer claims it while this one is still streaming.
    pub fn write_if_absent(&self, path: &Path, content: impl Read) -> Result<()> {
        if path.exists() {
            return Err(already_exists(path));
        }
        let dir = path.parent().unwrap_or(&self.root);
        stage_in(dir, content)?.commit(path).map(|_| ())
    }

    /// Best-effort delete, used for rollback. Failures are logged, not returned.
    pub fn remove(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), error = %e, "rollback could not remove file");
            }
        }
    }
}

impl StagedFile {
    /// Current location of the staged content.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// SHA-256 of everything written so far.
    pub fn digest(&self) -> Result<ContentHash> {
        ContentHash::compute_file(self.path())
    }

    /// Digest of everything written so far, with the given algorithm.
    pub fn digest_as(&self, algorithm: DigestAlgorithm) -> Result<ContentHash> {
        algorithm.hash_file(self.path())
    }

    /// Give the staged content its final name, failing with `VersionExists`
    /// rather than replacing an existing file.
    pub fn commit(self, dest: &Path) -> Result<PathBuf> {
        match self.file.persist_noclobber(dest) {
            Ok(_) => Ok(dest.to_path_buf()),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(already_exists(dest))
            }
            Err(e) => Err(RegistryError::storage(dest, "committing upload", e.error)),
        }
    }
}

fn stage_in(dir: &Path, mut content: impl Read) -> Result<StagedFile> {
    let mut file = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempfile_in(dir)
        .map_err(|e| RegistryError::storage(dir, "creating staging file", e))?;

    std::io::copy(&mut content, file.as_file_mut())
        .map_err(|e| RegistryError::storage(file.path(), "writing upload", e))?;
    file.as_file_mut()
        .flush()
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| RegistryError::storage(file.path(), "syncing upload", e))?;

    Ok(StagedFile { file })
}

fn already_exists(path: &Path) -> RegistryError {
    let name_of = |p: Option<&Path>| {
        p.and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    RegistryError::VersionExists {
        package: name_of(path.parent()),
        filename: name_of(Some(path)),
    }
}
