//! The per-release record and the naming rules tying it to files on disk.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// File extension of sidecar metadata files (without the leading dot).
pub const METADATA_EXTENSION: &str = "rel";

/// Metadata for one uploaded artifact version.
///
/// `package`, `version`, `filename`, `checksum` and `created_at` are required
/// when decoding; the free-text fields default to empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseRecord {
    /// Owning package name.
    pub package: String,
    /// Publisher-supplied version string. Never parsed.
    pub version: String,
    /// Artifact file name, `<package>-<version><ext>`.
    pub filename: String,
    /// Lowercase hex digest of the artifact content.
    pub checksum: String,
    /// Server-assigned publish time.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_email: String,
}

impl ReleaseRecord {
    /// Create a record with empty free-text fields, stamped with the current time.
    pub fn new(
        package: impl Into<String>,
        version: impl Into<String>,
        filename: impl Into<String>,
        checksum: impl Into<String>,
    ) -> Self {
        ReleaseRecord {
            package: package.into(),
            version: version.into(),
            filename: filename.into(),
            checksum: checksum.into(),
            created_at: Utc::now(),
            summary: String::new(),
            description: String::new(),
            author: String::new(),
            author_email: String::new(),
        }
    }

    /// Name of the sidecar file that stores this record.
    pub fn sidecar_name(&self) -> String {
        sidecar_name(&self.package, &self.version)
    }

    /// The archive format implied by `filename`, if it follows the naming rule.
    pub fn format(&self) -> Option<ArtifactFormat> {
        ArtifactFormat::from_filename(&self.package, &self.version, &self.filename)
    }
}

/// Accepted artifact archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    /// Gzipped source tarball (`.tar.gz`).
    SourceTarball,
    /// Zip archive (`.zip`).
    Zip,
    /// Python egg (`.egg`).
    Egg,
}

impl ArtifactFormat {
    /// Every accepted format, in matching order.
    pub const ALL: [ArtifactFormat; 3] = [
        ArtifactFormat::SourceTarball,
        ArtifactFormat::Zip,
        ArtifactFormat::Egg,
    ];

    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::SourceTarball => ".tar.gz",
            ArtifactFormat::Zip => ".zip",
            ArtifactFormat::Egg => ".egg",
        }
    }

    /// The artifact file name for `package` at `version` in this format.
    pub fn filename(&self, package: &str, version: &str) -> String {
        format!("{package}-{version}{}", self.extension())
    }

    /// Find the format for which `filename` is exactly `<package>-<version><ext>`.
    pub fn from_filename(package: &str, version: &str, filename: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|fmt| fmt.filename(package, version) == filename)
    }
}

impl std::fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Sidecar file name for `package` at `version`.
pub fn sidecar_name(package: &str, version: &str) -> String {
    format!("{package}-{version}.{METADATA_EXTENSION}")
}

/// Whether `file_name` looks like a sidecar belonging to `package`.
pub fn is_sidecar_for(package: &str, file_name: &str) -> bool {
    file_name
        .strip_prefix(package)
        .and_then(|rest| rest.strip_prefix('-'))
        .and_then(|rest| rest.strip_suffix(METADATA_EXTENSION))
        .is_some_and(|middle| middle.len() > 1 && middle.ends_with('.'))
}
