//! Storage consistency audit.
//!
//! Walks every package directory and cross-checks artifacts against their
//! release records. Read-only: nothing found here is repaired.

use std::collections::HashSet;
use std::path::Path;

use simplepypi_release::{is_sidecar_for, ReleaseRecord};

use crate::engine::{artifact_present, load_record, Registry};
use crate::error::{RegistryError, Result};
use crate::store::is_staging_name;

/// An audit report for the whole store.
#[derive(Debug, Clone)]
pub struct AuditReport {
    /// One entry per package, sorted by name.
    pub entries: Vec<PackageAudit>,
    /// Overall summary.
    pub summary: AuditSummary,
}

/// Audit findings for a single package.
#[derive(Debug, Clone)]
pub struct PackageAudit {
    /// Package name.
    pub package: String,
    /// Releases with both a record and an artifact.
    pub releases: usize,
    /// Problems found in the package directory.
    pub issues: Vec<AuditIssue>,
}

/// A single inconsistency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditIssue {
    /// The stored artifact no longer hashes to the recorded checksum.
    DigestMismatch {
        filename: String,
        expected: String,
        actual: String,
    },
    /// An artifact that exists but could not be hashed.
    UnreadableArtifact { filename: String, detail: String },
    /// A record whose artifact is missing.
    OrphanedMetadata { sidecar: String, filename: String },
    /// A record that cannot be read or decoded.
    CorruptMetadata { sidecar: String, detail: String },
    /// An artifact without a record.
    UntrackedArtifact { filename: String },
    /// Leftover from an interrupted upload.
    StaleStagingFile { filename: String },
}

impl std::fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditIssue::DigestMismatch {
                filename,
                expected,
                actual,
            } => write!(f, "{filename}: digest {actual} does not match recorded {expected}"),
            AuditIssue::UnreadableArtifact { filename, detail } => {
                write!(f, "{filename}: cannot be read ({detail})")
            }
            AuditIssue::OrphanedMetadata { sidecar, filename } => {
                write!(f, "{sidecar}: artifact {filename} is missing")
            }
            AuditIssue::CorruptMetadata { sidecar, detail } => {
                write!(f, "{sidecar}: unreadable record ({detail})")
            }
            AuditIssue::UntrackedArtifact { filename } => {
                write!(f, "{filename}: no release record")
            }
            AuditIssue::StaleStagingFile { filename } => {
                write!(f, "{filename}: leftover from an interrupted upload")
            }
        }
    }
}

/// Summary of the audit.
#[derive(Debug, Clone)]
pub struct AuditSummary {
    /// Number of packages audited.
    pub packages: usize,
    /// Number of consistent releases.
    pub releases: usize,
    /// Total number of issues.
    pub issues: usize,
    /// No issues found anywhere.
    pub passed: bool,
}

/// Audit every package in the registry.
pub fn audit(registry: &Registry) -> Result<AuditReport> {
    let mut packages = registry.list_packages()?;
    packages.sort();

    let mut entries = Vec::new();
    for package in packages {
        entries.push(audit_package(registry, &package)?);
    }

    let releases = entries.iter().map(|e| e.releases).sum();
    let issues = entries.iter().map(|e| e.issues.len()).sum();
    let summary = AuditSummary {
        packages: entries.len(),
        releases,
        issues,
        passed: issues == 0,
    };

    Ok(AuditReport { entries, summary })
}

/// Audit a single package directory.
pub fn audit_package(registry: &Registry, package: &str) -> Result<PackageAudit> {
    let store = registry.store();
    let dir = store.package_dir(package);
    let mut files = store.list_files(package)?;
    files.sort();

    let mut issues = Vec::new();
    let mut tracked = HashSet::new();
    let mut releases = 0;

    for sidecar in files.iter().filter(|f| is_sidecar_for(package, f)) {
        let record = match load_record(&dir.join(sidecar)) {
            Ok(record) => record,
            Err(e) => {
                let detail = match e {
                    RegistryError::CorruptRecord { detail, .. } => detail,
                    other => other.to_string(),
                };
                issues.push(AuditIssue::CorruptMetadata {
                    sidecar: sidecar.clone(),
                    detail,
                });
                continue;
            }
        };

        if !artifact_present(&dir, &record.filename) {
            issues.push(AuditIssue::OrphanedMetadata {
                sidecar: sidecar.clone(),
                filename: record.filename,
            });
            continue;
        }

        match artifact_issue(registry, &dir, &record) {
            Some(issue @ AuditIssue::UnreadableArtifact { .. }) => issues.push(issue),
            Some(issue) => {
                issues.push(issue);
                releases += 1;
            }
            None => releases += 1,
        }
        tracked.insert(record.filename);
    }

    for file in &files {
        if is_staging_name(file) {
            issues.push(AuditIssue::StaleStagingFile {
                filename: file.clone(),
            });
        } else if !is_sidecar_for(package, file) && !tracked.contains(file) {
            issues.push(AuditIssue::UntrackedArtifact {
                filename: file.clone(),
            });
        }
    }

    Ok(PackageAudit {
        package: package.to_string(),
        releases,
        issues,
    })
}

/// Hash the artifact a record names and compare it with the recorded checksum.
fn artifact_issue(registry: &Registry, dir: &Path, record: &ReleaseRecord) -> Option<AuditIssue> {
    match registry.store().compute_digest(&dir.join(&record.filename)) {
        Ok(actual) if actual.matches(&record.checksum) => None,
        Ok(actual) => Some(AuditIssue::DigestMismatch {
            filename: record.filename.clone(),
            expected: record.checksum.clone(),
            actual: actual.0,
        }),
        Err(e) => Some(AuditIssue::UnreadableArtifact {
            filename: record.filename.clone(),
            detail: e.to_string(),
        }),
    }
}

/// Format an audit report as a human-readable string.
pub fn format_report(report: &AuditReport) -> String {
    let mut out = String::new();

    for entry in &report.entries {
        out.push_str(&format!(
            "  {}: {} release(s)\n",
            entry.package, entry.releases
        ));
        for issue in &entry.issues {
            out.push_str(&format!("    ! {issue}\n"));
        }
    }

    out.push('\n');
    out.push_str(&format!(
        "Summary: {} packages, {} releases, {} issues\n",
        report.summary.packages, report.summary.releases, report.summary.issues
    ));

    if report.summary.passed {
        out.push_str("Audit: PASSED\n");
    } else {
        out.push_str("Audit: ISSUES FOUND\n");
    }

    out
}
