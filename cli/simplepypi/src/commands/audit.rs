//! `simplepypi audit` — check the store for inconsistencies.

use std::io::Write;

use anyhow::{bail, Result};
use simplepypi_registry::{audit, format_report, Registry};

/// Print the audit report. Fails when any issue is found.
pub fn run(registry: &Registry, out: &mut impl Write) -> Result<()> {
    writeln!(out, "Auditing {}", registry.config().root.display())?;
    let report = audit(registry)?;
    write!(out, "{}", format_report(&report))?;

    if !report.summary.passed {
        bail!("audit found {} issue(s)", report.summary.issues);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplepypi_registry::{ContentHash, Credentials, RegistryConfig, ReleaseRecord};

    fn registry() -> (tempfile::TempDir, Registry) {
        let dir = tempfile::tempdir().unwrap();
        let creds = Credentials::new("u", "p");
        let registry = Registry::new(RegistryConfig::new(dir.path(), creds.clone()));
        let record = ReleaseRecord::new(
            "demo",
            "1.0",
            "demo-1.0.tar.gz",
            ContentHash::compute(b"tgz").0,
        );
        registry
            .publish_release(record, &b"tgz"[..], Some(&creds))
            .unwrap();
        (dir, registry)
    }

    #[test]
    fn clean_store_passes() {
        let (_dir, registry) = registry();
        let mut out = Vec::new();
        run(&registry, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Audit: PASSED"));
    }

    #[test]
    fn issues_fail_the_command() {
        let (dir, registry) = registry();
        std::fs::write(dir.path().join("demo").join("demo-9.9.zip"), b"stray").unwrap();

        let mut out = Vec::new();
        let err = run(&registry, &mut out).unwrap_err();
        assert!(err.to_string().contains("1 issue"));
        assert!(String::from_utf8(out).unwrap().contains("demo-9.9.zip: no release record"));
    }
}
