//! `simplepypi releases <package>` — list the releases of one package.

use std::io::Write;

use anyhow::{Context, Result};
use simplepypi_registry::Registry;

/// Print `filename  version  checksum  created_at` for each release, oldest first.
pub fn run(registry: &Registry, package: &str, out: &mut impl Write) -> Result<()> {
    let mut releases = registry
        .list_releases(package)
        .with_context(|| format!("listing releases of {package}"))?;
    releases.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.filename.cmp(&b.filename))
    });

    if releases.is_empty() {
        writeln!(out, "No releases of {package}.")?;
        return Ok(());
    }
    for release in &releases {
        writeln!(
            out,
            "{}  {}  {}  {}",
            release.filename,
            release.version,
            release.checksum,
            release.created_at.to_rfc3339()
        )?;
    }
    Ok(())
}
