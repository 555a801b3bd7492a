//! `simplepypi packages` — list package names.

use std::io::Write;

use anyhow::Result;
use simplepypi_registry::Registry;

/// Print every package name, sorted, one per line.
pub fn run(registry: &Registry, out: &mut impl Write) -> Result<()> {
    let mut packages = registry.list_packages()?;
    packages.sort();
    for package in &packages {
        writeln!(out, "{package}")?;
    }
    Ok(())
}
