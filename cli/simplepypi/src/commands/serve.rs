//! `simplepypi serve` — run the HTTP index.

use anyhow::{Context, Result};
use simplepypi_registry::{Registry, RegistryConfig};
use simplepypi_web::ServerConfig;

/// Create the artifact root if needed and serve until Ctrl-C.
pub fn run(config: RegistryConfig, server: ServerConfig) -> Result<()> {
    std::fs::create_dir_all(&config.root)
        .with_context(|| format!("creating {}", config.root.display()))?;

    tracing::debug!(
        root = %config.root.display(),
        max_upload_bytes = server.max_upload_bytes,
        "starting server"
    );
    let registry = Registry::new(config);
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    runtime
        .block_on(simplepypi_web::serve(registry, server))
        .context("HTTP server failed")
}
