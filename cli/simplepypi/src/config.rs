//! `simplepypi.toml` settings: loading and command-line overrides.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use simplepypi_registry::{Credentials, RegistryConfig};
use simplepypi_web::ServerConfig;

/// Environment variable naming the settings file.
pub const SETTINGS_ENV: &str = "SIMPLEPYPI_SETTINGS";

/// Artifact root used when neither the file nor the flags name one.
pub const DEFAULT_DIRECTORY: &str = "./packages";

/// The whole settings file. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub registry: RegistrySection,
    pub server: ServerConfig,
}

/// `[registry]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistrySection {
    /// Artifact root directory.
    pub directory: Option<PathBuf>,
    /// Uploader user name.
    pub username: Option<String>,
    /// Uploader password.
    pub password: Option<String>,
}

impl Settings {
    /// Load settings from `path`, or return defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Settings::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parse settings from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Artifact root: the flag wins over the file.
    pub fn directory(&self, flag: Option<&Path>) -> PathBuf {
        flag.map(Path::to_path_buf)
            .or_else(|| self.registry.directory.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DIRECTORY))
    }

    /// Registry configuration for the server. Both credentials are required.
    pub fn registry_config(&self, directory: Option<&Path>) -> Result<RegistryConfig> {
        let (Some(username), Some(password)) =
            (&self.registry.username, &self.registry.password)
        else {
            bail!(
                "no uploader credentials configured: set [registry] username and password \
                 in the settings file (--config or {SETTINGS_ENV})"
            );
        };
        if username.is_empty() || password.is_empty() {
            bail!("uploader username and password must not be empty");
        }
        Ok(RegistryConfig::new(
            self.directory(directory),
            Credentials::new(username.as_str(), password.as_str()),
        ))
    }

    /// Registry configuration for commands that never publish. Credentials are
    /// taken from the file when present and are not otherwise needed.
    pub fn read_only_config(&self, directory: Option<&Path>) -> RegistryConfig {
        RegistryConfig::new(
            self.directory(directory),
            Credentials::new(
                self.registry.username.clone().unwrap_or_default(),
                self.registry.password.clone().unwrap_or_default(),
            ),
        )
    }

    /// Server settings with the `--bind` override applied.
    pub fn server(&self, bind: Option<std::net::SocketAddr>) -> ServerConfig {
        let mut server = self.server.clone();
        if let Some(bind) = bind {
            server.bind = bind;
        }
        server
    }
}
