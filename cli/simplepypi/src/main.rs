//! simplepypi CLI — private Python package index server and maintenance commands.

mod commands;
mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};
use simplepypi_registry::Registry;
use tracing_subscriber::EnvFilter;

use config::{Settings, SETTINGS_ENV};

#[derive(Parser)]
#[command(name = "simplepypi", version, about = "A minimal private Python package index")]
struct Cli {
    /// Settings file (TOML)
    #[arg(long, global = true, env = SETTINGS_ENV)]
    config: Option<PathBuf>,
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreArgs {
    /// Artifact root directory (overrides the settings file)
    #[arg(long)]
    directory: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP package index
    Serve {
        /// Listen address (e.g., 127.0.0.1:8080)
        #[arg(long)]
        bind: Option<SocketAddr>,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List package names
    Packages {
        #[command(flatten)]
        store: StoreArgs,
    },
    /// List the releases of a package
    Releases {
        /// Package name
        package: String,
        #[command(flatten)]
        store: StoreArgs,
    },
    /// Check stored artifacts against their release records
    Audit {
        #[command(flatten)]
        store: StoreArgs,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { bind, store } => {
            let config = settings.registry_config(store.directory.as_deref())?;
            commands::serve::run(config, settings.server(bind))
        }

        Commands::Packages { store } => {
            let registry = Registry::new(settings.read_only_config(store.directory.as_deref()));
            commands::packages::run(&registry, &mut std::io::stdout().lock())
        }

        Commands::Releases { package, store } => {
            let registry = Registry::new(settings.read_only_config(store.directory.as_deref()));
            commands::releases::run(&registry, &package, &mut std::io::stdout().lock())
        }

        Commands::Audit { store } => {
            let registry = Registry::new(settings.read_only_config(store.directory.as_deref()));
            commands::audit::run(&registry, &mut std::io::stdout().lock())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "simplepypi",
            "--verbose",
            "serve",
            "--bind",
            "0.0.0.0:9000",
            "--directory",
            "/srv/pypi",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Serve { bind, store } => {
                assert_eq!(bind.map(|b| b.port()), Some(9000));
                assert_eq!(store.directory, Some(PathBuf::from("/srv/pypi")));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn releases_requires_package() {
        assert!(Cli::try_parse_from(["simplepypi", "releases"]).is_err());
    }
}
