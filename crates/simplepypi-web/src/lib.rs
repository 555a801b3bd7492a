//! HTTP request layer for the simplepypi package index.
//!
//! Translates HTTP requests into [`Registry`] calls and renders the results
//! as the pages of a simple package index.
//!
//! ## Routes
//!
//! | Method | Path                         | Handler                     |
//! |--------|------------------------------|-----------------------------|
//! | GET    | `/`                          | package index page          |
//! | POST   | `/`                          | upload (`:action=file_upload`) |
//! | GET    | `/simple/`                   | simple index root           |
//! | GET    | `/simple/{package}/`         | simple index for a package  |
//! | GET    | `/pypi/{package}/`           | package detail page         |
//! | GET    | `/package/{package}/{file}`  | artifact download           |
//!
//! Registry calls touch the filesystem synchronously and run on the blocking
//! thread pool.

pub mod error;
pub mod html;
pub mod routes;
pub mod upload;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use simplepypi_registry::Registry;
use tower_http::trace::TraceLayer;

pub use error::WebError;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        AppState {
            registry: Arc::new(registry),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: SocketAddr,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_upload_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Assemble the router with all routes and middleware.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(routes::index).post(routes::upload))
        .route("/simple/", get(routes::simple_index))
        .route("/simple/:package/", get(routes::simple_package))
        .route("/pypi/:package/", get(routes::package_page))
        .route("/package/:package/:file", get(routes::download))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C.
pub async fn serve(registry: Registry, config: ServerConfig) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        root = %registry.config().root.display(),
        "simplepypi listening"
    );
    let router = app(AppState::new(registry), &config);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
