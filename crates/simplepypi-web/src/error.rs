//! # HTTP Error Mapping
//!
//! Maps registry failures onto status codes. Bodies are short plain text so
//! command-line upload tools can show them verbatim. Storage details never
//! reach the client.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use simplepypi_registry::RegistryError;
use thiserror::Error;

/// Request-level error type that implements [`IntoResponse`].
#[derive(Error, Debug)]
pub enum WebError {
    /// A failure reported by the registry engine.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Malformed or incomplete upload form (400).
    #[error("{0}")]
    BadRequest(String),

    /// No usable `Authorization` header (401).
    #[error("no authentication information found")]
    MissingCredentials,

    /// Failure outside the registry, e.g. a worker task that panicked (500).
    #[error("internal error: {0}")]
    Internal(String),
}

impl WebError {
    /// Conversion for read routes, where a bad name is just a missing page.
    pub fn lookup(err: RegistryError) -> Self {
        match err {
            RegistryError::InvalidName { name } => {
                WebError::Registry(RegistryError::NotFound { what: name })
            }
            other => WebError::Registry(other),
        }
    }

    /// The HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Registry(err) => match err {
                RegistryError::InvalidName { .. }
                | RegistryError::UnsupportedFormat { .. }
                | RegistryError::ChecksumMismatch { .. } => StatusCode::BAD_REQUEST,
                RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RegistryError::Unauthorized => StatusCode::UNAUTHORIZED,
                RegistryError::VersionExists { .. } => StatusCode::CONFLICT,
                RegistryError::CorruptRecord { .. } | RegistryError::Storage { .. } => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::MissingCredentials => StatusCode::UNAUTHORIZED,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = format!("ERROR: {message}\n");
        if status == StatusCode::UNAUTHORIZED {
            (
                status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"simplepypi\"")],
                body,
            )
                .into_response()
        } else {
            (status, body).into_response()
        }
    }
}
