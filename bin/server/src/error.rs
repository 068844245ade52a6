//! Error types for the gateway server.
//!
//! Startup errors are fatal and reported by `main`. Request-time errors
//! implement [`IntoResponse`] and never leak details to the browser; the
//! details go to the log instead.

use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use oauth_shield_identity::CallbackError;

/// Errors that prevent the gateway from starting.
#[derive(Debug)]
pub enum StartupError {
    /// The cookie secret is too short to derive a key from.
    InvalidSecretKey { length: usize },
    /// A configured URL could not be parsed.
    InvalidUrl { field: &'static str, reason: String },
    /// A gateway path does not start with `/`.
    InvalidPath { path: String },
    /// A configured CORS origin is not a valid header value.
    InvalidCorsOrigin { origin: String },
    /// The HTTP client for provider calls could not be built.
    HttpClient { details: String },
    /// A page template could not be registered.
    Template(TemplateError),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSecretKey { length } => write!(
                f,
                "SECRET_KEY must be at least 64 bytes, got {length}"
            ),
            Self::InvalidUrl { field, reason } => {
                write!(f, "invalid URL for {field}: {reason}")
            }
            Self::InvalidPath { path } => {
                write!(f, "gateway path '{path}' must start with '/'")
            }
            Self::InvalidCorsOrigin { origin } => {
                write!(f, "invalid CORS origin '{origin}'")
            }
            Self::HttpClient { details } => {
                write!(f, "failed to create HTTP client: {details}")
            }
            Self::Template(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for StartupError {}

impl From<TemplateError> for StartupError {
    fn from(err: TemplateError) -> Self {
        Self::Template(err)
    }
}

/// Template registration and rendering errors.
#[derive(Debug)]
pub enum TemplateError {
    /// A template file or built-in template failed to compile.
    Register { name: String, details: String },
    /// Rendering a registered template failed.
    Render { name: String, details: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { name, details } => {
                write!(f, "failed to register template '{name}': {details}")
            }
            Self::Render { name, details } => {
                write!(f, "failed to render template '{name}': {details}")
            }
        }
    }
}

impl std::error::Error for TemplateError {}

impl IntoResponse for TemplateError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Page rendering failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
    }
}

/// Response wrapper for a failed OIDC callback.
#[derive(Debug)]
pub struct CallbackFailure(pub CallbackError);

impl IntoResponse for CallbackFailure {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CallbackError::MissingCode | CallbackError::CsrfMismatch => {
                tracing::warn!(kind = self.0.kind(), error = %self.0, "Rejected OIDC callback");
                StatusCode::BAD_REQUEST
            }
            CallbackError::TokenExchange { .. }
            | CallbackError::MissingIdToken
            | CallbackError::UnknownSigningKey { .. }
            | CallbackError::TokenVerification { .. } => {
                tracing::error!(kind = self.0.kind(), error = %self.0, "OIDC login failed");
                StatusCode::UNAUTHORIZED
            }
        };

        (status, "Authentication failed").into_response()
    }
}
