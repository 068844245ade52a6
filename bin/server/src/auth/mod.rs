//! Authentication module for the gateway.
//!
//! This module provides:
//! - OIDC login against an external identity provider
//! - Encrypted cookie sessions holding the verified identity
//! - The middleware that gates every non-gateway path
//!
//! # Session Model
//!
//! There is no server-side session store. The verified [`IdentityClaims`]
//! are serialized into a private (encrypted and authenticated) cookie, so
//! any instance holding the same `SECRET_KEY` can serve any request.
//! Logging out clears the cookie; there is no revocation list.
//!
//! [`IdentityClaims`]: oauth_shield_identity::IdentityClaims

pub mod middleware;
pub mod oidc;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::Key;
use oauth_shield_identity::DomainPolicy;

use crate::config::ServerConfig;
use crate::error::StartupError;
use crate::templates::Templates;

pub use middleware::require_identity;
pub use oidc::{AuthState, OidcClient};
pub use routes::{callback, invalid_domain, login, logout};
pub use session::CookieSettings;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// OIDC client for authentication.
    pub oidc_client: Arc<OidcClient>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Login and error pages.
    pub templates: Arc<Templates>,
    /// Email-domain allow-list.
    pub policy: Arc<DomainPolicy>,
    /// Cookie names and attributes.
    pub cookies: CookieSettings,
    cors: CorsOrigins,
    cookie_key: Key,
}

/// Which other sites may call the gateway from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// No CORS headers are sent.
    Disabled,
    /// `*`: any origin may read responses, but never with credentials.
    Any,
    /// Listed origins only, with credentials.
    Listed(Vec<HeaderValue>),
}

impl CorsOrigins {
    /// Parses the configured origins. A `*` anywhere in the list opens the
    /// gateway to every origin.
    ///
    /// # Errors
    ///
    /// Returns an error for an origin that is not a valid header value.
    pub fn from_config(origins: Vec<String>) -> Result<Self, StartupError> {
        if origins.is_empty() {
            return Ok(Self::Disabled);
        }
        if origins.iter().any(|origin| origin == "*") {
            return Ok(Self::Any);
        }

        origins
            .into_iter()
            .map(|origin| {
                HeaderValue::from_str(&origin)
                    .map_err(|_| StartupError::InvalidCorsOrigin { origin })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Listed)
    }
}

impl AppState {
    /// Builds the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the configuration is unusable: a
    /// short secret, a malformed provider URL, a gateway path without a
    /// leading `/`, an invalid CORS origin, or a broken template override.
    pub fn new(config: ServerConfig) -> Result<Self, StartupError> {
        let cookie_key = config.cookie_key()?;

        let paths = &config.paths;
        for path in [
            &paths.login,
            &paths.callback,
            &paths.logout,
            &paths.invalid_domain,
            &paths.home,
        ] {
            if !path.starts_with('/') {
                return Err(StartupError::InvalidPath { path: path.clone() });
            }
        }

        let cors = CorsOrigins::from_config(config.cors_origins())?;

        let templates = Templates::load(&config.templates_dir)?;
        let oidc_client = OidcClient::new(config.oidc.clone(), config.redirect_url())?;
        let policy = config.domain_policy();
        let cookies = CookieSettings::from_config(&config);

        Ok(Self {
            oidc_client: Arc::new(oidc_client),
            config: Arc::new(config),
            templates: Arc::new(templates),
            policy: Arc::new(policy),
            cookies,
            cors,
            cookie_key,
        })
    }

    /// Origins allowed to make cross-origin requests.
    pub fn cors(&self) -> &CorsOrigins {
        &self.cors
    }

    /// Key used to encrypt the session and auth state cookies.
    pub fn cookie_key(&self) -> Key {
        self.cookie_key.clone()
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key()
    }
}

/// Plain 302 redirect.
pub(crate) fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(location) => (StatusCode::FOUND, [(header::LOCATION, location)]).into_response(),
        Err(_) => {
            tracing::error!(location, "Refusing to redirect to invalid location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
