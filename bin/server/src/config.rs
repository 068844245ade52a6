//! Centralized server configuration.
//!
//! This module provides strongly-typed configuration for the gateway,
//! loaded once at startup via the `config` crate from environment variables.
//! Nested keys use `__` as separator (`OIDC__CLIENT_ID`, `PATHS__LOGIN`).
//!
//! Derived values such as [`ServerConfig::redirect_url`] are computed from
//! the loaded fields on demand and never cached.
//!
//! See [`OidcConfig`](oauth_shield_identity::OidcConfig) for provider
//! configuration.

use std::path::PathBuf;

use axum_extra::extract::cookie::Key;
use oauth_shield_identity::{DomainPolicy, OidcConfig};
use serde::Deserialize;

use crate::error::StartupError;

/// Deployment environment. Anything but `local` is served over HTTPS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Server configuration composed from library configs.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
    /// Display name shown on the login and error pages.
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Public host (and optional port) the gateway is reached at.
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,

    /// Socket address to listen on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Allowed CORS origins as a comma-separated string.
    #[serde(default = "default_cors_origins")]
    cors_origins: String,

    /// Directory searched for `login.html` and `invalid_domain.html` overrides.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: PathBuf,

    /// Root of the static content served to authenticated users.
    #[serde(default = "default_static_path")]
    pub static_path: PathBuf,

    /// Secret used to sign and encrypt cookies.
    secret_key: String,

    /// Allowed email domains as a comma-separated string. Empty allows all.
    #[serde(default)]
    authorized_domains: String,

    /// Session cookie configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Gateway endpoint paths.
    #[serde(default)]
    pub paths: GatewayPaths,

    /// OIDC provider configuration.
    pub oidc: OidcConfig,
}

fn default_service_name() -> String {
    "OAuth Shield".to_string()
}

fn default_domain() -> String {
    "localhost:8000".to_string()
}

fn default_bind_address() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_cors_origins() -> String {
    "http://localhost:8000".to_string()
}

fn default_templates_dir() -> PathBuf {
    PathBuf::from("templates")
}

fn default_static_path() -> PathBuf {
    PathBuf::from("site")
}

/// Session-related configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Session cookie lifetime in minutes.
    #[serde(default = "default_session_duration_minutes")]
    pub duration_minutes: i64,

    /// Name of the session cookie.
    #[serde(default = "default_session_cookie_name")]
    pub cookie_name: String,

    /// Lifetime of the login state cookie in minutes.
    #[serde(default = "default_auth_state_minutes")]
    pub auth_state_minutes: i64,
}

fn default_session_duration_minutes() -> i64 {
    14 * 24 * 60
}

fn default_session_cookie_name() -> String {
    "session".to_string()
}

fn default_auth_state_minutes() -> i64 {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            duration_minutes: default_session_duration_minutes(),
            cookie_name: default_session_cookie_name(),
            auth_state_minutes: default_auth_state_minutes(),
        }
    }
}

/// Paths served by the gateway itself.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPaths {
    #[serde(default = "default_login_path")]
    pub login: String,
    #[serde(default = "default_callback_path")]
    pub callback: String,
    #[serde(default = "default_logout_path")]
    pub logout: String,
    #[serde(default = "default_invalid_domain_path")]
    pub invalid_domain: String,
    /// Where users land after logging in or out.
    #[serde(default = "default_home_path")]
    pub home: String,
}

fn default_login_path() -> String {
    "/__oauth/login".to_string()
}

fn default_callback_path() -> String {
    "/__oauth/callback".to_string()
}

fn default_logout_path() -> String {
    "/__oauth/logout".to_string()
}

fn default_invalid_domain_path() -> String {
    "/__oauth/invalid_domain".to_string()
}

fn default_home_path() -> String {
    "/".to_string()
}

impl Default for GatewayPaths {
    fn default() -> Self {
        Self {
            login: default_login_path(),
            callback: default_callback_path(),
            logout: default_logout_path(),
            invalid_domain: default_invalid_domain_path(),
            home: default_home_path(),
        }
    }
}

impl GatewayPaths {
    /// Returns true for paths the gate must always let through.
    ///
    /// Without these the login flow itself would be gated.
    #[must_use]
    pub fn is_bypassed(&self, path: &str) -> bool {
        [
            &self.login,
            &self.callback,
            &self.logout,
            &self.invalid_domain,
        ]
        .iter()
        .any(|bypass| bypass.as_str() == path)
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Base URL of the gateway. Non-local environments always use HTTPS.
    #[must_use]
    pub fn server_host(&self) -> String {
        match self.environment {
            Environment::Local => format!("http://{}", self.domain),
            Environment::Staging | Environment::Production => format!("https://{}", self.domain),
        }
    }

    /// Absolute callback URL registered with the provider.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        format!("{}{}", self.server_host(), self.paths.callback)
    }

    /// Whether cookies carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.environment != Environment::Local
    }

    /// Returns the allowed CORS origins, without trailing slashes.
    #[must_use]
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/'))
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Returns the email-domain allow-list.
    #[must_use]
    pub fn domain_policy(&self) -> DomainPolicy {
        DomainPolicy::from_comma_separated(&self.authorized_domains)
    }

    /// Derives the cookie signing and encryption key from the secret.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::InvalidSecretKey`] if the secret is shorter
    /// than 64 bytes.
    pub fn cookie_key(&self) -> Result<Key, StartupError> {
        Key::try_from(self.secret_key.as_bytes()).map_err(|_| StartupError::InvalidSecretKey {
            length: self.secret_key.len(),
        })
    }
}
