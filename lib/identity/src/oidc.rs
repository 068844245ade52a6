//! OIDC (OpenID Connect) provider configuration.
//!
//! The gateway talks to a single provider whose endpoints are configured
//! explicitly rather than discovered.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration for the OIDC identity provider.
///
/// Fields with defaults can be omitted when loading from environment variables.
#[derive(Clone, Serialize, Deserialize)]
pub struct OidcConfig {
    /// The OAuth2 client ID registered with the provider.
    client_id: String,
    /// The OAuth2 client secret.
    client_secret: String,
    /// The expected `iss` claim of ID tokens (e.g., "https://accounts.google.com").
    issuer_url: String,
    /// The provider's authorization endpoint.
    authorization_url: String,
    /// The provider's token endpoint.
    token_url: String,
    /// The provider's published JSON Web Key Set.
    keys_url: String,
    /// OAuth2 scopes to request as a comma-separated string.
    /// Default: "openid,email,profile"
    #[serde(default = "default_scopes")]
    scopes: String,
    /// Timeout applied to each outbound call to the provider.
    /// Default: 5
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

fn default_scopes() -> String {
    "openid,email,profile".to_string()
}

fn default_timeout_seconds() -> u64 {
    5
}

impl fmt::Debug for OidcConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OidcConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("issuer_url", &self.issuer_url)
            .field("authorization_url", &self.authorization_url)
            .field("token_url", &self.token_url)
            .field("keys_url", &self.keys_url)
            .field("scopes", &self.scopes)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl OidcConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(client_id: String, client_secret: String) -> OidcConfigBuilder {
        OidcConfigBuilder::new(client_id, client_secret)
    }

    /// Returns the OAuth2 client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the OAuth2 client secret.
    #[must_use]
    pub fn client_secret(&self) -> &str {
        &self.client_secret
    }

    /// Returns the expected issuer.
    #[must_use]
    pub fn issuer_url(&self) -> &str {
        &self.issuer_url
    }

    /// Returns the authorization endpoint.
    #[must_use]
    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    /// Returns the token endpoint.
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// Returns the JWKS endpoint.
    #[must_use]
    pub fn keys_url(&self) -> &str {
        &self.keys_url
    }

    /// Returns the OAuth2 scopes to request, parsed from comma-separated string.
    #[must_use]
    pub fn scopes(&self) -> Vec<&str> {
        self.scopes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Returns the outbound call timeout in seconds.
    #[must_use]
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }
}

/// Builder for `OidcConfig`.
#[derive(Debug)]
pub struct OidcConfigBuilder {
    client_id: String,
    client_secret: String,
    issuer_url: String,
    authorization_url: String,
    token_url: String,
    keys_url: String,
    timeout_seconds: u64,
}

impl OidcConfigBuilder {
    /// Creates a new builder with the client credentials.
    #[must_use]
    pub fn new(client_id: String, client_secret: String) -> Self {
        Self {
            client_id,
            client_secret,
            issuer_url: String::new(),
            authorization_url: String::new(),
            token_url: String::new(),
            keys_url: String::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }

    /// Sets the expected issuer.
    #[must_use]
    pub fn issuer_url(mut self, url: String) -> Self {
        self.issuer_url = url;
        self
    }

    /// Sets the authorization endpoint.
    #[must_use]
    pub fn authorization_url(mut self, url: String) -> Self {
        self.authorization_url = url;
        self
    }

    /// Sets the token endpoint.
    #[must_use]
    pub fn token_url(mut self, url: String) -> Self {
        self.token_url = url;
        self
    }

    /// Sets the JWKS endpoint.
    #[must_use]
    pub fn keys_url(mut self, url: String) -> Self {
        self.keys_url = url;
        self
    }

    /// Sets the outbound call timeout.
    #[must_use]
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Builds the `OidcConfig`.
    #[must_use]
    pub fn build(self) -> OidcConfig {
        OidcConfig {
            client_id: self.client_id,
            client_secret: self.client_secret,
            issuer_url: self.issuer_url,
            authorization_url: self.authorization_url,
            token_url: self.token_url,
            keys_url: self.keys_url,
            scopes: default_scopes(),
            timeout_seconds: self.timeout_seconds,
        }
    }
}
