//! OIDC client implementation using the openidconnect crate.
//!
//! The client holds only configuration and a pooled HTTP client, so one
//! instance is shared by every request. Each login gets a fresh
//! [`AuthState`]; nothing about a login is stored in the client.
//!
//! A callback performs exactly two outbound calls: the code exchange at the
//! token endpoint and one fetch of the provider's key set. Both are bounded
//! by the configured timeout and never retried.

use std::time::Duration;

use base64::Engine;
use openidconnect::core::{
    CoreAuthenticationFlow, CoreClient, CoreIdToken, CoreJsonWebKey, CoreJsonWebKeySet,
};
use openidconnect::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, IssuerUrl, JsonWebKey,
    JsonWebKeySetUrl, Nonce, PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use oauth_shield_identity::{CallbackError, IdentityClaims, OidcConfig};
use serde::{Deserialize, Serialize};

use crate::error::StartupError;

/// OIDC client for authenticating users.
pub struct OidcClient {
    config: OidcConfig,
    client_id: ClientId,
    client_secret: ClientSecret,
    issuer_url: IssuerUrl,
    auth_url: AuthUrl,
    token_url: TokenUrl,
    keys_url: JsonWebKeySetUrl,
    redirect_url: RedirectUrl,
    http_client: reqwest::Client,
}

/// Data needed to complete the OIDC callback.
///
/// Issued by [`OidcClient::authorization_url`] and kept by the browser in
/// an encrypted cookie until the callback consumes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub csrf_token: String,
    pub pkce_verifier: String,
    pub nonce: String,
}

impl OidcClient {
    /// Creates a client for the configured provider.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: OidcConfig, redirect_uri: String) -> Result<Self, StartupError> {
        let issuer_url = IssuerUrl::new(config.issuer_url().to_string()).map_err(|e| {
            StartupError::InvalidUrl {
                field: "OIDC__ISSUER_URL",
                reason: e.to_string(),
            }
        })?;

        let auth_url = AuthUrl::new(config.authorization_url().to_string()).map_err(|e| {
            StartupError::InvalidUrl {
                field: "OIDC__AUTHORIZATION_URL",
                reason: e.to_string(),
            }
        })?;

        let token_url = TokenUrl::new(config.token_url().to_string()).map_err(|e| {
            StartupError::InvalidUrl {
                field: "OIDC__TOKEN_URL",
                reason: e.to_string(),
            }
        })?;

        let keys_url = JsonWebKeySetUrl::new(config.keys_url().to_string()).map_err(|e| {
            StartupError::InvalidUrl {
                field: "OIDC__KEYS_URL",
                reason: e.to_string(),
            }
        })?;

        let redirect_url = RedirectUrl::new(redirect_uri).map_err(|e| StartupError::InvalidUrl {
            field: "redirect URL",
            reason: e.to_string(),
        })?;

        // Following redirects from the token endpoint would leak the code.
        let http_client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()
            .map_err(|e| StartupError::HttpClient {
                details: e.to_string(),
            })?;

        let client_id = ClientId::new(config.client_id().to_string());
        let client_secret = ClientSecret::new(config.client_secret().to_string());

        Ok(Self {
            config,
            client_id,
            client_secret,
            issuer_url,
            auth_url,
            token_url,
            keys_url,
            redirect_url,
            http_client,
        })
    }

    /// Generates the authorization URL for redirecting the user.
    pub fn authorization_url(&self) -> (String, AuthState) {
        let client = CoreClient::new(
            self.client_id.clone(),
            self.issuer_url.clone(),
            CoreJsonWebKeySet::new(Vec::new()),
        )
        .set_client_secret(self.client_secret.clone())
        .set_auth_uri(self.auth_url.clone())
        .set_redirect_uri(self.redirect_url.clone());

        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut auth_request = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                CsrfToken::new_random,
                Nonce::new_random,
            )
            .set_pkce_challenge(pkce_challenge);

        // The openid scope is always added by the request itself.
        for scope in self.config.scopes() {
            if scope != "openid" {
                auth_request = auth_request.add_scope(Scope::new(scope.to_string()));
            }
        }

        let (auth_url, csrf_token, nonce) = auth_request.url();

        let state = AuthState {
            csrf_token: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
            nonce: nonce.secret().clone(),
        };

        (auth_url.to_string(), state)
    }

    /// Exchanges the authorization code and verifies the returned ID token.
    ///
    /// # Errors
    ///
    /// Returns the [`CallbackError`] of the first step that fails: the code
    /// exchange, the presence of an ID token, the signing-key lookup, or
    /// verification of the token itself.
    pub async fn exchange_code(
        &self,
        code: &str,
        state: &AuthState,
    ) -> Result<IdentityClaims, CallbackError> {
        let client = CoreClient::new(
            self.client_id.clone(),
            self.issuer_url.clone(),
            CoreJsonWebKeySet::new(Vec::new()),
        )
        .set_client_secret(self.client_secret.clone())
        .set_redirect_uri(self.redirect_url.clone())
        .set_token_uri(self.token_url.clone());

        let token_request = client.exchange_code(AuthorizationCode::new(code.to_string()));

        let token_response = token_request
            .set_pkce_verifier(PkceCodeVerifier::new(state.pkce_verifier.clone()))
            .request_async(&self.http_client)
            .await
            .map_err(|e| CallbackError::TokenExchange {
                details: format!("token exchange failed: {e}"),
            })?;

        let id_token = token_response
            .id_token()
            .ok_or(CallbackError::MissingIdToken)?;

        let key_id = key_id_of(id_token)?;
        let key_set = self.fetch_signing_keys(key_id.as_deref()).await?;
        let key = select_key(&key_set, key_id.as_deref())
            .cloned()
            .ok_or_else(|| CallbackError::UnknownSigningKey {
                key_id: key_id.clone(),
            })?;

        self.verify_id_token(id_token, key, state)
    }

    async fn fetch_signing_keys(
        &self,
        key_id: Option<&str>,
    ) -> Result<CoreJsonWebKeySet, CallbackError> {
        CoreJsonWebKeySet::fetch_async(&self.keys_url, &self.http_client)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to fetch provider signing keys");
                CallbackError::UnknownSigningKey {
                    key_id: key_id.map(str::to_string),
                }
            })
    }

    fn verify_id_token(
        &self,
        id_token: &CoreIdToken,
        key: CoreJsonWebKey,
        state: &AuthState,
    ) -> Result<IdentityClaims, CallbackError> {
        let client = CoreClient::new(
            self.client_id.clone(),
            self.issuer_url.clone(),
            CoreJsonWebKeySet::new(vec![key]),
        )
        .set_client_secret(self.client_secret.clone());

        let nonce = Nonce::new(state.nonce.clone());
        let claims = id_token
            .claims(&client.id_token_verifier(), &nonce)
            .map_err(|e| CallbackError::TokenVerification {
                reason: e.to_string(),
            })?;

        let name: Option<String> = claims
            .name()
            .and_then(|n| n.get(None))
            .map(|n| n.as_str().to_string())
            .or_else(|| claims.preferred_username().map(|u| u.as_str().to_string()));

        Ok(IdentityClaims::new(
            claims.subject().as_str().to_string(),
            claims.issuer().as_str().to_string(),
            claims
                .audiences()
                .iter()
                .map(|aud| aud.as_str().to_string())
                .collect(),
            claims.expiration(),
            claims.issue_time(),
        )
        .with_email(claims.email().map(|e| e.as_str().to_string()))
        .with_name(name))
    }
}

/// Picks the key the token was signed with.
///
/// A token without a `kid` is only accepted when the provider publishes a
/// single key.
fn select_key<'a>(
    key_set: &'a CoreJsonWebKeySet,
    key_id: Option<&str>,
) -> Option<&'a CoreJsonWebKey> {
    match key_id {
        Some(kid) => key_set
            .keys()
            .iter()
            .find(|key| key.key_id().is_some_and(|id| id.as_str() == kid)),
        None => match key_set.keys().as_slice() {
            [only] => Some(only),
            _ => None,
        },
    }
}

fn key_id_of(id_token: &CoreIdToken) -> Result<Option<String>, CallbackError> {
    let compact = serde_json::to_value(id_token)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .ok_or_else(|| CallbackError::TokenVerification {
            reason: "malformed ID token: not a compact JWT".to_string(),
        })?;
    header_key_id(&compact)
}

/// Reads the `kid` from a compact JWT header without verifying anything.
fn header_key_id(token: &str) -> Result<Option<String>, CallbackError> {
    let malformed = |reason: &str| CallbackError::TokenVerification {
        reason: format!("malformed ID token: {reason}"),
    };

    // JWT is base64url(header).base64url(payload).signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(malformed("expected three segments"));
    }

    let header_bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|_| malformed("header is not base64url"))?;

    let header: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| malformed("header is not JSON"))?;

    Ok(header
        .get("kid")
        .and_then(|kid| kid.as_str())
        .map(str::to_string))
}
