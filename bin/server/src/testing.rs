//! Test support: a mock identity provider and a cookie-keeping browser.

use std::collections::BTreeMap;
use std::path::Path;

use axum::body::Body;
use axum::http::{HeaderValue, Request, Response, header};
use chrono::{DateTime, Duration, Utc};
use oauth_shield_identity::OidcConfig;
use openidconnect::core::{
    CoreIdToken, CoreIdTokenClaims, CoreJwsSigningAlgorithm, CoreRsaPrivateSigningKey,
};
use openidconnect::{
    Audience, EmptyAdditionalClaims, EndUserEmail, IssuerUrl, JsonWebKeyId, Nonce,
    PrivateSigningKey, StandardClaims, SubjectIdentifier,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::auth::OidcClient;
use crate::config::ServerConfig;

pub const TEST_CLIENT_ID: &str = "gateway-client";
pub const TEST_CLIENT_SECRET: &str = "gateway-secret";
pub const TEST_ISSUER: &str = "https://issuer.test";
pub const TEST_KEY_ID: &str = "test-key";
pub const TEST_SECRET_KEY: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

const PROVIDER_KEY_PEM: &str = include_str!("testdata/provider_key.pem");

/// Identity provider backed by a wiremock server.
pub struct MockProvider {
    pub server: MockServer,
}

impl MockProvider {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn issuer(&self) -> String {
        TEST_ISSUER.to_string()
    }

    pub fn authorize_url(&self) -> String {
        format!("{}/authorize", self.server.uri())
    }

    pub fn oidc_config(&self) -> OidcConfig {
        OidcConfig::builder(TEST_CLIENT_ID.to_string(), TEST_CLIENT_SECRET.to_string())
            .issuer_url(TEST_ISSUER.to_string())
            .authorization_url(self.authorize_url())
            .token_url(format!("{}/token", self.server.uri()))
            .keys_url(format!("{}/keys", self.server.uri()))
            .timeout_seconds(2)
            .build()
    }

    pub fn client(&self) -> OidcClient {
        OidcClient::new(
            self.oidc_config(),
            "http://gateway.test/__oauth/callback".to_string(),
        )
        .expect("client")
    }

    /// Configuration source pointing at this provider, open for further
    /// overrides.
    pub fn config_builder(
        &self,
        authorized_domains: &str,
        static_path: &Path,
    ) -> config::ConfigBuilder<config::builder::DefaultState> {
        let uri = self.server.uri();
        config::Config::builder()
            .set_override("service_name", "Test Docs")
            .expect("override")
            .set_override("domain", "gateway.test")
            .expect("override")
            .set_override("cors_origins", "https://app.example.com")
            .expect("override")
            .set_override("secret_key", TEST_SECRET_KEY)
            .expect("override")
            .set_override("authorized_domains", authorized_domains)
            .expect("override")
            .set_override("static_path", static_path.display().to_string())
            .expect("override")
            .set_override("templates_dir", "/nonexistent/templates")
            .expect("override")
            .set_override("oidc.client_id", TEST_CLIENT_ID)
            .expect("override")
            .set_override("oidc.client_secret", TEST_CLIENT_SECRET)
            .expect("override")
            .set_override("oidc.issuer_url", TEST_ISSUER)
            .expect("override")
            .set_override("oidc.authorization_url", format!("{uri}/authorize"))
            .expect("override")
            .set_override("oidc.token_url", format!("{uri}/token"))
            .expect("override")
            .set_override("oidc.keys_url", format!("{uri}/keys"))
            .expect("override")
            .set_override("oidc.timeout_seconds", 2)
            .expect("override")
    }

    /// Gateway configuration pointing at this provider.
    pub fn server_config(&self, authorized_domains: &str, static_path: &Path) -> ServerConfig {
        self.config_builder(authorized_domains, static_path)
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize")
    }

    /// ID token signed with the published key.
    pub fn id_token(&self, nonce: &str, email: &str) -> String {
        TestToken::new(nonce).email(email).sign()
    }

    /// Publishes the key set; each callback must fetch it exactly once.
    pub async fn mount_keys(&self) {
        self.mount_key_set(&[Some(TEST_KEY_ID)]).await;
    }

    /// Publishes one copy of the provider key per entry, each under the
    /// given `kid` or none at all.
    pub async fn mount_key_set(&self, key_ids: &[Option<&str>]) {
        let keys: Vec<_> = key_ids
            .iter()
            .map(|key_id| signing_key(*key_id).as_verification_key())
            .collect();
        Mock::given(method("GET"))
            .and(path("/keys"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "keys": keys })),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Answers one code exchange with the given ID token.
    pub async fn mount_token_response(&self, id_token: Option<String>) {
        let mut body = serde_json::json!({
            "access_token": "access",
            "token_type": "Bearer",
            "expires_in": 3600,
        });
        if let Some(id_token) = id_token {
            body["id_token"] = serde_json::Value::String(id_token);
        }

        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

fn signing_key(key_id: Option<&str>) -> CoreRsaPrivateSigningKey {
    CoreRsaPrivateSigningKey::from_pem(
        PROVIDER_KEY_PEM,
        key_id.map(|id| JsonWebKeyId::new(id.to_string())),
    )
    .expect("test key")
}

/// ID token as the provider would issue it, with knobs for the claims a
/// gateway must check.
#[derive(Debug, Clone)]
pub struct TestToken {
    key_id: Option<String>,
    issuer: String,
    audience: String,
    nonce: String,
    email: String,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TestToken {
    pub fn new(nonce: &str) -> Self {
        let now = Utc::now();
        Self {
            key_id: Some(TEST_KEY_ID.to_string()),
            issuer: TEST_ISSUER.to_string(),
            audience: TEST_CLIENT_ID.to_string(),
            nonce: nonce.to_string(),
            email: "user@example.com".to_string(),
            issued_at: now,
            expires_at: now + Duration::minutes(5),
        }
    }

    pub fn email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn key_id(mut self, key_id: Option<&str>) -> Self {
        self.key_id = key_id.map(str::to_string);
        self
    }

    pub fn issuer(mut self, issuer: &str) -> Self {
        self.issuer = issuer.to_string();
        self
    }

    pub fn audience(mut self, audience: &str) -> Self {
        self.audience = audience.to_string();
        self
    }

    /// Issued ten minutes ago, expired five minutes ago.
    pub fn expired(mut self) -> Self {
        let now = Utc::now();
        self.issued_at = now - Duration::minutes(10);
        self.expires_at = now - Duration::minutes(5);
        self
    }

    /// Compact JWT signed with the provider key.
    pub fn sign(&self) -> String {
        let claims = CoreIdTokenClaims::new(
            IssuerUrl::new(self.issuer.clone()).expect("issuer"),
            vec![Audience::new(self.audience.clone())],
            self.expires_at,
            self.issued_at,
            StandardClaims::new(SubjectIdentifier::new("user-1".to_string()))
                .set_email(Some(EndUserEmail::new(self.email.clone()))),
            EmptyAdditionalClaims {},
        )
        .set_nonce(Some(Nonce::new(self.nonce.clone())));

        let token = CoreIdToken::new(
            claims,
            &signing_key(self.key_id.as_deref()),
            CoreJwsSigningAlgorithm::RsaSsaPkcs1V15Sha256,
            None,
            None,
        )
        .expect("signed token");

        serde_json::to_value(&token)
            .expect("serialize token")
            .as_str()
            .expect("compact token")
            .to_string()
    }
}

/// Keeps cookies across requests the way a browser does.
#[derive(Debug, Default)]
pub struct Browser {
    cookies: BTreeMap<String, String>,
}

impl Browser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or drops cookies named in the response's Set-Cookie headers.
    pub fn absorb<B>(&mut self, response: &Response<B>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let Some(pair) = value.to_str().ok().and_then(|v| v.split(';').next()) else {
                continue;
            };
            let Some((name, value)) = pair.split_once('=') else {
                continue;
            };
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
    }

    pub fn has_cookie(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    pub fn get(&self, uri: &str) -> Request<Body> {
        let mut request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");

        if !self.cookies.is_empty() {
            let header_value = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request.headers_mut().insert(
                header::COOKIE,
                HeaderValue::from_str(&header_value).expect("cookie header"),
            );
        }

        request
    }
}

/// Location header of a redirect.
pub fn location<B>(response: &Response<B>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("location header")
        .to_string()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
