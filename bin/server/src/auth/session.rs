//! Encrypted cookie storage for the session and the in-flight login state.
//!
//! Both cookies go through a [`PrivateCookieJar`], so their contents are
//! authenticated and unreadable to the browser. A cookie that fails to
//! decrypt is treated as absent.

use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use oauth_shield_identity::SessionData;
use time::Duration;

use super::oidc::AuthState;
use crate::config::ServerConfig;

/// Auth state cookie name (for CSRF protection during OIDC flow).
const AUTH_STATE_COOKIE: &str = "auth_state";

/// Cookie names, lifetimes and attributes.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    session_name: String,
    session_ttl: Duration,
    auth_state_ttl: Duration,
    secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            session_name: config.session.cookie_name.clone(),
            session_ttl: Duration::minutes(config.session.duration_minutes),
            auth_state_ttl: Duration::minutes(config.session.auth_state_minutes),
            secure: config.secure_cookies(),
        }
    }

    /// Reads the session. Missing or undecryptable cookies yield an empty one.
    pub fn session(&self, jar: &PrivateCookieJar) -> SessionData {
        jar.get(&self.session_name)
            .map(|cookie| SessionData::decode(cookie.value()))
            .unwrap_or_default()
    }

    /// Writes the session back, removing the cookie once it is empty.
    pub fn save_session(&self, jar: PrivateCookieJar, session: &SessionData) -> PrivateCookieJar {
        if session.is_empty() {
            return jar.remove(Cookie::build((self.session_name.clone(), "")).path("/"));
        }

        let cookie = Cookie::build((self.session_name.clone(), session.encode()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.session_ttl);

        jar.add(cookie)
    }

    pub fn auth_state(&self, jar: &PrivateCookieJar) -> Option<AuthState> {
        let cookie = jar.get(AUTH_STATE_COOKIE)?;
        match serde_json::from_str(cookie.value()) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding unreadable auth state cookie");
                None
            }
        }
    }

    pub fn save_auth_state(&self, jar: PrivateCookieJar, state: &AuthState) -> PrivateCookieJar {
        // AuthState is plain strings; serializing it cannot fail.
        let Ok(value) = serde_json::to_string(state) else {
            return jar;
        };

        let cookie = Cookie::build((AUTH_STATE_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(self.auth_state_ttl);

        jar.add(cookie)
    }

    pub fn clear_auth_state(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build((AUTH_STATE_COOKIE, "")).path("/"))
    }
}
