//! Gateway routes for login, callback, logout, and the invalid-domain page.

use axum::{
    extract::{Query, State},
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::PrivateCookieJar;
use oauth_shield_identity::{CallbackError, IdentityClaims};
use serde::Deserialize;

use super::{AppState, found, oidc::AuthState};
use crate::error::{CallbackFailure, TemplateError};
use crate::templates::{INVALID_DOMAIN_PAGE, InvalidDomainPage, LOGIN_PAGE, LoginPage};

/// Query parameters for the OIDC callback.
///
/// Providers append extra parameters (`scope`, `authuser`, `prompt`) that
/// are ignored.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Query parameters for the invalid-domain page.
#[derive(Debug, Deserialize)]
pub struct InvalidDomainQuery {
    #[serde(default)]
    domain: String,
}

/// Renders the login page with a fresh authorization link.
pub async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Html<String>), TemplateError> {
    let (auth_url, auth_state) = state.oidc_client.authorization_url();

    let page = state.templates.render(
        LOGIN_PAGE,
        &LoginPage {
            title: &state.config.service_name,
            authorization_url: &auth_url,
        },
    )?;

    Ok((state.cookies.save_auth_state(jar, &auth_state), page))
}

/// Handles the OIDC callback after the user authenticates with the identity provider.
///
/// The auth state cookie is single-use: it is removed whatever the outcome.
pub async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    jar: PrivateCookieJar,
) -> Response {
    let auth_state = state.cookies.auth_state(&jar);
    let jar = state.cookies.clear_auth_state(jar);

    let claims = match complete_login(&state, query, auth_state).await {
        Ok(claims) => claims,
        Err(err) => return (jar, CallbackFailure(err)).into_response(),
    };

    if let Err(rejected) = state.policy.check(&claims) {
        tracing::warn!(
            subject = %claims.subject,
            domain = %rejected.domain,
            "Rejected login from unauthorized email domain"
        );
        let location = format!(
            "{}?domain={}",
            state.config.paths.invalid_domain,
            url::form_urlencoded::byte_serialize(rejected.domain.as_bytes()).collect::<String>()
        );
        return (jar, found(&location)).into_response();
    }

    let mut session = state.cookies.session(&jar);
    session.set_identity(&claims);
    tracing::info!(
        subject = %claims.subject,
        email = claims.email.as_deref().unwrap_or_default(),
        "User logged in"
    );

    (
        state.cookies.save_session(jar, &session),
        found(&state.config.paths.home),
    )
        .into_response()
}

async fn complete_login(
    state: &AppState,
    query: CallbackQuery,
    auth_state: Option<AuthState>,
) -> Result<IdentityClaims, CallbackError> {
    if let Some(error) = &query.error {
        tracing::warn!(
            error = %error,
            description = query.error_description.as_deref().unwrap_or_default(),
            "Identity provider returned an error"
        );
    }

    let code = query
        .code
        .filter(|code| !code.is_empty())
        .ok_or(CallbackError::MissingCode)?;

    let auth_state = auth_state.ok_or(CallbackError::CsrfMismatch)?;
    if query.state.as_deref() != Some(auth_state.csrf_token.as_str()) {
        return Err(CallbackError::CsrfMismatch);
    }

    state.oidc_client.exchange_code(&code, &auth_state).await
}

/// Logs out the user by dropping the identity from the session.
pub async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> Response {
    let mut session = state.cookies.session(&jar);
    if session.clear_identity() {
        tracing::info!("User logged out");
    }

    (
        state.cookies.save_session(jar, &session),
        found(&state.config.paths.home),
    )
        .into_response()
}

/// Explains that the account's domain is not allowed and offers a fresh
/// login link for a different account.
pub async fn invalid_domain(
    State(state): State<AppState>,
    Query(query): Query<InvalidDomainQuery>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Html<String>), TemplateError> {
    let (auth_url, auth_state) = state.oidc_client.authorization_url();

    let page = state.templates.render(
        INVALID_DOMAIN_PAGE,
        &InvalidDomainPage {
            title: &state.config.service_name,
            authorization_url: &auth_url,
            domain: &query.domain,
        },
    )?;

    Ok((state.cookies.save_auth_state(jar, &auth_state), page))
}
