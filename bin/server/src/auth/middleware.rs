//! Authentication gate applied to every request.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::PrivateCookieJar;

use super::{AppState, found};

/// Lets a request through only if it targets a gateway path or carries a
/// session with a verified identity. Everything else is redirected to the
/// login page.
///
/// Admitted requests are forwarded untouched; the cookie jar is read from
/// the headers without consuming them.
pub async fn require_identity(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.config.paths.is_bypassed(request.uri().path()) {
        return next.run(request).await;
    }

    let jar = PrivateCookieJar::from_headers(request.headers(), state.cookie_key());
    if state.cookies.session(&jar).is_authenticated() {
        return next.run(request).await;
    }

    tracing::debug!(path = %request.uri().path(), "No identity in session, redirecting to login");
    found(&state.config.paths.login)
}
