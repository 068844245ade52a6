//! Router assembly.
//!
//! Layer order, outermost first: request tracing, CORS, the identity gate.
//! CORS sits outside the gate so preflight requests are answered without a
//! session. Static content is the fallback service, so anything that is not
//! a gateway route is served from disk once the gate admits it.

use axum::{Router, middleware::from_fn_with_state, routing::get};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::auth::{self, AppState, CorsOrigins};

/// Builds the gateway router.
pub fn router(state: AppState) -> Router {
    let paths = state.config.paths.clone();

    let mut app = Router::new()
        .route(&paths.login, get(auth::login))
        .route(&paths.callback, get(auth::callback))
        .route(&paths.logout, get(auth::logout))
        .route(&paths.invalid_domain, get(auth::invalid_domain))
        .fallback_service(ServeDir::new(&state.config.static_path))
        .layer(from_fn_with_state(state.clone(), auth::require_identity))
        .with_state(state.clone());

    if let Some(cors) = cors_layer(state.cors()) {
        app = app.layer(cors);
    }

    app.layer(TraceLayer::new_for_http())
}

/// Credentials are only allowed for listed origins; browsers refuse them
/// alongside a wildcard.
fn cors_layer(origins: &CorsOrigins) -> Option<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    match origins {
        CorsOrigins::Disabled => None,
        CorsOrigins::Any => Some(layer.allow_origin(AllowOrigin::any())),
        CorsOrigins::Listed(origins) => Some(
            layer
                .allow_origin(AllowOrigin::list(origins.iter().cloned()))
                .allow_credentials(true),
        ),
    }
}
