use oauth_shield_server::{app, auth::AppState, config::ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(
        service = %config.service_name,
        environment = ?config.environment,
        static_path = %config.static_path.display(),
        "Loaded configuration"
    );

    let domain_policy = config.domain_policy();
    if domain_policy.is_unrestricted() {
        tracing::warn!("AUTHORIZED_DOMAINS is empty, any account the provider accepts may log in");
    } else {
        tracing::info!(domains = ?domain_policy.domains(), "Restricting logins by email domain");
    }

    let bind_address = config.bind_address.clone();
    let state = AppState::new(config).expect("invalid configuration");
    let app = app::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", bind_address);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
