use std::sync::Arc;
use std::time::Duration;

use delivery_tracker::api;
use delivery_tracker::client::deliveries::HttpDeliveryApi;
use delivery_tracker::config::Config;
use delivery_tracker::error::AppError;
use delivery_tracker::routing::provider::HttpRoutingProvider;
use delivery_tracker::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|err| AppError::Internal(format!("failed to build http client: {err}")))?;

    let routing = Arc::new(HttpRoutingProvider::new(
        http.clone(),
        config.api_base_url.clone(),
        config.api_auth_token.clone(),
    ));
    let deliveries = Arc::new(HttpDeliveryApi::new(
        http,
        config.api_base_url.clone(),
        config.api_auth_token.clone(),
    ));

    let (app_state, session_service) = AppState::new(&config, routing, deliveries)?;
    let shared_state = Arc::new(app_state);

    tokio::spawn(session_service.run());

    let app = api::rest::router(shared_state.clone());

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        api_base_url = %config.api_base_url,
        "delivery tracker started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    if let Err(err) = shared_state.session.dispose().await {
        tracing::warn!(error = %err, "failed to dispose delivery session on shutdown");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
