use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

use crate::{
    auth,
    config::Config,
    handlers::{self, chat_completions::AppState},
    logging::Sensitive,
    metrics,
    providers::azure_openai,
    signals::setup_signal_handlers,
};

/// Start the proxy server
///
/// This function:
/// 1. Initializes metrics
/// 2. Sets up signal handlers for graceful shutdown
/// 3. Creates the Axum application
/// 4. Binds to the configured address
/// 5. Serves requests until a shutdown signal arrives
pub async fn start_server(config: Config) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics()?);

    let (shutdown_tx, signal_handle) = setup_signal_handlers();
    let mut shutdown_rx = shutdown_tx.subscribe();

    let config = Arc::new(config);
    let app_state = AppState::new(config.clone())?;
    let app = create_router(app_state, metrics_handle);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    log_startup_summary(&config, addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.recv().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    signal_handle.await?;
    info!("Server stopped gracefully");

    Ok(())
}

/// Create the Axum router with all routes and middleware
pub fn create_router(app_state: AppState, metrics_handle: Arc<PrometheusHandle>) -> Router {
    let config = app_state.config.clone();

    let auth_routes = Router::new()
        .route(
            "/v1/chat/completions",
            post(handlers::chat_completions::handle_chat_completions),
        )
        .layer(middleware::from_fn_with_state(
            config.clone(),
            auth::auth_middleware,
        ))
        .with_state(app_state.clone());

    // Public endpoints (no auth required)
    let mut public_routes = Router::new()
        .route("/v1/models", get(handlers::models::list_models))
        .route("/health", get(handlers::health::health_check))
        .with_state(app_state);

    if config.metrics.enabled {
        public_routes = public_routes.merge(
            Router::new()
                .route(
                    &config.metrics.endpoint,
                    get(handlers::metrics_handler::metrics),
                )
                .with_state(metrics_handle),
        );
    }

    Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        // Outermost, so preflight requests are answered before authentication
        .layer(cors_layer())
}

/// Allow every origin, method and header
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::HEAD,
            Method::OPTIONS,
            Method::PATCH,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}

fn log_startup_summary(config: &Config, addr: SocketAddr) {
    info!("Starting Azure OpenAI proxy on {}", addr);
    info!(
        endpoint = %config.azure.endpoint,
        api_key = %Sensitive::new(&config.azure.api_key),
        api_version = %config.azure.api_version,
        "Forwarding to {}",
        azure_openai::chat_completions_url(&config.azure, "{deployment}")
    );
    info!(
        "Configuration: {} model mappings, default deployment '{}', fallbacks {:?}, max {} in-flight calls",
        config.models.len(),
        config.azure.default_deployment,
        config.azure.fallback_deployments,
        config.azure.max_in_flight
    );

    if config.auth.shared_secret.is_empty() {
        warn!("Shared secret is empty: any caller sending 'Authorization: Bearer ' is accepted");
    }
}
