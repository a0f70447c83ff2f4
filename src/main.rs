use axum::{routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use intake_api::api::ApiDoc;
use intake_api::config::Config;
use intake_api::handlers::{self, AppState};

/// Main entry point for the application.
///
/// Initializes logging and configuration, builds the shared state with each
/// optional integration (email, chat, shared rate-limit store), assembles the
/// HTTP routes and middleware, and starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Configuration loaded successfully");

    let port = config.port;

    // Build application state (dispatchers + rate limiter + spam patterns)
    let state = Arc::new(AppState::from_config(config));

    // Coarse burst protection in front of the application-level fixed-window
    // limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .unwrap(),
    );

    // Protected API routes with security layers
    let protected_routes = handlers::api_router().layer(
        ServiceBuilder::new()
            // Contact payloads are small; anything bigger is abuse
            .layer(RequestBodyLimitLayer::new(64 * 1024))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Build final app with health check (bypasses rate limiting for the
    // platform's probes) and API docs
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
