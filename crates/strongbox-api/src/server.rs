//! HTTP server setup and configuration

use std::net::SocketAddr;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::routes::create_router;
use crate::AppState;

/// Create the full application router with middleware.
///
/// CORS is wide open: the server binds to loopback only and the frontend
/// dev server runs on a different origin.
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server on the configured port. Runs until the process
/// exits; all session state lives in `state` and dies with it.
pub async fn start_server(state: AppState) -> Result<(), std::io::Error> {
    let config = state.config().await;
    let addr = SocketAddr::from(([127, 0, 0, 1], config.api_port));
    let app = create_app(state);

    tracing::info!(mode = config.mode.as_str(), "API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
