//! API route handlers

pub mod daylock;
pub mod health;
pub mod node;
pub mod wallet;

use axum::http::StatusCode;
use axum::{routing::get, Json, Router};
use strongbox_core::Error;

use crate::dto::ApiError;
use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/node", node::router())
        .nest("/wallet", wallet::router())
        .nest("/daylock", daylock::router())
        .with_state(state)
}

/// Map a core error onto an HTTP response
pub(crate) fn error_response(e: Error) -> (StatusCode, Json<ApiError>) {
    let (status, code, message) = match &e {
        Error::Session(s) => (s.status_code(), s.error_code(), s.to_string()),
        Error::Ledger(l) => (l.status_code(), l.error_code(), l.to_string()),
        Error::Rpc(r) => (502, "transport_failure", r.to_string()),
        Error::Config(msg) => (500, "config_error", msg.clone()),
        Error::Serialization(msg) => (500, "internal_error", msg.clone()),
    };
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(ApiError::new(code, message)),
    )
}

/// 409 returned when no wallet session is active
pub(crate) fn no_session() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::CONFLICT,
        Json(ApiError::new("no_session", "Connect a wallet first")),
    )
}
