//! Wallet connection endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::dto::{ApiError, WalletStatusResponse};
use crate::routes::error_response;
use crate::AppState;

/// Create wallet routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/connect", post(connect))
        .route("/disconnect", post(disconnect))
}

/// GET /wallet/status - Active session, if any
pub async fn get_status(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    let session = state.session().await;
    Json(match session {
        Some(session) => WalletStatusResponse {
            connected: true,
            account: Some(session.account().to_string()),
            session_id: Some(session.id().to_string()),
        },
        None => WalletStatusResponse {
            connected: false,
            account: None,
            session_id: None,
        },
    })
}

/// POST /wallet/connect - Request accounts, enforce the required chain,
/// and open a session for the active account
pub async fn connect(
    State(state): State<AppState>,
) -> Result<Json<WalletStatusResponse>, (StatusCode, Json<ApiError>)> {
    let session = state.connect_wallet().await.map_err(error_response)?;
    Ok(Json(WalletStatusResponse {
        connected: true,
        account: Some(session.account().to_string()),
        session_id: Some(session.id().to_string()),
    }))
}

/// POST /wallet/disconnect - Tear down the session and stop polling
pub async fn disconnect(State(state): State<AppState>) -> Json<WalletStatusResponse> {
    state.disconnect_wallet().await;
    Json(WalletStatusResponse {
        connected: false,
        account: None,
        session_id: None,
    })
}
