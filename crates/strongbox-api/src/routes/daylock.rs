//! Daylock protocol endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use strongbox_core::Address;

use crate::dto::{
    parse_units, ApiError, CommitRequest, CommitResponse, RevealRequest, RevealResponse,
    TokenResponse, TransferRequest, TransferResponse, UnlockStatusResponse,
};
use crate::routes::{error_response, no_session};
use crate::AppState;

/// Create Daylock routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/token", get(get_token))
        .route("/status", get(get_status))
        .route("/refresh", post(refresh))
        .route("/commit", post(commit))
        .route("/reveal", post(reveal))
        .route("/dismiss", post(dismiss))
        .route("/transfer", post(transfer))
}

/// GET /daylock/token - Token metadata
pub async fn get_token(
    State(state): State<AppState>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ApiError>)> {
    let ledger = state.ledger().await;
    let metadata = ledger
        .token_metadata()
        .await
        .map_err(|e| error_response(e.into()))?;
    Ok(Json(metadata.into()))
}

/// GET /daylock/status - Current unlock status snapshot
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<UnlockStatusResponse>, (StatusCode, Json<ApiError>)> {
    let session = state.session().await.ok_or_else(no_session)?;
    let status = session.status();
    Ok(Json(UnlockStatusResponse::from(&status)))
}

/// POST /daylock/refresh - Re-query the ledger and return the new snapshot
pub async fn refresh(
    State(state): State<AppState>,
) -> Result<Json<UnlockStatusResponse>, (StatusCode, Json<ApiError>)> {
    let session = state.session().await.ok_or_else(no_session)?;
    session
        .refresh()
        .await
        .map_err(|e| error_response(e.into()))?;
    let status = session.status();
    Ok(Json(UnlockStatusResponse::from(&status)))
}

/// POST /daylock/commit - Record a commit for a fresh unlock attempt
pub async fn commit(
    State(state): State<AppState>,
    Json(request): Json<CommitRequest>,
) -> Result<Json<CommitResponse>, (StatusCode, Json<ApiError>)> {
    let session = state.session().await.ok_or_else(no_session)?;
    let receipt = session
        .commit(request.preimage)
        .await
        .map_err(error_response)?;
    Ok(Json(CommitResponse {
        tx_ref: receipt.tx_ref.to_string(),
        block_number: receipt.block_number,
    }))
}

/// POST /daylock/reveal - Submit the secret number.
///
/// Protocol outcomes (including failures) come back with 200; only
/// transport and signing failures are HTTP errors.
pub async fn reveal(
    State(state): State<AppState>,
    Json(request): Json<RevealRequest>,
) -> Result<Json<RevealResponse>, (StatusCode, Json<ApiError>)> {
    let session = state.session().await.ok_or_else(no_session)?;
    let outcome = session
        .reveal(request.preimage)
        .await
        .map_err(error_response)?;
    Ok(Json(outcome.into()))
}

/// POST /daylock/dismiss - Acknowledge a failed attempt
pub async fn dismiss(
    State(state): State<AppState>,
) -> Result<Json<UnlockStatusResponse>, (StatusCode, Json<ApiError>)> {
    let session = state.session().await.ok_or_else(no_session)?;
    session.dismiss_failure();
    let status = session.status();
    Ok(Json(UnlockStatusResponse::from(&status)))
}

/// POST /daylock/transfer - Transfer unlocked tokens
pub async fn transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferResponse>, (StatusCode, Json<ApiError>)> {
    let session = state.session().await.ok_or_else(no_session)?;
    let amount = parse_units(&request.amount).map_err(|e| error_response(e.into()))?;
    let tx_ref = session
        .transfer(&Address::new(request.to), amount)
        .await
        .map_err(error_response)?;
    Ok(Json(TransferResponse {
        tx_ref: tx_ref.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_core::AppConfig;

    /// Drive the demo backend end to end through the handlers.
    #[tokio::test]
    async fn test_commit_reveal_flow_through_handlers() {
        let state = AppState::with_config(AppConfig::default());

        // No session yet
        assert!(get_status(State(state.clone())).await.is_err());

        state.connect_wallet().await.unwrap();

        let status = get_status(State(state.clone())).await.unwrap().0;
        assert!(!status.has_commit);
        assert_eq!(status.phase, "noCommit");

        let receipt = commit(
            State(state.clone()),
            Json(CommitRequest { preimage: 42 }),
        )
        .await
        .unwrap()
        .0;
        assert!(receipt.tx_ref.starts_with("0x"));

        let status = get_status(State(state.clone())).await.unwrap().0;
        assert!(status.has_commit);
        assert_eq!(status.phase, "committed");

        // Second commit while one is outstanding: rejected client-side
        let err = commit(State(state.clone()), Json(CommitRequest { preimage: 43 })).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_token_endpoint_reports_demo_metadata() {
        let state = AppState::with_config(AppConfig::default());
        let token = get_token(State(state)).await.unwrap().0;
        assert_eq!(token.symbol, "DLK");
        assert_eq!(token.decimals, 18);
    }

    #[tokio::test]
    async fn test_transfer_rejects_malformed_amount() {
        let state = AppState::with_config(AppConfig::default());
        state.connect_wallet().await.unwrap();

        let err = transfer(
            State(state),
            Json(TransferRequest {
                to: "0x00000000000000000000000000000000000000b2".to_string(),
                amount: "1.5".to_string(),
            }),
        )
        .await;
        assert!(err.is_err());
    }
}
