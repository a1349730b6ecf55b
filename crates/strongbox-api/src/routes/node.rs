//! Node status and configuration endpoints

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use daylock::constants::REQUIRED_CHAIN_ID;
use eth_rpc_client::{probe::probe_chain, EthRpcClient};
use strongbox_core::BackendMode;

use crate::dto::{ApiError, ConfigRequest, NodeStatusResponse};
use crate::AppState;

/// Create node routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/config", post(set_config))
}

/// GET /node/status - Backend mode and chain reachability
pub async fn get_status(State(state): State<AppState>) -> Json<NodeStatusResponse> {
    let config = state.config().await;

    let response = match config.mode {
        BackendMode::Demo => NodeStatusResponse {
            mode: config.mode.as_str().to_string(),
            rpc_url: config.rpc.url.clone(),
            reachable: true,
            chain_id: Some(REQUIRED_CHAIN_ID),
            required_chain_id: REQUIRED_CHAIN_ID,
            latest_block: 0,
            syncing: false,
        },
        BackendMode::Live => {
            let client = EthRpcClient::new(&config.rpc);
            let probed = probe_chain(&client).await;
            NodeStatusResponse {
                mode: config.mode.as_str().to_string(),
                rpc_url: config.rpc.url.clone(),
                reachable: probed.reachable,
                chain_id: probed.chain_id,
                required_chain_id: REQUIRED_CHAIN_ID,
                latest_block: probed.latest_block,
                syncing: probed.syncing,
            }
        }
    };

    Json(response)
}

/// POST /node/config - Swap backend mode / RPC endpoint at runtime
pub async fn set_config(
    State(state): State<AppState>,
    Json(request): Json<ConfigRequest>,
) -> Result<Json<NodeStatusResponse>, (StatusCode, Json<ApiError>)> {
    if let Some(url) = &request.rpc_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiError::bad_request("RPC URL must be http(s)")),
            ));
        }
    }

    let mut config = state.config().await;
    config.mode = request.mode;
    if let Some(url) = request.rpc_url {
        config.rpc.url = url;
    }
    state.set_config(config).await;

    Ok(get_status(State(state)).await)
}
