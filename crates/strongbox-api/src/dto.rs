//! Data Transfer Objects for API requests and responses

use daylock::{RevealOutcome, SessionStatus, TokenMetadata};
use serde::{Deserialize, Serialize};
use strongbox_core::{format_units, BackendMode, SessionError, TokenUnits};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Node status response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatusResponse {
    pub mode: String,
    pub rpc_url: String,
    pub reachable: bool,
    pub chain_id: Option<u64>,
    pub required_chain_id: u64,
    pub latest_block: u64,
    pub syncing: bool,
}

/// Runtime configuration request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRequest {
    pub mode: BackendMode,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

/// Wallet status response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatusResponse {
    pub connected: bool,
    pub account: Option<String>,
    pub session_id: Option<String>,
}

/// Token metadata response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: String,
}

impl From<TokenMetadata> for TokenResponse {
    fn from(meta: TokenMetadata) -> Self {
        Self {
            name: meta.name,
            symbol: meta.symbol,
            decimals: meta.decimals,
            total_supply: meta.total_supply.to_string(),
        }
    }
}

/// Unlock status snapshot for the presentation layer.
///
/// `is_unlocked` and the countdowns are computed at render time from the
/// stored snapshot; they are never cached server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockStatusResponse {
    pub account: String,
    pub is_unlocked: bool,
    pub unlocked_until: u64,
    /// Raw units as a decimal string
    pub unlocked_amount: String,
    /// Human-readable DLK amount
    pub unlocked_amount_display: String,
    pub next_attempt_time: u64,
    pub has_commit: bool,
    pub phase: String,
    pub pending: String,
    pub failure: Option<String>,
    pub failure_detail: Option<String>,
    pub now: u64,
    pub seconds_until_next_attempt: u64,
    pub seconds_until_lock_expires: u64,
}

impl From<&SessionStatus> for UnlockStatusResponse {
    fn from(status: &SessionStatus) -> Self {
        let snapshot = &status.snapshot;
        let now = status.now;
        Self {
            account: status.account.to_string(),
            is_unlocked: snapshot.is_unlocked(now),
            unlocked_until: snapshot.unlocked_until,
            unlocked_amount: snapshot.unlocked_amount.to_string(),
            unlocked_amount_display: format_units(snapshot.unlocked_amount),
            next_attempt_time: snapshot.next_attempt_time(),
            has_commit: snapshot.has_commit(),
            phase: status.phase.as_str().to_string(),
            pending: match status.pending {
                daylock::PendingOp::Idle => "idle",
                daylock::PendingOp::Committing => "committing",
                daylock::PendingOp::Revealing => "revealing",
                daylock::PendingOp::Transferring => "transferring",
            }
            .to_string(),
            failure: status.last_failure.map(|f| f.as_str().to_string()),
            failure_detail: status.last_failure.map(|f| f.describe().to_string()),
            now,
            seconds_until_next_attempt: snapshot.next_attempt_time().saturating_sub(now),
            seconds_until_lock_expires: if snapshot.is_unlocked(now) {
                snapshot.unlocked_until - now
            } else {
                0
            },
        }
    }
}

/// Commit request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitRequest {
    /// The secret number. Held by the caller until reveal; never persisted.
    pub preimage: u64,
}

/// Commit response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub tx_ref: String,
    pub block_number: u64,
}

/// Reveal request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealRequest {
    pub preimage: u64,
}

/// Reveal response. Outcome failures arrive here with 200, not as errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    pub unlocked: bool,
    pub tx_ref: String,
    pub failure: Option<String>,
    pub failure_detail: Option<String>,
}

impl From<RevealOutcome> for RevealResponse {
    fn from(outcome: RevealOutcome) -> Self {
        Self {
            unlocked: outcome.unlocked,
            tx_ref: outcome.tx_ref.to_string(),
            failure: outcome.failure.map(|f| f.as_str().to_string()),
            failure_detail: outcome.failure.map(|f| f.describe().to_string()),
        }
    }
}

/// Transfer request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub to: String,
    /// Raw units as a decimal string
    pub amount: String,
}

/// Transfer response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub tx_ref: String,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

/// Parse a raw-units decimal string from a request
pub fn parse_units(raw: &str) -> Result<TokenUnits, SessionError> {
    raw.parse::<TokenUnits>()
        .map_err(|_| SessionError::InvalidAmount {
            message: format!("'{}' is not a raw token amount", raw),
        })
}
