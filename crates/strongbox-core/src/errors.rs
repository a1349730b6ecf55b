//! Error types for Strongbox

use thiserror::Error;

/// Core errors that can occur in Strongbox
#[derive(Debug, Error)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Node connection and query errors
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("Node unreachable at {url}")]
    Unreachable { url: String },

    #[error("Node returned error: {message}")]
    Api { message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Hard failures at the ledger boundary.
///
/// Protocol outcome failures (a reveal rejected by ledger rules) are not
/// errors; they are carried in `RevealOutcome`. A `LedgerError` means the
/// attempt never reached or never completed on the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Node or broadcast failure. Retrying is the caller's decision.
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// The user cancelled signing in the wallet. Terminal for the attempt.
    #[error("Rejected by user")]
    RejectedByUser,
}

impl From<RpcError> for LedgerError {
    fn from(e: RpcError) -> Self {
        Self::Transport {
            message: e.to_string(),
        }
    }
}

/// Client-side session guards and lifecycle errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Another operation is already in flight for this session")]
    AttemptInFlight,

    #[error("A commit is already recorded; reveal or wait for it to expire")]
    CommitPending,

    #[error("Cooldown active until {until}")]
    CooldownActive { until: u64 },

    #[error("No active session; connect a wallet first")]
    NoSession,

    #[error("Wrong chain: expected {expected}, wallet is on {actual}")]
    WrongChain { expected: u64, actual: u64 },

    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },
}

/// Result type alias for Strongbox operations
pub type Result<T> = std::result::Result<T, Error>;

impl SessionError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AttemptInFlight => "attempt_in_flight",
            Self::CommitPending => "commit_pending",
            Self::CooldownActive { .. } => "cooldown_active",
            Self::NoSession => "no_session",
            Self::WrongChain { .. } => "wrong_chain",
            Self::InvalidAddress { .. } => "invalid_address",
            Self::InvalidAmount { .. } => "invalid_amount",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::AttemptInFlight | Self::CommitPending => 409,
            Self::CooldownActive { .. } => 422,
            Self::NoSession => 409,
            Self::WrongChain { .. } => 422,
            Self::InvalidAddress { .. } | Self::InvalidAmount { .. } => 400,
        }
    }
}

impl LedgerError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport_failure",
            Self::RejectedByUser => "rejected_by_user",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Transport { .. } => 502,
            Self::RejectedByUser => 409,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_error_codes() {
        let err = SessionError::CommitPending;
        assert_eq!(err.error_code(), "commit_pending");
        assert_eq!(err.status_code(), 409);

        let err = SessionError::CooldownActive { until: 1_700_086_400 };
        assert_eq!(err.error_code(), "cooldown_active");
        assert_eq!(err.status_code(), 422);
    }

    #[test]
    fn test_ledger_error_codes() {
        let err = LedgerError::Transport {
            message: "connection refused".into(),
        };
        assert_eq!(err.error_code(), "transport_failure");
        assert_eq!(err.status_code(), 502);
        assert_eq!(LedgerError::RejectedByUser.status_code(), 409);
    }

    #[test]
    fn test_rpc_error_converts_to_transport() {
        let rpc = RpcError::Unreachable {
            url: "http://127.0.0.1:8545".into(),
        };
        let ledger: LedgerError = rpc.into();
        assert!(matches!(ledger, LedgerError::Transport { .. }));
    }
}
