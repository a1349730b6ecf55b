//! Wallet provider errors

use thiserror::Error;

/// Failures at the wallet boundary
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user declined the request in the wallet UI
    #[error("Rejected by user")]
    Rejected,

    /// The provider is gone or failed to respond
    #[error("Wallet provider unavailable: {message}")]
    Unavailable { message: String },

    /// The wallet returned no accounts
    #[error("No accounts available")]
    NoAccounts,
}

impl From<WalletError> for strongbox_core::LedgerError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::Rejected => Self::RejectedByUser,
            other => Self::Transport {
                message: other.to_string(),
            },
        }
    }
}
