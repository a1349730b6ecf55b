//! wallet-bridge: the wallet-provider capability consumed by Strongbox
//!
//! Everything Strongbox needs from a wallet fits one trait: account access,
//! the chain the wallet is on, a switch-or-add flow for the required chain,
//! transaction signing/broadcast, and change notifications. The live
//! implementation is whatever bridges to the user's actual wallet; this
//! crate ships the trait plus a demo auto-approver and a scriptable mock so
//! the rest of the workspace never depends on a concrete wallet.

pub mod demo;
pub mod error;
pub mod mock;
pub mod types;

use async_trait::async_trait;
use strongbox_core::{Address, ChainId, TxRef};
use tokio::sync::broadcast;

pub use demo::DemoWallet;
pub use error::WalletError;
pub use mock::MockWallet;
pub use types::{ChainParams, TxRequest, WalletEvent};

/// Result type for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Capability interface over the user's wallet provider.
///
/// Implementations are long-lived; one instance serves the whole app.
/// `subscribe` hands out independent receivers, so several listeners can
/// watch account and chain changes without coordination.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Ask the wallet for its accounts; the first entry is the active one.
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// The chain the wallet is currently on.
    async fn current_chain(&self) -> Result<ChainId>;

    /// Switch the wallet to `chain`, adding it first if the wallet does not
    /// know it. Errors with `Rejected` when the user declines the switch.
    async fn switch_or_add_chain(&self, chain: &ChainParams) -> Result<()>;

    /// Sign and broadcast a transaction. Returns once the wallet has
    /// broadcast it; mining is watched elsewhere.
    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxRef>;

    /// Subscribe to account/chain change notifications.
    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}
