//! Demo wallet: auto-approves everything for the simulated backend

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use strongbox_core::{Address, ChainId, TxRef};
use tokio::sync::broadcast;

use crate::types::{ChainParams, TxRequest, WalletEvent};
use crate::{Result, WalletProvider};

/// Fixed account used by demo mode
pub const DEMO_ACCOUNT: &str = "0xd311057ab5cee5e1d1934bf2f000da75ad4b1f5e";

/// Wallet stand-in for demo mode.
///
/// Holds one fixed account on the chain it is constructed with and approves
/// every signing request, so the unlock flow is drivable with no wallet
/// installed and no funds at risk.
pub struct DemoWallet {
    account: Address,
    chain: ChainId,
    nonce: AtomicU64,
    events: broadcast::Sender<WalletEvent>,
}

impl DemoWallet {
    pub fn new(chain: ChainId) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            account: Address::new(DEMO_ACCOUNT),
            chain,
            nonce: AtomicU64::new(1),
            events,
        }
    }

    pub fn account(&self) -> &Address {
        &self.account
    }
}

#[async_trait]
impl WalletProvider for DemoWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.account.clone()])
    }

    async fn current_chain(&self) -> Result<ChainId> {
        Ok(self.chain)
    }

    async fn switch_or_add_chain(&self, _chain: &ChainParams) -> Result<()> {
        Ok(())
    }

    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxRef> {
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(to = %tx.to, nonce, "demo wallet approved transaction");
        Ok(TxRef::new(format!("0x{:064x}", nonce)))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}
