//! Scriptable wallet for tests: programmable rejections, recorded requests,
//! and hand-driven change events.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use strongbox_core::{Address, ChainId, TxRef};
use tokio::sync::broadcast;

use crate::types::{ChainParams, TxRequest, WalletEvent};
use crate::{Result, WalletError, WalletProvider};

/// Test double for `WalletProvider`.
pub struct MockWallet {
    accounts: Mutex<Vec<Address>>,
    chain: AtomicU64,
    reject_next: AtomicBool,
    sent: Mutex<Vec<TxRequest>>,
    nonce: AtomicU64,
    events: broadcast::Sender<WalletEvent>,
}

impl MockWallet {
    pub fn new(account: Address, chain: ChainId) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: Mutex::new(vec![account]),
            chain: AtomicU64::new(chain),
            reject_next: AtomicBool::new(false),
            sent: Mutex::new(Vec::new()),
            nonce: AtomicU64::new(1),
            events,
        }
    }

    /// Make the next signing request fail with `WalletError::Rejected`.
    pub fn reject_next(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    /// Transactions that reached the wallet, in order.
    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().expect("mock wallet poisoned").clone()
    }

    pub fn set_chain(&self, chain: ChainId) {
        self.chain.store(chain, Ordering::SeqCst);
    }

    /// Push a change event to all subscribers.
    pub fn emit(&self, event: WalletEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts = self.accounts.lock().expect("mock wallet poisoned").clone();
        if accounts.is_empty() {
            return Err(WalletError::NoAccounts);
        }
        Ok(accounts)
    }

    async fn current_chain(&self) -> Result<ChainId> {
        Ok(self.chain.load(Ordering::SeqCst))
    }

    async fn switch_or_add_chain(&self, chain: &ChainParams) -> Result<()> {
        self.chain.store(chain.chain_id, Ordering::SeqCst);
        Ok(())
    }

    async fn sign_and_send(&self, tx: TxRequest) -> Result<TxRef> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(WalletError::Rejected);
        }
        self.sent.lock().expect("mock wallet poisoned").push(tx);
        let nonce = self.nonce.fetch_add(1, Ordering::SeqCst);
        Ok(TxRef::new(format!("0x{:064x}", nonce)))
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_rejection_is_one_shot() {
        let wallet = MockWallet::new(Address::new("0x0000000000000000000000000000000000000001"), 1);
        wallet.reject_next();

        let tx = TxRequest {
            from: Address::new("0x0000000000000000000000000000000000000001"),
            to: Address::new("0x0000000000000000000000000000000000000002"),
            data: "0x".to_string(),
            value: 0,
        };

        assert!(matches!(
            wallet.sign_and_send(tx.clone()).await,
            Err(WalletError::Rejected)
        ));
        assert!(wallet.sign_and_send(tx).await.is_ok());
        assert_eq!(wallet.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_switch_updates_chain() {
        let wallet = MockWallet::new(Address::new("0x0000000000000000000000000000000000000001"), 1);
        let params = ChainParams {
            chain_id: 8453,
            chain_name: "Base".into(),
            rpc_url: "https://mainnet.base.org".into(),
            currency_symbol: "ETH".into(),
            explorer_url: "https://basescan.org".into(),
        };
        wallet.switch_or_add_chain(&params).await.unwrap();
        assert_eq!(wallet.current_chain().await.unwrap(), 8453);
    }
}
