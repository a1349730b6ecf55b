//! Application state shared across API handlers

use std::sync::Arc;

use daylock::constants::{required_chain_params, REQUIRED_CHAIN_ID};
use daylock::{AccountContext, EthLedger, LedgerPort, SimLedger, UnlockSession};
use eth_rpc_client::EthRpcClient;
use strongbox_core::{AppConfig, BackendMode, Error, SessionError};
use tokio::sync::RwLock;
use wallet_bridge::{DemoWallet, WalletProvider};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    ledger: RwLock<Option<Arc<dyn LedgerPort>>>,
    wallet: Arc<dyn WalletProvider>,
    context: Arc<AccountContext>,
}

impl AppState {
    /// State with the default config and the demo wallet.
    ///
    /// Must be created inside a tokio runtime: wallet change events are
    /// pumped into the account context from a spawned task.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create with a specific config
    pub fn with_config(config: AppConfig) -> Self {
        let wallet: Arc<dyn WalletProvider> = Arc::new(DemoWallet::new(REQUIRED_CHAIN_ID));
        Self::with_wallet(config, wallet)
    }

    /// Create with a caller-supplied wallet provider (live bridges, tests)
    pub fn with_wallet(config: AppConfig, wallet: Arc<dyn WalletProvider>) -> Self {
        let context = Arc::new(AccountContext::new());
        let _event_pump = context.attach(wallet.clone());
        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                ledger: RwLock::new(None),
                wallet,
                context,
            }),
        }
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    /// Swap configuration at runtime. Invalidates the cached ledger and any
    /// active session; callers reconnect against the new backend.
    pub async fn set_config(&self, config: AppConfig) {
        {
            let mut current = self.inner.config.write().await;
            *current = config;
        }
        {
            let mut ledger = self.inner.ledger.write().await;
            *ledger = None;
        }
        self.inner.context.disconnect().await;
        tracing::info!("configuration updated; sessions invalidated");
    }

    /// Get or create the ledger for the configured backend mode
    pub async fn ledger(&self) -> Arc<dyn LedgerPort> {
        {
            let ledger = self.inner.ledger.read().await;
            if let Some(ledger) = ledger.as_ref() {
                return ledger.clone();
            }
        }

        let config = self.inner.config.read().await.clone();
        let ledger: Arc<dyn LedgerPort> = match config.mode {
            BackendMode::Demo => {
                tracing::info!("creating simulated ledger (demo mode)");
                Arc::new(SimLedger::new())
            }
            BackendMode::Live => {
                tracing::info!(url = %config.rpc.url, "creating live ledger");
                Arc::new(EthLedger::new(
                    EthRpcClient::new(&config.rpc),
                    self.inner.wallet.clone(),
                ))
            }
        };

        let mut cached = self.inner.ledger.write().await;
        *cached = Some(ledger.clone());
        ledger
    }

    pub fn wallet(&self) -> Arc<dyn WalletProvider> {
        self.inner.wallet.clone()
    }

    pub fn context(&self) -> &Arc<AccountContext> {
        &self.inner.context
    }

    /// The active session, if a wallet is connected
    pub async fn session(&self) -> Option<Arc<UnlockSession>> {
        self.inner.context.session().await
    }

    /// Run the connect flow: request accounts, make sure the wallet is on
    /// the required chain (switch-or-add if not), then open a session for
    /// the active account.
    pub async fn connect_wallet(&self) -> Result<Arc<UnlockSession>, Error> {
        let accounts = self
            .inner
            .wallet
            .request_accounts()
            .await
            .map_err(strongbox_core::LedgerError::from)?;
        let account = accounts
            .into_iter()
            .next()
            .ok_or(SessionError::NoSession)?;

        let chain = self
            .inner
            .wallet
            .current_chain()
            .await
            .map_err(strongbox_core::LedgerError::from)?;
        if chain != REQUIRED_CHAIN_ID {
            tracing::info!(chain, required = REQUIRED_CHAIN_ID, "switching wallet chain");
            self.inner
                .wallet
                .switch_or_add_chain(&required_chain_params())
                .await
                .map_err(strongbox_core::LedgerError::from)?;
            let now_on = self
                .inner
                .wallet
                .current_chain()
                .await
                .map_err(strongbox_core::LedgerError::from)?;
            if now_on != REQUIRED_CHAIN_ID {
                return Err(SessionError::WrongChain {
                    expected: REQUIRED_CHAIN_ID,
                    actual: now_on,
                }
                .into());
            }
        }

        let ledger = self.ledger().await;
        let session = self.inner.context.connect(account, ledger).await?;
        Ok(session)
    }

    /// Disconnect the wallet session
    pub async fn disconnect_wallet(&self) {
        self.inner.context.disconnect().await;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
