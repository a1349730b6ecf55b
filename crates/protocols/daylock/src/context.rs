//! Account context: session lifecycle and polling.
//!
//! Tracks the single active account, creates a session when one connects,
//! and tears it down on disconnect, account switch, or chain change. Each
//! teardown bumps a generation counter shared with the sessions it issued,
//! which is how late completions from a replaced session get discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use strongbox_core::{Address, SessionError};
use tokio::task::JoinHandle;
use wallet_bridge::{WalletEvent, WalletProvider};

use crate::constants::POLL_INTERVAL_SECS;
use crate::ledger::LedgerPort;
use crate::session::UnlockSession;

struct ContextInner {
    session: Option<Arc<UnlockSession>>,
    poll: Option<JoinHandle<()>>,
    ledger: Option<Arc<dyn LedgerPort>>,
}

/// Owns the active account's session.
pub struct AccountContext {
    generation: Arc<AtomicU64>,
    inner: tokio::sync::Mutex<ContextInner>,
}

impl AccountContext {
    pub fn new() -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            inner: tokio::sync::Mutex::new(ContextInner {
                session: None,
                poll: None,
                ledger: None,
            }),
        }
    }

    /// The active session, if an account is connected.
    pub async fn session(&self) -> Option<Arc<UnlockSession>> {
        self.inner.lock().await.session.clone()
    }

    /// Activate `account` against `ledger`: any previous session is
    /// destroyed, a fresh one is created and refreshed, and a poll task
    /// starts re-querying the ledger every 30 seconds.
    pub async fn connect(
        &self,
        account: Address,
        ledger: Arc<dyn LedgerPort>,
    ) -> Result<Arc<UnlockSession>, SessionError> {
        if !account.is_well_formed() {
            return Err(SessionError::InvalidAddress {
                address: account.to_string(),
            });
        }

        let mut inner = self.inner.lock().await;
        self.teardown_locked(&mut inner);

        let generation = self.generation.load(Ordering::SeqCst);
        let session = Arc::new(UnlockSession::new(
            account.clone(),
            ledger.clone(),
            generation,
            self.generation.clone(),
        ));
        tracing::info!(account = %account, session = session.id(), "session created");

        if let Err(e) = session.refresh().await {
            tracing::warn!(account = %account, error = %e, "initial refresh failed");
        }

        let poll_session = session.clone();
        let poll = tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(std::time::Duration::from_secs(POLL_INTERVAL_SECS));
            // The first tick completes immediately; the session was just
            // refreshed, so skip it.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !poll_session.is_current() {
                    break;
                }
                if let Err(e) = poll_session.refresh().await {
                    tracing::warn!(
                        account = %poll_session.account(),
                        error = %e,
                        "poll refresh failed"
                    );
                }
            }
        });

        inner.session = Some(session.clone());
        inner.poll = Some(poll);
        inner.ledger = Some(ledger);
        Ok(session)
    }

    /// Destroy the active session and stop polling. Cached status dies with
    /// the session; state is rebuilt from the ledger on the next connect.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.lock().await;
        self.teardown_locked(&mut inner);
    }

    /// Apply a wallet change notification.
    pub async fn handle_event(&self, event: WalletEvent) {
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                None => {
                    tracing::info!("wallet disconnected");
                    self.disconnect().await;
                }
                Some(account) => {
                    let (same_account, ledger) = {
                        let inner = self.inner.lock().await;
                        (
                            inner
                                .session
                                .as_ref()
                                .is_some_and(|s| s.account() == &account),
                            inner.ledger.clone(),
                        )
                    };
                    if same_account {
                        return;
                    }
                    match ledger {
                        Some(ledger) => {
                            tracing::info!(account = %account, "active account changed");
                            if let Err(e) = self.connect(account, ledger).await {
                                tracing::warn!(error = %e, "reconnect after account change failed");
                            }
                        }
                        None => {
                            tracing::debug!("account change before first connect; ignoring");
                        }
                    }
                }
            },
            WalletEvent::ChainChanged(chain) => {
                // A chain change invalidates everything; the caller must
                // reconnect through the switch-or-add flow.
                tracing::info!(chain, "wallet chain changed; session invalidated");
                self.disconnect().await;
            }
        }
    }

    /// Forward wallet events into this context until the wallet closes its
    /// event channel.
    pub fn attach(self: &Arc<Self>, wallet: Arc<dyn WalletProvider>) -> JoinHandle<()> {
        let context = self.clone();
        let mut events = wallet.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => context.handle_event(event).await,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "wallet event stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Invalidate outstanding sessions and stop their polling. Bumping the
    /// generation first means a poll tick racing this teardown discards its
    /// own result.
    fn teardown_locked(&self, inner: &mut ContextInner) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(poll) = inner.poll.take() {
            poll.abort();
        }
        if let Some(session) = inner.session.take() {
            tracing::info!(account = %session.account(), session = session.id(), "session destroyed");
        }
    }
}

impl Default for AccountContext {
    fn default() -> Self {
        Self::new()
    }
}
