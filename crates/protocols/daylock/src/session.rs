//! Unlock session: the per-account commit-reveal state machine.
//!
//! A session owns one status snapshot and one pending-operation flag. Its
//! phase is always derived from the latest snapshot plus the sticky
//! last-failure marker, never stored, so the session is reconstructible
//! from a single ledger query at any point. Sessions are created by
//! `AccountContext` when an account becomes active and are never reused
//! across accounts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use strongbox_core::{Address, Error, LedgerError, SessionError, Timestamp, TokenUnits, TxRef};

use crate::ledger::LedgerPort;
use crate::state::{
    CommitReceipt, PendingOp, RevealFailure, RevealOutcome, UnlockPhase, UnlockStatus,
};

/// Everything the presentation layer needs to render a session
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub account: Address,
    pub snapshot: UnlockStatus,
    pub phase: UnlockPhase,
    pub pending: PendingOp,
    pub last_failure: Option<RevealFailure>,
    /// Ledger time the phase was derived at
    pub now: Timestamp,
}

struct SessionState {
    snapshot: UnlockStatus,
    pending: PendingOp,
    last_failure: Option<RevealFailure>,
}

/// Commit-reveal state machine for one account.
pub struct UnlockSession {
    account: Address,
    id: String,
    generation: u64,
    current_generation: Arc<AtomicU64>,
    ledger: Arc<dyn LedgerPort>,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for UnlockSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockSession")
            .field("account", &self.account)
            .field("id", &self.id)
            .field("generation", &self.generation)
            .field("ledger", &"<dyn LedgerPort>")
            .finish()
    }
}

impl UnlockSession {
    pub(crate) fn new(
        account: Address,
        ledger: Arc<dyn LedgerPort>,
        generation: u64,
        current_generation: Arc<AtomicU64>,
    ) -> Self {
        Self {
            account,
            id: uuid::Uuid::new_v4().to_string(),
            generation,
            current_generation,
            ledger,
            state: Mutex::new(SessionState {
                snapshot: UnlockStatus::default(),
                pending: PendingOp::Idle,
                last_failure: None,
            }),
        }
    }

    /// Session not owned by a context; always current. Used directly in
    /// tests and by embedders that manage their own lifecycle.
    pub fn standalone(account: Address, ledger: Arc<dyn LedgerPort>) -> Arc<Self> {
        let generation = Arc::new(AtomicU64::new(0));
        Arc::new(Self::new(account, ledger, 0, generation))
    }

    pub fn account(&self) -> &Address {
        &self.account
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this session is still the active one for its context.
    /// Results arriving for a superseded session must be discarded.
    pub fn is_current(&self) -> bool {
        self.generation == self.current_generation.load(Ordering::SeqCst)
    }

    /// Current snapshot, phase, and pending flag. Pure read.
    pub fn status(&self) -> SessionStatus {
        let now = self.ledger.now();
        let state = self.lock_state();
        SessionStatus {
            account: self.account.clone(),
            snapshot: state.snapshot.clone(),
            phase: UnlockPhase::derive(&state.snapshot, state.last_failure, now),
            pending: state.pending,
            last_failure: state.last_failure,
            now,
        }
    }

    /// Re-query the ledger and replace the snapshot. Idempotent and free of
    /// ledger side effects; safe to run while a mutation is pending. The
    /// result is dropped if the session was superseded mid-query.
    pub async fn refresh(&self) -> Result<(), LedgerError> {
        let status = self.ledger.query_unlock_status(&self.account).await?;
        if !self.is_current() {
            tracing::debug!(session = %self.id, "discarding refresh for superseded session");
            return Ok(());
        }
        self.lock_state().snapshot = status;
        Ok(())
    }

    /// Record a commit for a fresh attempt.
    ///
    /// Guarded client-side: one operation in flight per session, no second
    /// commit while one is outstanding (checked against the snapshot, no
    /// ledger round-trip), and no commit while the cooldown runs.
    pub async fn commit(&self, preimage: u64) -> Result<CommitReceipt, Error> {
        let now = self.ledger.now();
        {
            let mut state = self.lock_state();
            if state.pending != PendingOp::Idle {
                return Err(SessionError::AttemptInFlight.into());
            }
            if state.snapshot.has_commit() {
                return Err(SessionError::CommitPending.into());
            }
            if !state.snapshot.can_attempt(now) {
                return Err(SessionError::CooldownActive {
                    until: state.snapshot.next_attempt_time(),
                }
                .into());
            }
            state.pending = PendingOp::Committing;
            state.last_failure = None;
        }

        let result = async {
            let hash = self.ledger.commit_hash(preimage).await?;
            self.ledger.commit(&self.account, hash).await
        }
        .await;
        self.finish_op();

        match result {
            Ok(receipt) => {
                tracing::info!(
                    account = %self.account,
                    block = receipt.block_number,
                    "commit recorded"
                );
                self.refresh_after_mutation().await;
                Ok(receipt)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Submit a reveal attempt.
    ///
    /// A completed attempt returns the outcome (success or a protocol
    /// failure); transport and signing failures return an error. Either
    /// way the pending flag is released and a refresh is triggered for
    /// completed attempts.
    pub async fn reveal(&self, preimage: u64) -> Result<RevealOutcome, Error> {
        {
            let mut state = self.lock_state();
            if state.pending != PendingOp::Idle {
                return Err(SessionError::AttemptInFlight.into());
            }
            state.pending = PendingOp::Revealing;
        }

        let result = self.ledger.reveal(&self.account, preimage).await;
        self.finish_op();

        match result {
            Ok(outcome) => {
                if self.is_current() {
                    self.lock_state().last_failure = outcome.failure;
                } else {
                    tracing::debug!(
                        session = %self.id,
                        "discarding reveal outcome for superseded session"
                    );
                }
                match &outcome.failure {
                    Some(reason) => {
                        tracing::info!(account = %self.account, reason = reason.as_str(), "reveal failed")
                    }
                    None => tracing::info!(account = %self.account, "reveal unlocked the account"),
                }
                self.refresh_after_mutation().await;
                Ok(outcome)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Transfer unlocked tokens. Serialized with commit/reveal through the
    /// same pending flag; the ledger enforces the window itself.
    pub async fn transfer(&self, to: &Address, amount: TokenUnits) -> Result<TxRef, Error> {
        if !to.is_well_formed() {
            return Err(SessionError::InvalidAddress {
                address: to.to_string(),
            }
            .into());
        }
        if amount == 0 {
            return Err(SessionError::InvalidAmount {
                message: "amount must be positive".to_string(),
            }
            .into());
        }
        {
            let mut state = self.lock_state();
            if state.pending != PendingOp::Idle {
                return Err(SessionError::AttemptInFlight.into());
            }
            state.pending = PendingOp::Transferring;
        }

        let result = self.ledger.transfer(&self.account, to, amount).await;
        self.finish_op();

        match result {
            Ok(tx_ref) => {
                tracing::info!(account = %self.account, to = %to, amount, "transfer submitted");
                self.refresh_after_mutation().await;
                Ok(tx_ref)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Acknowledge a failed attempt; the phase falls back to
    /// cooldown/no-commit on the next read.
    pub fn dismiss_failure(&self) {
        self.lock_state().last_failure = None;
    }

    fn finish_op(&self) {
        self.lock_state().pending = PendingOp::Idle;
    }

    /// Post-mutation refresh. Failures only leave the snapshot stale; the
    /// poll loop or the next explicit refresh catches up.
    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(account = %self.account, error = %e, "post-operation refresh failed");
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state lock poisoned")
    }
}
