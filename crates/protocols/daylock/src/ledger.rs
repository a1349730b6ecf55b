//! The ledger capability consumed by unlock sessions.
//!
//! Two implementations exist: `EthLedger` bound to the deployed contract,
//! and `SimLedger` reproducing the same state-transition contract in
//! memory. Session logic is written against this trait only, so one test
//! suite exercises every branch through either backend.

use async_trait::async_trait;
use strongbox_core::{Address, CommitHash, LedgerError, Timestamp, TokenUnits, TxRef};

use crate::state::{CommitReceipt, RevealOutcome, TokenMetadata, UnlockStatus};

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Capability interface for querying and mutating unlock state on a ledger.
#[async_trait]
pub trait LedgerPort: Send + Sync {
    /// Read the account's unlock state as one atomic snapshot.
    ///
    /// All underlying reads are pinned to a single ledger state; a snapshot
    /// may be stale but is never torn across two states.
    async fn query_unlock_status(&self, account: &Address) -> Result<UnlockStatus>;

    /// The ledger's hash of a preimage, as `revealAndUnlock` will compute it.
    async fn commit_hash(&self, preimage: u64) -> Result<CommitHash>;

    /// Record a commit for the account, overwriting any outstanding one.
    /// Resolves once the commit is confirmed.
    async fn commit(&self, account: &Address, hash: CommitHash) -> Result<CommitReceipt>;

    /// Submit a reveal. A completed attempt always yields an outcome: the
    /// ledger consumes the attempt whether or not it unlocks. Only
    /// transport/signing failures surface as errors.
    async fn reveal(&self, account: &Address, preimage: u64) -> Result<RevealOutcome>;

    /// The account's full token balance.
    async fn balance_of(&self, account: &Address) -> Result<TokenUnits>;

    /// Token name/symbol/decimals/supply.
    async fn token_metadata(&self) -> Result<TokenMetadata>;

    /// Transfer unlocked tokens. The ledger rejects the call when the
    /// account's window is closed.
    async fn transfer(
        &self,
        account: &Address,
        to: &Address,
        amount: TokenUnits,
    ) -> Result<TxRef>;

    /// The ledger's notion of the current time (epoch seconds).
    ///
    /// Timing guards and countdowns are computed against this clock so the
    /// simulated backend stays in charge of time in tests and demo mode.
    fn now(&self) -> Timestamp;
}
