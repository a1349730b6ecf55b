//! Simulated ledger for demo mode and tests.
//!
//! Reproduces the contract's state-transition rules in memory: one commit
//! slot per account, the one-block minimum age, the blockhash-window
//! expiry, the 24h attempt cooldown, and the 1-in-5 unlock draw (as an
//! explicit uniform draw from a seedable RNG). Block height is derived
//! from the ledger clock, so tests control block progression by advancing
//! time.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use strongbox_core::{Address, BlockHeight, CommitHash, LedgerError, Timestamp, TokenUnits, TxRef};
use tokio::sync::RwLock;

use crate::constants::{
    ATTEMPT_COOLDOWN_SECS, COMMIT_MAX_AGE_BLOCKS, UNLOCK_ODDS, UNLOCK_WINDOW_SECS,
};
use crate::ledger::{LedgerPort, Result};
use crate::state::{CommitReceipt, CommitRecord, RevealOutcome, RevealFailure, TokenMetadata, UnlockStatus};

/// Simulated block time (seconds per block)
const SIM_BLOCK_SECS: u64 = 2;

/// Height of the simulated chain at the clock's start
const SIM_GENESIS_HEIGHT: BlockHeight = 34_000_000;

/// Fixed artificial confirmation delay for mutating calls
const SIM_CONFIRM_DELAY: std::time::Duration = std::time::Duration::from_millis(250);

/// Starting balance for demo accounts: 1,000 DLK
const SIM_STARTING_BALANCE: TokenUnits = 1_000 * strongbox_core::constants::UNITS_PER_DLK;

/// Fixed epoch for deterministic (seeded) clocks
const SIM_EPOCH: Timestamp = 1_700_000_000;

/// Ledger clock.
///
/// Demo mode advances with wall time; seeded instances are frozen and move
/// only through `advance`, which keeps test timing deterministic.
pub struct SimClock {
    base: Timestamp,
    offset: AtomicU64,
    wall: Option<Instant>,
}

impl SimClock {
    fn wall() -> Self {
        let base = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            base,
            offset: AtomicU64::new(0),
            wall: Some(Instant::now()),
        }
    }

    fn frozen(base: Timestamp) -> Self {
        Self {
            base,
            offset: AtomicU64::new(0),
            wall: None,
        }
    }

    pub fn now(&self) -> Timestamp {
        let elapsed = self.wall.map(|w| w.elapsed().as_secs()).unwrap_or(0);
        self.base + self.offset.load(Ordering::SeqCst) + elapsed
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: u64) {
        self.offset.fetch_add(secs, Ordering::SeqCst);
    }

    fn elapsed(&self) -> u64 {
        self.now() - self.base
    }
}

#[derive(Debug, Clone, Default)]
struct SimAccount {
    funded: bool,
    balance: TokenUnits,
    commit: Option<CommitRecord>,
    unlocked_until: Timestamp,
    unlocked_amount: TokenUnits,
    last_attempt: Timestamp,
}

impl SimAccount {
    fn balance(&self) -> TokenUnits {
        if self.funded {
            self.balance
        } else {
            SIM_STARTING_BALANCE
        }
    }

    fn fund_if_new(&mut self) {
        if !self.funded {
            self.funded = true;
            self.balance = SIM_STARTING_BALANCE;
        }
    }
}

struct SimState {
    rng: StdRng,
    accounts: HashMap<Address, SimAccount>,
    next_tx: u64,
}

/// In-memory ledger with the contract's observable behavior.
pub struct SimLedger {
    state: RwLock<SimState>,
    clock: SimClock,
}

impl SimLedger {
    /// Demo instance: wall clock, entropy-seeded draw.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SimState {
                rng: StdRng::from_entropy(),
                accounts: HashMap::new(),
                next_tx: 1,
            }),
            clock: SimClock::wall(),
        }
    }

    /// Deterministic instance: frozen clock, fixed seed. Identical seeds
    /// yield identical outcome sequences.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: RwLock::new(SimState {
                rng: StdRng::seed_from_u64(seed),
                accounts: HashMap::new(),
                next_tx: 1,
            }),
            clock: SimClock::frozen(SIM_EPOCH),
        }
    }

    pub fn clock(&self) -> &SimClock {
        &self.clock
    }

    /// Current simulated block height, derived from the clock.
    pub fn height(&self) -> BlockHeight {
        SIM_GENESIS_HEIGHT + self.clock.elapsed() / SIM_BLOCK_SECS
    }

    /// The hash `reveal` checks preimages against: sha-256 over the
    /// preimage's 32-byte big-endian representation.
    pub fn hash_preimage(preimage: u64) -> CommitHash {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&preimage.to_be_bytes());
        let digest: [u8; 32] = Sha256::digest(word).into();
        CommitHash::from_bytes(&digest)
    }

    fn next_tx_ref(state: &mut SimState) -> TxRef {
        let n = state.next_tx;
        state.next_tx += 1;
        TxRef::new(format!("0x{:064x}", n))
    }
}

impl Default for SimLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerPort for SimLedger {
    async fn query_unlock_status(&self, account: &Address) -> Result<UnlockStatus> {
        // One read guard = one ledger state; the snapshot cannot tear.
        let state = self.state.read().await;
        let entry = state.accounts.get(account).cloned().unwrap_or_default();
        Ok(UnlockStatus {
            unlocked_until: entry.unlocked_until,
            unlocked_amount: entry.unlocked_amount,
            last_attempt: entry.last_attempt,
            commit: entry.commit,
        })
    }

    async fn commit_hash(&self, preimage: u64) -> Result<CommitHash> {
        Ok(Self::hash_preimage(preimage))
    }

    async fn commit(&self, account: &Address, hash: CommitHash) -> Result<CommitReceipt> {
        tokio::time::sleep(SIM_CONFIRM_DELAY).await;
        let height = self.height();
        let mut state = self.state.write().await;
        let tx_ref = Self::next_tx_ref(&mut state);
        let entry = state.accounts.entry(account.clone()).or_default();
        entry.fund_if_new();
        entry.commit = Some(CommitRecord {
            hash,
            block_number: height,
        });
        tracing::debug!(account = %account, block = height, "sim: commit recorded");
        Ok(CommitReceipt {
            tx_ref,
            block_number: height,
        })
    }

    async fn reveal(&self, account: &Address, preimage: u64) -> Result<RevealOutcome> {
        tokio::time::sleep(SIM_CONFIRM_DELAY).await;
        let now = self.clock.now();
        let height = self.height();
        let mut state = self.state.write().await;
        let tx_ref = Self::next_tx_ref(&mut state);
        let draw = state.rng.gen_range(0..UNLOCK_ODDS);
        let entry = state.accounts.entry(account.clone()).or_default();
        entry.fund_if_new();

        // Judge the attempt in the contract's rule order. The attempt is
        // consumed regardless of outcome: any completed reveal clears the
        // commit slot and starts the cooldown.
        let failure = match entry.commit.clone().filter(|c| !c.hash.is_zero()) {
            None => Some(RevealFailure::NoCommit),
            Some(commit) => {
                if height <= commit.block_number {
                    Some(RevealFailure::CommitTooFresh)
                } else if Self::hash_preimage(preimage) != commit.hash {
                    Some(RevealFailure::HashMismatch)
                } else if height > commit.block_number + COMMIT_MAX_AGE_BLOCKS {
                    Some(RevealFailure::CommitExpired)
                } else if entry.last_attempt != 0
                    && now < entry.last_attempt + ATTEMPT_COOLDOWN_SECS
                {
                    Some(RevealFailure::CooldownActive)
                } else if draw != 0 {
                    Some(RevealFailure::DrawFailed)
                } else {
                    None
                }
            }
        };

        entry.commit = None;
        entry.last_attempt = now;

        match failure {
            Some(reason) => {
                tracing::debug!(account = %account, reason = reason.as_str(), "sim: reveal failed");
                Ok(RevealOutcome::failed(tx_ref, reason))
            }
            None => {
                entry.unlocked_until = now + UNLOCK_WINDOW_SECS;
                entry.unlocked_amount = entry.balance();
                tracing::info!(
                    account = %account,
                    until = entry.unlocked_until,
                    "sim: unlock succeeded"
                );
                Ok(RevealOutcome::success(tx_ref))
            }
        }
    }

    async fn balance_of(&self, account: &Address) -> Result<TokenUnits> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .get(account)
            .map(SimAccount::balance)
            .unwrap_or(SIM_STARTING_BALANCE))
    }

    async fn token_metadata(&self) -> Result<TokenMetadata> {
        Ok(TokenMetadata {
            name: "Daylock".to_string(),
            symbol: "DLK".to_string(),
            decimals: 18,
            total_supply: 21_000_000 * strongbox_core::constants::UNITS_PER_DLK,
        })
    }

    async fn transfer(
        &self,
        account: &Address,
        to: &Address,
        amount: TokenUnits,
    ) -> Result<TxRef> {
        tokio::time::sleep(SIM_CONFIRM_DELAY).await;
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let tx_ref = Self::next_tx_ref(&mut state);

        let entry = state.accounts.entry(account.clone()).or_default();
        entry.fund_if_new();
        let snapshot = UnlockStatus {
            unlocked_until: entry.unlocked_until,
            unlocked_amount: entry.unlocked_amount,
            last_attempt: entry.last_attempt,
            commit: entry.commit.clone(),
        };
        if !snapshot.is_unlocked(now) {
            return Err(LedgerError::Transport {
                message: "transfer reverted: transfers are locked for this account".to_string(),
            });
        }
        if amount > entry.unlocked_amount {
            return Err(LedgerError::Transport {
                message: "transfer reverted: amount exceeds the unlocked allowance".to_string(),
            });
        }
        if amount > entry.balance {
            return Err(LedgerError::Transport {
                message: "transfer reverted: insufficient balance".to_string(),
            });
        }
        entry.balance -= amount;
        entry.unlocked_amount -= amount;

        let recipient = state.accounts.entry(to.clone()).or_default();
        recipient.fund_if_new();
        recipient.balance += amount;

        tracing::debug!(from = %account, to = %to, amount, "sim: transfer applied");
        Ok(tx_ref)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Address {
        Address::new("0x00000000000000000000000000000000000000a1")
    }

    /// Advance far enough that the next mutation lands in a later block.
    fn mine(sim: &SimLedger) {
        sim.clock().advance(SIM_BLOCK_SECS);
    }

    #[tokio::test]
    async fn test_reveal_without_commit_consumes_attempt() {
        let sim = SimLedger::with_seed(7);
        let now = sim.now();

        let outcome = sim.reveal(&account(), 42).await.unwrap();
        assert!(!outcome.unlocked);
        assert_eq!(outcome.failure, Some(RevealFailure::NoCommit));

        let status = sim.query_unlock_status(&account()).await.unwrap();
        assert!(!status.has_commit());
        assert_eq!(status.next_attempt_time(), now + ATTEMPT_COOLDOWN_SECS);
    }

    #[tokio::test]
    async fn test_reveal_in_commit_block_is_too_fresh() {
        let sim = SimLedger::with_seed(7);
        let hash = sim.commit_hash(42).await.unwrap();
        sim.commit(&account(), hash).await.unwrap();

        // No block has been mined since the commit
        let outcome = sim.reveal(&account(), 42).await.unwrap();
        assert_eq!(outcome.failure, Some(RevealFailure::CommitTooFresh));
    }

    #[tokio::test]
    async fn test_mismatched_preimage_fails_and_clears_commit() {
        let sim = SimLedger::with_seed(7);
        let hash = sim.commit_hash(7).await.unwrap();
        sim.commit(&account(), hash).await.unwrap();
        mine(&sim);

        let outcome = sim.reveal(&account(), 8).await.unwrap();
        assert_eq!(outcome.failure, Some(RevealFailure::HashMismatch));

        let status = sim.query_unlock_status(&account()).await.unwrap();
        assert!(!status.has_commit());
        assert!(status.last_attempt > 0);
    }

    #[tokio::test]
    async fn test_expired_commit_rejected() {
        let sim = SimLedger::with_seed(7);
        let hash = sim.commit_hash(42).await.unwrap();
        sim.commit(&account(), hash).await.unwrap();
        sim.clock()
            .advance((COMMIT_MAX_AGE_BLOCKS + 1) * SIM_BLOCK_SECS);

        let outcome = sim.reveal(&account(), 42).await.unwrap();
        assert_eq!(outcome.failure, Some(RevealFailure::CommitExpired));
    }

    #[tokio::test]
    async fn test_cooldown_blocks_second_attempt() {
        let sim = SimLedger::with_seed(7);

        // Burn one attempt (no commit)
        sim.reveal(&account(), 1).await.unwrap();

        let hash = sim.commit_hash(42).await.unwrap();
        sim.commit(&account(), hash).await.unwrap();
        mine(&sim);

        let outcome = sim.reveal(&account(), 42).await.unwrap();
        assert_eq!(outcome.failure, Some(RevealFailure::CooldownActive));
    }

    #[tokio::test]
    async fn test_successful_unlock_opens_full_window() {
        // Find a seed whose first draw succeeds; the draw is 1-in-5 so a
        // handful of seeds is plenty.
        for seed in 0..100 {
            let sim = SimLedger::with_seed(seed);
            let hash = sim.commit_hash(42).await.unwrap();
            sim.commit(&account(), hash).await.unwrap();
            mine(&sim);

            let now = sim.now();
            let outcome = sim.reveal(&account(), 42).await.unwrap();
            if !outcome.unlocked {
                assert_eq!(outcome.failure, Some(RevealFailure::DrawFailed));
                continue;
            }

            let status = sim.query_unlock_status(&account()).await.unwrap();
            assert_eq!(status.unlocked_until, now + UNLOCK_WINDOW_SECS);
            assert_eq!(status.unlocked_amount, SIM_STARTING_BALANCE);
            assert!(!status.has_commit());
            assert!(status.is_unlocked(sim.now()));
            return;
        }
        panic!("no successful draw in 100 seeds");
    }

    #[tokio::test]
    async fn test_seeded_outcomes_are_reproducible() {
        let mut first_run = Vec::new();
        for run in 0..2 {
            let sim = SimLedger::with_seed(99);
            let mut outcomes = Vec::new();
            for preimage in 0..10u64 {
                // Clear the cooldown first; a commit ages one block per 2s,
                // so it must come after the 24h jump, not before.
                sim.clock().advance(ATTEMPT_COOLDOWN_SECS);
                let hash = sim.commit_hash(preimage).await.unwrap();
                sim.commit(&account(), hash).await.unwrap();
                mine(&sim);
                let outcome = sim.reveal(&account(), preimage).await.unwrap();
                assert_ne!(outcome.failure, Some(RevealFailure::CooldownActive));
                assert_ne!(outcome.failure, Some(RevealFailure::CommitExpired));
                outcomes.push(outcome.unlocked);
            }
            if run == 0 {
                first_run = outcomes;
            } else {
                assert_eq!(first_run, outcomes);
            }
        }
    }

    #[tokio::test]
    async fn test_draw_success_rate_near_one_in_five() {
        let sim = SimLedger::with_seed(1234);
        let mut successes = 0u32;
        const ATTEMPTS: u32 = 50;
        for preimage in 0..ATTEMPTS as u64 {
            sim.clock().advance(ATTEMPT_COOLDOWN_SECS);
            let hash = sim.commit_hash(preimage).await.unwrap();
            sim.commit(&account(), hash).await.unwrap();
            mine(&sim);
            let outcome = sim.reveal(&account(), preimage).await.unwrap();
            assert!(outcome.unlocked || outcome.failure == Some(RevealFailure::DrawFailed));
            if outcome.unlocked {
                successes += 1;
            }
        }
        // p = 0.2; these bounds hold for any plausible draw sequence and
        // the seed makes the exact count stable anyway.
        assert!(
            (2..=25).contains(&successes),
            "success count {} outside expected band",
            successes
        );
    }

    #[tokio::test]
    async fn test_snapshot_is_stable_without_mutation() {
        let sim = SimLedger::with_seed(7);
        let hash = sim.commit_hash(5).await.unwrap();
        sim.commit(&account(), hash).await.unwrap();

        let a = sim.query_unlock_status(&account()).await.unwrap();
        let b = sim.query_unlock_status(&account()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_transfer_requires_open_window() {
        let sim = SimLedger::with_seed(7);
        let to = Address::new("0x00000000000000000000000000000000000000b2");

        let err = sim.transfer(&account(), &to, 1).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_transfer_moves_unlocked_balance() {
        for seed in 0..100 {
            let sim = SimLedger::with_seed(seed);
            let hash = sim.commit_hash(42).await.unwrap();
            sim.commit(&account(), hash).await.unwrap();
            mine(&sim);
            if !sim.reveal(&account(), 42).await.unwrap().unlocked {
                continue;
            }

            let to = Address::new("0x00000000000000000000000000000000000000b2");
            let amount = 5 * strongbox_core::constants::UNITS_PER_DLK;
            sim.transfer(&account(), &to, amount).await.unwrap();

            assert_eq!(
                sim.balance_of(&account()).await.unwrap(),
                SIM_STARTING_BALANCE - amount
            );
            assert_eq!(
                sim.balance_of(&to).await.unwrap(),
                SIM_STARTING_BALANCE + amount
            );
            return;
        }
        panic!("no successful draw in 100 seeds");
    }
}
