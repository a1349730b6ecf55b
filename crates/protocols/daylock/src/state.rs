//! Daylock protocol state types

use serde::{Deserialize, Serialize};
use strongbox_core::{BlockHeight, CommitHash, Timestamp, TokenUnits, TxRef};

use crate::constants::ATTEMPT_COOLDOWN_SECS;

/// One outstanding commit recorded on the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRecord {
    pub hash: CommitHash,
    /// Block the commit was recorded in
    pub block_number: BlockHeight,
}

/// Snapshot of an account's unlock state, read atomically from the ledger.
///
/// Only authoritative fields are stored; everything else (the unlocked
/// flag, the next-attempt gate) is recomputed from them on read so the
/// derived values can never drift from their inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockStatus {
    /// End of the transferability window (epoch seconds); 0 = never unlocked
    pub unlocked_until: Timestamp,
    /// Amount eligible for transfer while unlocked (raw units)
    pub unlocked_amount: TokenUnits,
    /// When the last reveal attempt completed; 0 = never attempted
    pub last_attempt: Timestamp,
    /// Outstanding commit, if any
    pub commit: Option<CommitRecord>,
}

impl UnlockStatus {
    /// Transfers allowed right now. Derived, never stored.
    pub fn is_unlocked(&self, now: Timestamp) -> bool {
        now <= self.unlocked_until && self.unlocked_amount > 0
    }

    /// Earliest time a new reveal attempt is allowed; 0 when never attempted.
    pub fn next_attempt_time(&self) -> Timestamp {
        if self.last_attempt == 0 {
            0
        } else {
            self.last_attempt + ATTEMPT_COOLDOWN_SECS
        }
    }

    /// Whether the attempt cooldown has elapsed.
    pub fn can_attempt(&self, now: Timestamp) -> bool {
        now >= self.next_attempt_time()
    }

    pub fn has_commit(&self) -> bool {
        self.commit.as_ref().is_some_and(|c| !c.hash.is_zero())
    }
}

/// Receipt for a confirmed commit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReceipt {
    pub tx_ref: TxRef,
    pub block_number: BlockHeight,
}

/// Why the ledger rejected a reveal attempt.
///
/// These are protocol outcomes, not errors: the attempt completed on the
/// ledger and was judged by its rules. Codes mirror the contract's
/// `UnlockAttemptFailed` reason byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealFailure {
    /// No commit exists for the account
    NoCommit,
    /// The commit was recorded in the current block; wait one block
    CommitTooFresh,
    /// The revealed preimage does not hash to the stored commit
    HashMismatch,
    /// The commit outlived the blockhash window and must be recreated
    CommitExpired,
    /// Less than 24h since the last reveal attempt
    CooldownActive,
    /// The pseudo-random check failed (the ~4-in-5 case)
    DrawFailed,
}

impl RevealFailure {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NoCommit),
            1 => Some(Self::CommitTooFresh),
            2 => Some(Self::HashMismatch),
            3 => Some(Self::CommitExpired),
            4 => Some(Self::CooldownActive),
            5 => Some(Self::DrawFailed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCommit => "no_commit",
            Self::CommitTooFresh => "commit_too_fresh",
            Self::HashMismatch => "hash_mismatch",
            Self::CommitExpired => "commit_expired",
            Self::CooldownActive => "cooldown_active",
            Self::DrawFailed => "draw_failed",
        }
    }

    /// Human-readable description for display surfaces
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NoCommit => "no commit found for this account",
            Self::CommitTooFresh => "commit is too recent; wait one block",
            Self::HashMismatch => "revealed number does not match the commit",
            Self::CommitExpired => "commit expired; a new commit is required",
            Self::CooldownActive => "an attempt was already made in the last 24h",
            Self::DrawFailed => "the unlock draw failed this time",
        }
    }
}

impl std::fmt::Display for RevealFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// Result of a reveal attempt that completed on the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealOutcome {
    pub unlocked: bool,
    pub tx_ref: TxRef,
    pub failure: Option<RevealFailure>,
}

impl RevealOutcome {
    pub fn success(tx_ref: TxRef) -> Self {
        Self {
            unlocked: true,
            tx_ref,
            failure: None,
        }
    }

    pub fn failed(tx_ref: TxRef, reason: RevealFailure) -> Self {
        Self {
            unlocked: false,
            tx_ref,
            failure: Some(reason),
        }
    }
}

/// Token metadata from the contract's read surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: TokenUnits,
}

/// Mutating operation currently in flight for a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingOp {
    Idle,
    Committing,
    Revealing,
    Transferring,
}

/// The session's position in the commit-reveal cycle, derived on read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnlockPhase {
    NoCommit,
    Committed,
    CooldownNoCommit,
    Unlocked,
    AttemptFailed,
}

impl UnlockPhase {
    /// Derive the phase from the snapshot plus the sticky last-failure flag.
    /// The failure flag wins until dismissed or superseded by a new commit.
    pub fn derive(
        status: &UnlockStatus,
        last_failure: Option<RevealFailure>,
        now: Timestamp,
    ) -> Self {
        if last_failure.is_some() {
            return Self::AttemptFailed;
        }
        if status.is_unlocked(now) {
            return Self::Unlocked;
        }
        if status.has_commit() {
            return Self::Committed;
        }
        if !status.can_attempt(now) {
            return Self::CooldownNoCommit;
        }
        Self::NoCommit
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoCommit => "noCommit",
            Self::Committed => "committed",
            Self::CooldownNoCommit => "cooldown",
            Self::Unlocked => "unlocked",
            Self::AttemptFailed => "attemptFailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strongbox_core::CommitHash;

    fn commit() -> CommitRecord {
        CommitRecord {
            hash: CommitHash::new(format!("0x{}", "ab".repeat(32))),
            block_number: 100,
        }
    }

    #[test]
    fn test_is_unlocked_is_derived() {
        let status = UnlockStatus {
            unlocked_until: 1_000,
            unlocked_amount: 5,
            ..Default::default()
        };
        assert!(status.is_unlocked(999));
        assert!(status.is_unlocked(1_000));
        assert!(!status.is_unlocked(1_001));

        // A window with nothing in it is not an unlock
        let empty = UnlockStatus {
            unlocked_until: 1_000,
            unlocked_amount: 0,
            ..Default::default()
        };
        assert!(!empty.is_unlocked(999));
    }

    #[test]
    fn test_next_attempt_time_never_attempted() {
        let status = UnlockStatus::default();
        assert_eq!(status.next_attempt_time(), 0);
        assert!(status.can_attempt(0));
    }

    #[test]
    fn test_next_attempt_time_after_attempt() {
        let status = UnlockStatus {
            last_attempt: 1_700_000_000,
            ..Default::default()
        };
        assert_eq!(status.next_attempt_time(), 1_700_086_400);
        assert!(!status.can_attempt(1_700_086_399));
        assert!(status.can_attempt(1_700_086_400));
    }

    #[test]
    fn test_zero_hash_commit_is_no_commit() {
        let status = UnlockStatus {
            commit: Some(CommitRecord {
                hash: CommitHash::new(format!("0x{}", "0".repeat(64))),
                block_number: 100,
            }),
            ..Default::default()
        };
        assert!(!status.has_commit());
    }

    #[test]
    fn test_phase_derivation_ordering() {
        let now = 1_700_000_000;

        let idle = UnlockStatus::default();
        assert_eq!(UnlockPhase::derive(&idle, None, now), UnlockPhase::NoCommit);

        let committed = UnlockStatus {
            commit: Some(commit()),
            ..Default::default()
        };
        assert_eq!(
            UnlockPhase::derive(&committed, None, now),
            UnlockPhase::Committed
        );

        let unlocked = UnlockStatus {
            unlocked_until: now + 100,
            unlocked_amount: 1,
            last_attempt: now,
            ..Default::default()
        };
        assert_eq!(
            UnlockPhase::derive(&unlocked, None, now),
            UnlockPhase::Unlocked
        );

        // Window elapsed, cooldown still running
        assert_eq!(
            UnlockPhase::derive(&unlocked, None, now + 200),
            UnlockPhase::CooldownNoCommit
        );

        // Failure flag wins over everything until dismissed
        assert_eq!(
            UnlockPhase::derive(&unlocked, Some(RevealFailure::DrawFailed), now),
            UnlockPhase::AttemptFailed
        );
    }

    #[test]
    fn test_reveal_failure_codes_roundtrip() {
        for code in 0..=5u8 {
            let failure = RevealFailure::from_code(code).unwrap();
            assert!(!failure.as_str().is_empty());
        }
        assert!(RevealFailure::from_code(6).is_none());
    }
}
