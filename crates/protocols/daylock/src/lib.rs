//! Daylock commit-reveal unlock protocol
//!
//! Daylock tokens are transfer-locked by default. A holder earns a 24h
//! transferability window by committing a hashed secret number, waiting at
//! least one block, and revealing it; roughly one reveal in five passes the
//! contract's pseudo-random check, and attempts are limited to one per 24h.
//! This crate owns the client-side protocol core: the ledger capability
//! with its live and simulated backends, the per-account session state
//! machine, and the account lifecycle wiring.

pub mod constants;
pub mod context;
pub mod eth;
pub mod ledger;
pub mod session;
pub mod sim;
pub mod state;

pub use context::AccountContext;
pub use eth::EthLedger;
pub use ledger::LedgerPort;
pub use session::{SessionStatus, UnlockSession};
pub use sim::SimLedger;
pub use state::{
    CommitReceipt, CommitRecord, PendingOp, RevealFailure, RevealOutcome, TokenMetadata,
    UnlockPhase, UnlockStatus,
};
