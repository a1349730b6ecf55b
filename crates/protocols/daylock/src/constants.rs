//! Daylock contract constants
//!
//! The contract is fixed and deployed; everything the client needs to talk
//! to it is hardcoded here. Selectors are the first four bytes of the
//! keccak-256 of each canonical signature; topics are the full hash.

use strongbox_core::ChainId;
use wallet_bridge::ChainParams;

/// Deployed Daylock token contract
pub const DAYLOCK_CONTRACT: &str = "0x5ec7c57a0fa2f421dbeaf7ebbcbd6e86e1f0b7a3";

/// The one chain the contract lives on (Base mainnet)
pub const REQUIRED_CHAIN_ID: ChainId = 8453;

/// Minimum interval between reveal attempts (seconds)
pub const ATTEMPT_COOLDOWN_SECS: u64 = 86_400;

/// Transferability window opened by a successful reveal (seconds)
pub const UNLOCK_WINDOW_SECS: u64 = 86_400;

/// Commits older than this many blocks are unusable and must be recreated.
/// Matches the contract's blockhash window.
pub const COMMIT_MAX_AGE_BLOCKS: u64 = 256;

/// One reveal in this many succeeds the pseudo-random check
pub const UNLOCK_ODDS: u32 = 5;

/// How often an active session re-queries the ledger (seconds)
pub const POLL_INTERVAL_SECS: u64 = 30;

/// How long to wait for a submitted transaction to mine
pub const RECEIPT_TIMEOUT_SECS: u64 = 180;

// ─── Function selectors ──────────────────────────────────────────────────────

/// name()
pub const SEL_NAME: [u8; 4] = [0x06, 0xfd, 0xde, 0x03];
/// symbol()
pub const SEL_SYMBOL: [u8; 4] = [0x95, 0xd8, 0x9b, 0x41];
/// decimals()
pub const SEL_DECIMALS: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];
/// totalSupply()
pub const SEL_TOTAL_SUPPLY: [u8; 4] = [0x18, 0x16, 0x0d, 0xdd];
/// balanceOf(address)
pub const SEL_BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// transfer(address,uint256)
pub const SEL_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// commits(address) -> (bytes32 hash, uint256 blockNumber)
pub const SEL_COMMITS: [u8; 4] = [0x7b, 0x43, 0xa8, 0xe6];
/// snapshotUnlockedUntil(address) -> uint256
pub const SEL_UNLOCKED_UNTIL: [u8; 4] = [0x1e, 0xc7, 0x11, 0x1b];
/// unlockedTokenAmount(address) -> uint256
pub const SEL_UNLOCKED_AMOUNT: [u8; 4] = [0x9f, 0x12, 0x3a, 0x19];
/// snapshotLastUnlockAttempt(address) -> uint256
pub const SEL_LAST_ATTEMPT: [u8; 4] = [0x19, 0x48, 0x88, 0xe8];
/// commitHash(uint256) -> bytes32
pub const SEL_COMMIT_HASH: [u8; 4] = [0xae, 0x53, 0x36, 0x0a];
/// commitUnlock(bytes32)
pub const SEL_COMMIT_UNLOCK: [u8; 4] = [0xc3, 0x83, 0xf4, 0x02];
/// revealAndUnlock(uint256)
pub const SEL_REVEAL_AND_UNLOCK: [u8; 4] = [0x74, 0x9c, 0x50, 0xb2];

// ─── Event topics ────────────────────────────────────────────────────────────

/// Unlocked(address,uint256,uint256): account, amount, unlockedUntil
pub const TOPIC_UNLOCKED: &str =
    "0x3f2f29fa02cc34566ac167b446be0be9e0254cac18eda93b2dfe6a7a7c8affb9";

/// UnlockAttemptFailed(address,uint8): account, reason code
pub const TOPIC_ATTEMPT_FAILED: &str =
    "0xbd1c29569a99042d3e20cb2ffe008879a665b5aaaaa3131ad966267a79e88f11";

/// Chain parameters handed to the wallet's switch-or-add flow
pub fn required_chain_params() -> ChainParams {
    ChainParams {
        chain_id: REQUIRED_CHAIN_ID,
        chain_name: "Base".to_string(),
        rpc_url: "https://mainnet.base.org".to_string(),
        currency_symbol: "ETH".to_string(),
        explorer_url: "https://basescan.org".to_string(),
    }
}
