//! Core type definitions for Strongbox

use serde::{Deserialize, Serialize};
use std::fmt;

/// EVM account address (20 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address, normalizing to lowercase hex.
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check basic format: 0x prefix followed by 40 hex characters.
    pub fn is_well_formed(&self) -> bool {
        self.0.len() == 42
            && self.0.starts_with("0x")
            && self.0[2..].chars().all(|c| c.is_ascii_hexdigit())
    }

    pub fn is_zero(&self) -> bool {
        self.0 == "0x0000000000000000000000000000000000000000"
    }

    /// The 20 raw address bytes, if well-formed.
    pub fn to_bytes(&self) -> Option<[u8; 20]> {
        let raw = hex::decode(self.0.strip_prefix("0x")?).ok()?;
        raw.try_into().ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction reference (32-byte hash, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxRef(pub String);

impl TxRef {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Commit hash recorded on the ledger (32 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommitHash(String);

impl CommitHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into().to_lowercase())
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An all-zero hash marks an empty commit slot on the ledger.
    pub fn is_zero(&self) -> bool {
        self.0
            .strip_prefix("0x")
            .is_some_and(|h| h.chars().all(|c| c == '0'))
    }
}

impl fmt::Display for CommitHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Chain identifier (EIP-155)
pub type ChainId = u64;

/// Block height
pub type BlockHeight = u64;

/// Epoch seconds
pub type Timestamp = u64;

/// Raw token units (the token has 18 decimals)
pub type TokenUnits = u128;

/// Constants
pub mod constants {
    use super::TokenUnits;

    /// 1 DLK in raw units
    pub const UNITS_PER_DLK: TokenUnits = 1_000_000_000_000_000_000;

    /// Seconds in a day; both the attempt cooldown and the unlock window
    pub const SECONDS_PER_DAY: u64 = 86_400;
}

/// Format raw units as a decimal token amount (18 decimals, trailing zeros trimmed).
pub fn format_units(amount: TokenUnits) -> String {
    let whole = amount / constants::UNITS_PER_DLK;
    let frac = amount % constants::UNITS_PER_DLK;
    if frac == 0 {
        return whole.to_string();
    }
    let frac = format!("{:018}", frac);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
