//! Configuration types for Strongbox

use serde::{Deserialize, Serialize};

/// Which ledger backend the app drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Simulated in-memory ledger; no network, no funds required
    Demo,
    /// Live contract over JSON-RPC
    Live,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Demo => "demo",
            Self::Live => "live",
        }
    }
}

/// EVM node connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint (e.g., "https://mainnet.base.org")
    pub url: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "https://mainnet.base.org".to_string(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Node connection settings
    pub rpc: RpcConfig,

    /// Ledger backend selection
    #[serde(default = "default_mode")]
    pub mode: BackendMode,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_mode() -> BackendMode {
    BackendMode::Demo
}

fn default_api_port() -> u16 {
    19710
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            mode: default_mode(),
            api_port: default_api_port(),
        }
    }
}
