//! Wallet boundary types

use serde::{Deserialize, Serialize};
use strongbox_core::{Address, ChainId, TokenUnits};

/// Chain parameters for the switch-or-add flow (EIP-3085 shape)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainParams {
    pub chain_id: ChainId,
    pub chain_name: String,
    pub rpc_url: String,
    pub currency_symbol: String,
    pub explorer_url: String,
}

/// An unsigned transaction handed to the wallet for signing and broadcast
#[derive(Debug, Clone)]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    /// 0x-prefixed calldata
    pub data: String,
    /// Native value attached; always 0 for Strongbox calls
    pub value: TokenUnits,
}

/// Notifications pushed by the wallet provider
#[derive(Debug, Clone)]
pub enum WalletEvent {
    /// The account list changed; empty means the wallet disconnected
    AccountsChanged(Vec<Address>),
    /// The wallet switched to another chain
    ChainChanged(ChainId),
}
