//! Chain probing
//!
//! Detects whether the configured node is reachable, which chain it serves,
//! and whether it is still syncing.

use serde::{Deserialize, Serialize};
use strongbox_core::{BlockHeight, ChainId};

use crate::EthRpcClient;

/// Probed node status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStatus {
    /// Node is reachable and responding
    pub reachable: bool,

    /// Chain id reported by the node
    pub chain_id: Option<ChainId>,

    /// Latest block height (0 when unreachable)
    pub latest_block: BlockHeight,

    /// Node reports an in-progress sync
    pub syncing: bool,
}

impl ChainStatus {
    /// Whether the node serves the expected chain and is usable for calls.
    pub fn serves(&self, expected: ChainId) -> bool {
        self.reachable && !self.syncing && self.chain_id == Some(expected)
    }
}

/// Probe the node. Never fails; an unreachable node yields an offline status.
pub async fn probe_chain(client: &EthRpcClient) -> ChainStatus {
    let chain_id = match client.chain_id().await {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(url = client.url(), error = %e, "chain probe failed");
            return ChainStatus {
                reachable: false,
                chain_id: None,
                latest_block: 0,
                syncing: false,
            };
        }
    };

    let latest_block = client.block_number().await.unwrap_or(0);
    let syncing = client.is_syncing().await.unwrap_or(false);

    ChainStatus {
        reachable: true,
        chain_id: Some(chain_id),
        latest_block,
        syncing,
    }
}
