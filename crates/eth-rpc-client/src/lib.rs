//! eth-rpc-client: JSON-RPC client for EVM nodes
//!
//! This crate provides a thin, typed client over an EVM node's JSON-RPC
//! endpoint: read-only `eth_call`s, receipt polling for submitted
//! transactions, and chain probing for the connection status screen.
//! Signing never happens here; transactions are signed and broadcast by the
//! wallet provider and only watched to confirmation through this client.

pub mod abi;
pub mod probe;

use serde_json::json;
use strongbox_core::{Address, BlockHeight, ChainId, RpcConfig, RpcError, TxRef};

pub use probe::ChainStatus;

/// Default timeout for node API calls (30 seconds).
/// Long enough for slow nodes, short enough to avoid perpetual spinners.
const RPC_REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Interval between receipt polls while waiting for a transaction to mine.
const RECEIPT_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);

/// Result type for RPC client operations
pub type Result<T> = std::result::Result<T, RpcError>;

/// Block parameter for read calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(BlockHeight),
}

impl BlockTag {
    fn to_param(self) -> serde_json::Value {
        match self {
            Self::Latest => json!("latest"),
            Self::Number(n) => json!(format!("0x{:x}", n)),
        }
    }
}

/// A single log entry from a transaction receipt
#[derive(Debug, Clone)]
pub struct EventLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

/// Mined transaction receipt, reduced to the fields Strongbox reads
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub status: bool,
    pub block_number: BlockHeight,
    pub logs: Vec<EventLog>,
}

/// JSON-RPC client for one EVM node endpoint
#[derive(Clone)]
pub struct EthRpcClient {
    http: reqwest::Client,
    url: String,
}

impl EthRpcClient {
    pub fn new(config: &RpcConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: config.url.clone(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Get the node's chain id (eth_chainId)
    pub async fn chain_id(&self) -> Result<ChainId> {
        let result = self.request("eth_chainId", json!([])).await?;
        abi::parse_quantity(result.as_str().ok_or_else(|| {
            RpcError::Parse("eth_chainId returned a non-string".to_string())
        })?)
    }

    /// Get the latest block number (eth_blockNumber)
    pub async fn block_number(&self) -> Result<BlockHeight> {
        let result = self.request("eth_blockNumber", json!([])).await?;
        abi::parse_quantity(result.as_str().ok_or_else(|| {
            RpcError::Parse("eth_blockNumber returned a non-string".to_string())
        })?)
    }

    /// Whether the node is still syncing (eth_syncing)
    pub async fn is_syncing(&self) -> Result<bool> {
        let result = self.request("eth_syncing", json!([])).await?;
        // `false` when synced, a progress object otherwise
        Ok(!matches!(result, serde_json::Value::Bool(false)))
    }

    /// Read-only contract call (eth_call), pinned to `block`.
    ///
    /// Returns the raw return data. Pinning every read of a multi-read
    /// snapshot to one block number is what keeps snapshots tear-free.
    pub async fn call(&self, to: &Address, data: &str, block: BlockTag) -> Result<Vec<u8>> {
        let params = json!([{ "to": to.as_str(), "data": data }, block.to_param()]);
        let result = self.request("eth_call", params).await?;
        let hex_data = result
            .as_str()
            .ok_or_else(|| RpcError::Parse("eth_call returned a non-string".to_string()))?;
        abi::hex_to_bytes(hex_data)
    }

    /// Fetch a receipt if the transaction has mined (eth_getTransactionReceipt)
    pub async fn transaction_receipt(&self, tx: &TxRef) -> Result<Option<TxReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx.as_str()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        parse_receipt(&result).map(Some)
    }

    /// Poll until the transaction mines, up to `timeout`.
    pub async fn wait_for_receipt(
        &self,
        tx: &TxRef,
        timeout: std::time::Duration,
    ) -> Result<TxReceipt> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.transaction_receipt(tx).await? {
                tracing::debug!(tx = %tx, block = receipt.block_number, "transaction mined");
                return Ok(receipt);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(RpcError::Timeout {
                    secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    /// Issue one JSON-RPC request with the standard timeout.
    async fn request(&self, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = tokio::time::timeout(
            RPC_REQUEST_TIMEOUT,
            self.http.post(&self.url).json(&body).send(),
        )
        .await
        .map_err(|_| RpcError::Timeout {
            secs: RPC_REQUEST_TIMEOUT.as_secs(),
        })?
        .map_err(|e| RpcError::Unreachable {
            url: format!("{}: {}", self.url, e),
        })?;

        let envelope: serde_json::Value = response.json().await.map_err(|e| {
            RpcError::Parse(format!("invalid JSON-RPC response: {}", e))
        })?;

        if let Some(err) = envelope.get("error").filter(|e| !e.is_null()) {
            let message = err["message"].as_str().unwrap_or("unknown node error");
            return Err(RpcError::Api {
                message: format!("{} ({})", message, method),
            });
        }

        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| RpcError::Parse(format!("{}: response missing result", method)))
    }
}

/// Parse a JSON receipt into the reduced TxReceipt form
fn parse_receipt(json: &serde_json::Value) -> Result<TxReceipt> {
    let status = json["status"]
        .as_str()
        .map(|s| s == "0x1")
        .ok_or_else(|| RpcError::Parse("receipt missing status".to_string()))?;

    let block_number = abi::parse_quantity(
        json["blockNumber"]
            .as_str()
            .ok_or_else(|| RpcError::Parse("receipt missing blockNumber".to_string()))?,
    )?;

    let logs = json["logs"]
        .as_array()
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    Some(EventLog {
                        address: entry["address"].as_str()?.to_lowercase(),
                        topics: entry["topics"]
                            .as_array()?
                            .iter()
                            .filter_map(|t| t.as_str().map(|s| s.to_lowercase()))
                            .collect(),
                        data: entry["data"].as_str()?.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(TxReceipt {
        status,
        block_number,
        logs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_tag_params() {
        assert_eq!(BlockTag::Latest.to_param(), json!("latest"));
        assert_eq!(BlockTag::Number(0x1234).to_param(), json!("0x1234"));
    }

    #[test]
    fn test_parse_receipt() {
        let raw = json!({
            "status": "0x1",
            "blockNumber": "0xa",
            "logs": [{
                "address": "0xABC0000000000000000000000000000000000001",
                "topics": ["0xDEAD", "0xBEEF"],
                "data": "0x00"
            }]
        });

        let receipt = parse_receipt(&raw).unwrap();
        assert!(receipt.status);
        assert_eq!(receipt.block_number, 10);
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(
            receipt.logs[0].address,
            "0xabc0000000000000000000000000000000000001"
        );
        assert_eq!(receipt.logs[0].topics, vec!["0xdead", "0xbeef"]);
    }

    #[test]
    fn test_parse_receipt_failed_status() {
        let raw = json!({ "status": "0x0", "blockNumber": "0x1", "logs": [] });
        let receipt = parse_receipt(&raw).unwrap();
        assert!(!receipt.status);
        assert!(receipt.logs.is_empty());
    }

    #[test]
    fn test_parse_receipt_missing_fields() {
        let raw = json!({ "logs": [] });
        assert!(parse_receipt(&raw).is_err());
    }
}
