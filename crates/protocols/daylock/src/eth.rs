//! Live ledger bound to the deployed Daylock contract.
//!
//! Reads are `eth_call`s against the node; writes go through the wallet
//! provider for signing and broadcast, then wait on the receipt. The
//! contract consumes a reveal attempt regardless of its outcome, so the
//! outcome is read from the receipt's events rather than from reverts.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use eth_rpc_client::{abi, BlockTag, EthRpcClient, TxReceipt};
use strongbox_core::{Address, CommitHash, LedgerError, Timestamp, TokenUnits, TxRef};
use wallet_bridge::{TxRequest, WalletProvider};

use crate::constants::{
    DAYLOCK_CONTRACT, RECEIPT_TIMEOUT_SECS, SEL_BALANCE_OF, SEL_COMMITS, SEL_COMMIT_HASH,
    SEL_COMMIT_UNLOCK, SEL_DECIMALS, SEL_LAST_ATTEMPT, SEL_NAME, SEL_REVEAL_AND_UNLOCK,
    SEL_SYMBOL, SEL_TOTAL_SUPPLY, SEL_TRANSFER, SEL_UNLOCKED_AMOUNT, SEL_UNLOCKED_UNTIL,
    TOPIC_ATTEMPT_FAILED, TOPIC_UNLOCKED,
};
use crate::ledger::{LedgerPort, Result};
use crate::state::{
    CommitReceipt, CommitRecord, RevealFailure, RevealOutcome, TokenMetadata, UnlockStatus,
};

/// LedgerPort implementation over the deployed contract
pub struct EthLedger {
    rpc: EthRpcClient,
    wallet: Arc<dyn WalletProvider>,
    contract: Address,
}

impl EthLedger {
    pub fn new(rpc: EthRpcClient, wallet: Arc<dyn WalletProvider>) -> Self {
        Self {
            rpc,
            wallet,
            contract: Address::new(DAYLOCK_CONTRACT),
        }
    }

    /// Read call against the contract at a pinned block.
    async fn read(&self, data: String, block: BlockTag) -> Result<Vec<u8>> {
        Ok(self.rpc.call(&self.contract, &data, block).await?)
    }

    /// Sign, broadcast, and wait for the transaction to mine.
    async fn submit(&self, account: &Address, data: String) -> Result<(TxRef, TxReceipt)> {
        let tx = TxRequest {
            from: account.clone(),
            to: self.contract.clone(),
            data,
            value: 0,
        };
        let tx_ref = self.wallet.sign_and_send(tx).await?;
        tracing::debug!(tx = %tx_ref, "transaction broadcast, waiting for receipt");
        let receipt = self
            .rpc
            .wait_for_receipt(&tx_ref, Duration::from_secs(RECEIPT_TIMEOUT_SECS))
            .await?;
        Ok((tx_ref, receipt))
    }

    fn account_word(account: &Address) -> Result<abi::Word> {
        let bytes = account.to_bytes().ok_or_else(|| LedgerError::Transport {
            message: format!("malformed account address {}", account),
        })?;
        Ok(abi::word_from_address(bytes))
    }
}

/// u64 at head word `index` of return data
fn u64_at(data: &[u8], index: usize) -> Result<u64> {
    Ok(abi::u64_from_word(&abi::word_at(data, index)?)?)
}

/// u128 at head word `index` of return data
fn u128_at(data: &[u8], index: usize) -> Result<u128> {
    Ok(abi::u128_from_word(&abi::word_at(data, index)?)?)
}

/// Classify a mined reveal by the events it emitted.
///
/// `Unlocked` means the draw succeeded; `UnlockAttemptFailed` carries the
/// protocol reason. A reverted or event-less receipt means the attempt
/// never completed under protocol rules, which is a transport failure.
fn outcome_from_receipt(
    contract: &Address,
    tx_ref: TxRef,
    receipt: &TxReceipt,
) -> Result<RevealOutcome> {
    if !receipt.status {
        return Err(LedgerError::Transport {
            message: format!("reveal transaction {} reverted", tx_ref),
        });
    }

    for log in &receipt.logs {
        if log.address != contract.as_str() {
            continue;
        }
        let Some(topic0) = log.topics.first() else {
            continue;
        };
        if topic0 == TOPIC_UNLOCKED {
            return Ok(RevealOutcome::success(tx_ref));
        }
        if topic0 == TOPIC_ATTEMPT_FAILED {
            let data = abi::hex_to_bytes(&log.data)?;
            let code = u64_at(&data, 0)?;
            let reason = RevealFailure::from_code(code as u8).ok_or_else(|| {
                LedgerError::Transport {
                    message: format!("unknown reveal failure code {}", code),
                }
            })?;
            return Ok(RevealOutcome::failed(tx_ref, reason));
        }
    }

    Err(LedgerError::Transport {
        message: format!("reveal transaction {} carried no outcome event", tx_ref),
    })
}

#[async_trait]
impl LedgerPort for EthLedger {
    async fn query_unlock_status(&self, account: &Address) -> Result<UnlockStatus> {
        let who = Self::account_word(account)?;

        // Pin all four reads to one block so the snapshot cannot mix two
        // ledger states.
        let block = BlockTag::Number(self.rpc.block_number().await?);

        let data = self
            .read(abi::calldata(SEL_UNLOCKED_UNTIL, &[who]), block)
            .await?;
        let unlocked_until = u64_at(&data, 0)?;

        let data = self
            .read(abi::calldata(SEL_UNLOCKED_AMOUNT, &[who]), block)
            .await?;
        let unlocked_amount = u128_at(&data, 0)?;

        let data = self
            .read(abi::calldata(SEL_LAST_ATTEMPT, &[who]), block)
            .await?;
        let last_attempt = u64_at(&data, 0)?;

        let data = self.read(abi::calldata(SEL_COMMITS, &[who]), block).await?;
        let hash = CommitHash::from_bytes(&abi::word_at(&data, 0)?);
        let commit_block = u64_at(&data, 1)?;
        let commit = (!hash.is_zero()).then_some(CommitRecord {
            hash,
            block_number: commit_block,
        });

        Ok(UnlockStatus {
            unlocked_until,
            unlocked_amount,
            last_attempt,
            commit,
        })
    }

    async fn commit_hash(&self, preimage: u64) -> Result<CommitHash> {
        let data = self
            .read(
                abi::calldata(SEL_COMMIT_HASH, &[abi::word_from_u64(preimage)]),
                BlockTag::Latest,
            )
            .await?;
        Ok(CommitHash::from_bytes(&abi::word_at(&data, 0)?))
    }

    async fn commit(&self, account: &Address, hash: CommitHash) -> Result<CommitReceipt> {
        let raw = abi::hex_to_bytes(hash.as_str())?;
        let word: abi::Word = raw.try_into().map_err(|_| LedgerError::Transport {
            message: "commit hash is not 32 bytes".to_string(),
        })?;

        let (tx_ref, receipt) = self
            .submit(account, abi::calldata(SEL_COMMIT_UNLOCK, &[word]))
            .await?;
        if !receipt.status {
            return Err(LedgerError::Transport {
                message: format!("commit transaction {} reverted", tx_ref),
            });
        }
        tracing::info!(account = %account, block = receipt.block_number, "commit confirmed");
        Ok(CommitReceipt {
            tx_ref,
            block_number: receipt.block_number,
        })
    }

    async fn reveal(&self, account: &Address, preimage: u64) -> Result<RevealOutcome> {
        let (tx_ref, receipt) = self
            .submit(
                account,
                abi::calldata(SEL_REVEAL_AND_UNLOCK, &[abi::word_from_u64(preimage)]),
            )
            .await?;
        outcome_from_receipt(&self.contract, tx_ref, &receipt)
    }

    async fn balance_of(&self, account: &Address) -> Result<TokenUnits> {
        let who = Self::account_word(account)?;
        let data = self
            .read(abi::calldata(SEL_BALANCE_OF, &[who]), BlockTag::Latest)
            .await?;
        u128_at(&data, 0)
    }

    async fn token_metadata(&self) -> Result<TokenMetadata> {
        let name_data = self
            .read(abi::calldata(SEL_NAME, &[]), BlockTag::Latest)
            .await?;
        let name = abi::string_from_return(&name_data)?;

        let symbol_data = self
            .read(abi::calldata(SEL_SYMBOL, &[]), BlockTag::Latest)
            .await?;
        let symbol = abi::string_from_return(&symbol_data)?;

        let decimals_data = self
            .read(abi::calldata(SEL_DECIMALS, &[]), BlockTag::Latest)
            .await?;
        let decimals = u64_at(&decimals_data, 0)? as u8;

        let supply_data = self
            .read(abi::calldata(SEL_TOTAL_SUPPLY, &[]), BlockTag::Latest)
            .await?;
        let total_supply = u128_at(&supply_data, 0)?;

        Ok(TokenMetadata {
            name,
            symbol,
            decimals,
            total_supply,
        })
    }

    async fn transfer(
        &self,
        account: &Address,
        to: &Address,
        amount: TokenUnits,
    ) -> Result<TxRef> {
        let to_word = Self::account_word(to)?;
        let (tx_ref, receipt) = self
            .submit(
                account,
                abi::calldata(SEL_TRANSFER, &[to_word, abi::word_from_u128(amount)]),
            )
            .await?;
        if !receipt.status {
            return Err(LedgerError::Transport {
                message: format!(
                    "transfer transaction {} reverted (window closed or balance short)",
                    tx_ref
                ),
            });
        }
        Ok(tx_ref)
    }

    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eth_rpc_client::EventLog;

    fn contract() -> Address {
        Address::new(DAYLOCK_CONTRACT)
    }

    fn receipt_with(logs: Vec<EventLog>) -> TxReceipt {
        TxReceipt {
            status: true,
            block_number: 1,
            logs,
        }
    }

    fn failure_data(code: u8) -> String {
        let mut word = [0u8; 32];
        word[31] = code;
        format!("0x{}", hex::encode(word))
    }

    #[test]
    fn test_unlocked_event_is_success() {
        let receipt = receipt_with(vec![EventLog {
            address: DAYLOCK_CONTRACT.to_string(),
            topics: vec![TOPIC_UNLOCKED.to_string()],
            data: "0x".to_string(),
        }]);
        let outcome = outcome_from_receipt(&contract(), TxRef::new("0x01"), &receipt).unwrap();
        assert!(outcome.unlocked);
        assert!(outcome.failure.is_none());
    }

    #[test]
    fn test_failure_event_maps_reason_codes() {
        for (code, expected) in [
            (0u8, RevealFailure::NoCommit),
            (2, RevealFailure::HashMismatch),
            (5, RevealFailure::DrawFailed),
        ] {
            let receipt = receipt_with(vec![EventLog {
                address: DAYLOCK_CONTRACT.to_string(),
                topics: vec![TOPIC_ATTEMPT_FAILED.to_string()],
                data: failure_data(code),
            }]);
            let outcome =
                outcome_from_receipt(&contract(), TxRef::new("0x01"), &receipt).unwrap();
            assert!(!outcome.unlocked);
            assert_eq!(outcome.failure, Some(expected));
        }
    }

    #[test]
    fn test_foreign_logs_are_ignored() {
        let receipt = receipt_with(vec![
            EventLog {
                address: "0x00000000000000000000000000000000000000ee".to_string(),
                topics: vec![TOPIC_UNLOCKED.to_string()],
                data: "0x".to_string(),
            },
            EventLog {
                address: DAYLOCK_CONTRACT.to_string(),
                topics: vec![TOPIC_ATTEMPT_FAILED.to_string()],
                data: failure_data(5),
            },
        ]);
        let outcome = outcome_from_receipt(&contract(), TxRef::new("0x01"), &receipt).unwrap();
        assert_eq!(outcome.failure, Some(RevealFailure::DrawFailed));
    }

    #[test]
    fn test_reverted_receipt_is_transport_error() {
        let receipt = TxReceipt {
            status: false,
            block_number: 1,
            logs: vec![],
        };
        let err = outcome_from_receipt(&contract(), TxRef::new("0x01"), &receipt).unwrap_err();
        assert!(matches!(err, LedgerError::Transport { .. }));
    }

    #[test]
    fn test_eventless_receipt_is_transport_error() {
        let receipt = receipt_with(vec![]);
        let err = outcome_from_receipt(&contract(), TxRef::new("0x01"), &receipt).unwrap_err();
        assert!(matches!(err, LedgerError::Transport { .. }));
    }

    #[test]
    fn test_unknown_reason_code_is_transport_error() {
        let receipt = receipt_with(vec![EventLog {
            address: DAYLOCK_CONTRACT.to_string(),
            topics: vec![TOPIC_ATTEMPT_FAILED.to_string()],
            data: failure_data(9),
        }]);
        let err = outcome_from_receipt(&contract(), TxRef::new("0x01"), &receipt).unwrap_err();
        assert!(matches!(err, LedgerError::Transport { .. }));
    }
}
