use alloy_primitives::U256;
use serde_json::json;

use crate::blockchain::chain_reader::ChainReader;
use crate::blockchain::pool::PoolStats;
use crate::blockchain::rpc_client::{Receipt, Transaction};
use crate::blockchain::transfer_detector::{addresses_equal, canonical_address, decode_all_transfers};
use crate::blockchain::units::{canonical_hex, format_units};
use crate::config::TokenConfig;
use crate::error::{Result, ServiceError};
use crate::logging::{ErrorLogger, LogContext, PerformanceMonitor};
use crate::models::{
    ContractValidation, MatchedTransfer, TransactionDetails, TransferEvent, WalletValidation,
};

/// Turns transaction hashes into trust-checked transfer descriptions
pub struct TransactionValidator {
    reader: ChainReader,
    expected_token: String,
    native_symbol: String,
    native_decimals: u8,
}

impl TransactionValidator {
    pub fn new(reader: ChainReader, token: &TokenConfig) -> Self {
        Self {
            reader,
            expected_token: canonical_address(&token.expected_address),
            native_symbol: token.native_symbol.clone(),
            native_decimals: token.native_decimals,
        }
    }

    pub fn reader(&self) -> &ChainReader {
        &self.reader
    }

    pub fn expected_token_address(&self) -> &str {
        &self.expected_token
    }

    pub fn pool_stats(&self) -> PoolStats {
        self.reader.pool().stats()
    }

    /// Full description of a mined transaction.
    ///
    /// Fails with `NotFound` when the transaction, its receipt, or its block
    /// is absent. Other failures carry the name of the stage that failed.
    pub async fn get_details(&self, hash: &str) -> Result<TransactionDetails> {
        let monitor = PerformanceMonitor::new("get_details").with_metadata("hash", json!(hash));

        let result = self.assemble_details(hash).await;
        monitor.finish_with_result(&result);

        if let Err(e) = &result {
            if !e.is_not_found() {
                ErrorLogger::log_error(
                    e,
                    Some(LogContext::new("validator", "get_details").with_transaction_hash(hash)),
                );
            }
        }
        result
    }

    async fn assemble_details(&self, hash: &str) -> Result<TransactionDetails> {
        let (transaction, receipt) = self.fetch_mined(hash).await?;

        let block = self
            .reader
            .block(receipt.block_number)
            .await
            .map_err(|e| e.in_stage("fetch block"))?
            .ok_or_else(|| ServiceError::NotFound(format!("block {}", receipt.block_number)))?;

        let gas_price = receipt
            .effective_gas_price
            .or(transaction.gas_price)
            .unwrap_or(U256::ZERO);
        let fee = U256::from(receipt.gas_used).saturating_mul(gas_price);

        let mut details = TransactionDetails {
            hash: canonical_hex(&transaction.hash),
            contract: None,
            from: canonical_address(&transaction.from),
            to: transaction.to.as_deref().map(canonical_address),
            amount: format_units(transaction.value, self.native_decimals),
            raw_amount: transaction.value.to_string(),
            timestamp: block.timestamp,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            gas_price: gas_price.to_string(),
            fee: format_units(fee, self.native_decimals),
            success: receipt.success,
            token_symbol: Some(self.native_symbol.clone()),
            token_decimals: Some(self.native_decimals),
            is_expected_token: false,
            token_mismatch: true,
            expected_token_address: self.expected_token.clone(),
        };

        let contract = match transaction.to.as_deref() {
            Some(to) if transaction.has_payload() => canonical_address(to),
            // Plain value transfer or contract creation
            _ => return Ok(details),
        };

        // Metadata is best effort; a missing symbol must not fail the lookup
        let (symbol, decimals) = tokio::join!(
            self.reader.token_symbol(&contract),
            self.reader.token_decimals(&contract)
        );
        let symbol = symbol.map_err(|e| self.log_metadata_gap(&contract, &e)).ok();
        let decimals = decimals.map_err(|e| self.log_metadata_gap(&contract, &e)).ok();

        let is_expected_token = addresses_equal(&contract, &self.expected_token);
        details.contract = Some(contract);
        details.token_symbol = symbol;
        details.token_decimals = decimals;
        details.is_expected_token = is_expected_token;
        details.token_mismatch = !is_expected_token;

        if let Some(event) = decode_all_transfers(&receipt.logs).into_iter().next() {
            details.from = event.from;
            details.to = Some(event.to);
            details.raw_amount = event.raw_value.to_string();
            details.amount = match decimals {
                Some(decimals) => format_units(event.raw_value, decimals),
                None => event.raw_value.to_string(),
            };
        }

        Ok(details)
    }

    /// Transaction and receipt, fetched concurrently
    async fn fetch_mined(&self, hash: &str) -> Result<(Transaction, Receipt)> {
        let (transaction, receipt) = tokio::join!(self.reader.transaction(hash), self.reader.receipt(hash));

        let transaction = transaction
            .map_err(|e| e.in_stage("fetch transaction"))?
            .ok_or_else(|| ServiceError::NotFound(format!("transaction {}", hash)))?;
        let receipt = receipt
            .map_err(|e| e.in_stage("fetch receipt"))?
            .ok_or_else(|| ServiceError::NotFound(format!("receipt for {}", hash)))?;

        Ok((transaction, receipt))
    }

    fn log_metadata_gap(&self, contract: &str, error: &ServiceError) {
        LogContext::new("validator", "token_metadata")
            .with_address(contract)
            .with_metadata("error", json!(error.to_string()))
            .warn("Token metadata query failed");
    }

    /// Whether `address` is the expected token. Metadata failures are
    /// reported as "not valid" instead of an error; use `get_details` when the
    /// difference matters.
    pub async fn contract_is_expected_token(&self, address: &str) -> ContractValidation {
        let is_expected_token = addresses_equal(address, &self.expected_token);

        match self.reader.token_metadata(address).await {
            Ok(metadata) => ContractValidation {
                is_valid: is_expected_token,
                is_expected_token,
                token_mismatch: !is_expected_token,
                details: Some(metadata),
            },
            Err(e) => {
                LogContext::new("validator", "contract_is_expected_token")
                    .with_address(address)
                    .with_metadata("error", json!(e.to_string()))
                    .warn("Could not confirm token contract");
                ContractValidation {
                    is_valid: false,
                    is_expected_token: false,
                    token_mismatch: true,
                    details: None,
                }
            }
        }
    }

    /// Lookup failures and absence both read as `false`
    pub async fn exists(&self, hash: &str) -> bool {
        match self.reader.transaction(hash).await {
            Ok(found) => found.is_some(),
            Err(e) => {
                LogContext::new("validator", "exists")
                    .with_transaction_hash(hash)
                    .with_metadata("error", json!(e.to_string()))
                    .debug("Transaction lookup failed");
                false
            }
        }
    }

    pub async fn current_block_number(&self) -> Result<u64> {
        self.reader.block_number().await
    }

    /// True when any endpoint in the pool answers a head-block query
    pub async fn is_connected(&self) -> bool {
        let attempts = self.reader.pool().len();
        self.reader.block_number_with_attempts(attempts).await.is_ok()
    }

    /// Whether `wallet` received the expected token in transaction `hash`.
    ///
    /// Every transfer event in the receipt is considered. See
    /// [`select_wallet_transfer`] for which event is reported when several
    /// credit the wallet.
    pub async fn validate_for_target_wallet(&self, hash: &str, wallet: &str) -> Result<WalletValidation> {
        let (transaction, receipt) = self.fetch_mined(hash).await?;

        let events = decode_all_transfers(&receipt.logs);
        let (matched, matching_events) = select_wallet_transfer(&events, wallet, &self.expected_token);

        let contract_matches = transaction
            .to
            .as_deref()
            .map(|to| addresses_equal(to, &self.expected_token))
            .unwrap_or(false);
        let is_token_transfer = matched
            .map(|event| addresses_equal(&event.contract, &self.expected_token))
            .unwrap_or(false);
        let received_in_target_wallet = matched.is_some();

        let matched_transfer = match matched {
            Some(event) => {
                let decimals = self
                    .reader
                    .token_decimals(&event.contract)
                    .await
                    .map_err(|e| self.log_metadata_gap(&event.contract, &e))
                    .ok();
                Some(MatchedTransfer {
                    contract: event.contract.clone(),
                    from: event.from.clone(),
                    to: event.to.clone(),
                    raw_value: event.raw_value.to_string(),
                    amount: decimals.map(|d| format_units(event.raw_value, d)),
                    log_index: event.log_index,
                })
            }
            None => None,
        };

        let validation = WalletValidation {
            transaction_hash: canonical_hex(&transaction.hash),
            target_wallet: canonical_address(wallet),
            received_in_target_wallet,
            is_token_transfer,
            contract_matches,
            is_valid: received_in_target_wallet && is_token_transfer && contract_matches,
            matched_transfer,
            matching_events,
            expected_token_address: self.expected_token.clone(),
        };

        LogContext::new("validator", "validate_for_target_wallet")
            .with_transaction_hash(hash)
            .with_address(wallet)
            .with_metadata("is_valid", json!(validation.is_valid))
            .with_metadata("matching_events", json!(matching_events))
            .info("Wallet validation completed");

        Ok(validation)
    }
}

/// Pick the event reported as the delivery to `wallet`.
///
/// Among events whose receiver is `wallet`, the first one emitted by the
/// expected token wins; otherwise the first receiver match regardless of
/// contract. Also returns how many events credit the wallet.
pub fn select_wallet_transfer<'a>(
    events: &'a [TransferEvent],
    wallet: &str,
    expected_token: &str,
) -> (Option<&'a TransferEvent>, usize) {
    let received: Vec<&TransferEvent> = events
        .iter()
        .filter(|event| addresses_equal(&event.to, wallet))
        .collect();

    let chosen = received
        .iter()
        .find(|event| addresses_equal(&event.contract, expected_token))
        .or_else(|| received.first())
        .copied();

    (chosen, received.len())
}
