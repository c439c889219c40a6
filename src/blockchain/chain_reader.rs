use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::U256;
use serde_json::json;
use std::sync::Arc;

use crate::blockchain::pool::EndpointPool;
use crate::blockchain::rpc_client::{Block, Receipt, Transaction};
use crate::blockchain::units::strip_hex_prefix;
use crate::error::{Result, ServiceError};
use crate::logging::LogContext;
use crate::models::TokenMetadata;

/// Read-only token methods this crate knows how to call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMethod {
    Symbol,
    Decimals,
}

impl ViewMethod {
    /// 4-byte ABI selector, hex encoded
    pub fn selector(&self) -> &'static str {
        match self {
            ViewMethod::Symbol => "0x95d89b41",
            ViewMethod::Decimals => "0x313ce567",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViewMethod::Symbol => "symbol",
            ViewMethod::Decimals => "decimals",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewValue {
    Text(String),
    Uint(U256),
}

/// Chain primitives, each executed through the endpoint pool
#[derive(Clone)]
pub struct ChainReader {
    pool: Arc<EndpointPool>,
    max_attempts: usize,
}

impl ChainReader {
    pub fn new(pool: Arc<EndpointPool>) -> Self {
        let max_attempts = pool.default_attempts();
        Self { pool, max_attempts }
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    pub async fn transaction(&self, hash: &str) -> Result<Option<Transaction>> {
        self.pool
            .execute_with_retry("eth_getTransactionByHash", self.max_attempts, |client| async move {
                client.get_transaction(hash).await
            })
            .await
    }

    pub async fn receipt(&self, hash: &str) -> Result<Option<Receipt>> {
        self.pool
            .execute_with_retry("eth_getTransactionReceipt", self.max_attempts, |client| async move {
                client.get_receipt(hash).await
            })
            .await
    }

    pub async fn block(&self, number: u64) -> Result<Option<Block>> {
        self.pool
            .execute_with_retry("eth_getBlockByNumber", self.max_attempts, |client| async move {
                client.get_block(number).await
            })
            .await
    }

    pub async fn block_number(&self) -> Result<u64> {
        self.block_number_with_attempts(self.max_attempts).await
    }

    pub async fn block_number_with_attempts(&self, max_attempts: usize) -> Result<u64> {
        self.pool
            .execute_with_retry("eth_blockNumber", max_attempts, |client| async move {
                client.block_number().await
            })
            .await
    }

    /// Raw `eth_call` output for arbitrary calldata
    pub async fn call_raw(&self, address: &str, data: &str) -> Result<String> {
        self.pool
            .execute_with_retry("eth_call", self.max_attempts, |client| async move {
                client.call(address, data).await
            })
            .await
    }

    /// Call a token view method and decode its ABI return value.
    ///
    /// Decoding happens after the pooled call succeeded, so a contract that
    /// does not implement the method never counts against endpoint health.
    pub async fn call_view(&self, address: &str, method: ViewMethod) -> Result<ViewValue> {
        let output = self.call_raw(address, method.selector()).await?;

        let unavailable = |reason: String| ServiceError::MetadataUnavailable {
            address: address.to_string(),
            reason: format!("{}(): {}", method.name(), reason),
        };

        let bytes = hex::decode(strip_hex_prefix(output.trim())).map_err(|e| unavailable(e.to_string()))?;
        if bytes.is_empty() {
            return Err(unavailable("empty call result".to_string()));
        }

        match method {
            ViewMethod::Symbol => decode_abi_string(&bytes).map(ViewValue::Text).map_err(unavailable),
            ViewMethod::Decimals => decode_abi_uint(&bytes).map(ViewValue::Uint).map_err(unavailable),
        }
    }

    pub async fn token_symbol(&self, address: &str) -> Result<String> {
        match self.call_view(address, ViewMethod::Symbol).await? {
            ViewValue::Text(symbol) => Ok(symbol),
            ViewValue::Uint(_) => Err(ServiceError::MetadataUnavailable {
                address: address.to_string(),
                reason: "symbol() returned a number".to_string(),
            }),
        }
    }

    pub async fn token_decimals(&self, address: &str) -> Result<u8> {
        let value = match self.call_view(address, ViewMethod::Decimals).await? {
            ViewValue::Uint(value) => value,
            ViewValue::Text(_) => {
                return Err(ServiceError::MetadataUnavailable {
                    address: address.to_string(),
                    reason: "decimals() returned text".to_string(),
                })
            }
        };

        if value > U256::from(u8::MAX) {
            return Err(ServiceError::MetadataUnavailable {
                address: address.to_string(),
                reason: format!("decimals() out of range: {}", value),
            });
        }
        Ok(value.as_limbs()[0] as u8)
    }

    /// Symbol and decimals, fetched concurrently. Failure of either is
    /// reported as `MetadataUnavailable`.
    pub async fn token_metadata(&self, address: &str) -> Result<TokenMetadata> {
        let (symbol, decimals) = tokio::join!(self.token_symbol(address), self.token_decimals(address));

        match (symbol, decimals) {
            (Ok(symbol), Ok(decimals)) => Ok(TokenMetadata {
                address: address.to_lowercase(),
                symbol,
                decimals,
            }),
            (Err(e), _) | (_, Err(e)) => {
                LogContext::new("chain_reader", "token_metadata")
                    .with_address(address)
                    .with_metadata("error", json!(e.to_string()))
                    .debug("Token metadata unavailable");
                Err(match e {
                    ServiceError::MetadataUnavailable { .. } => e,
                    other => ServiceError::MetadataUnavailable {
                        address: address.to_string(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }
}

/// Decode an ABI `string` return value, accepting the legacy `bytes32` form
pub fn decode_abi_string(bytes: &[u8]) -> std::result::Result<String, String> {
    let error = match DynSolType::String.abi_decode(bytes) {
        Ok(DynSolValue::String(value)) => return Ok(value),
        Ok(other) => format!("unexpected string value {:?}", other),
        Err(e) => e.to_string(),
    };

    // Older tokens return the symbol as a zero-padded bytes32
    if bytes.len() != 32 {
        return Err(error);
    }
    match DynSolType::FixedBytes(32).abi_decode(bytes) {
        Ok(DynSolValue::FixedBytes(word, _)) => {
            let raw = word.as_slice();
            let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
            String::from_utf8(raw[..end].to_vec()).map_err(|e| e.to_string())
        }
        Ok(other) => Err(format!("unexpected bytes32 value {:?}", other)),
        Err(e) => Err(e.to_string()),
    }
}

/// Decode an ABI `uint8` return value
pub fn decode_abi_uint(bytes: &[u8]) -> std::result::Result<U256, String> {
    match DynSolType::Uint(8).abi_decode(bytes) {
        Ok(DynSolValue::Uint(value, _)) => Ok(value),
        Ok(other) => Err(format!("unexpected uint value {:?}", other)),
        Err(e) => Err(e.to_string()),
    }
}
