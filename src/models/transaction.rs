use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Event log entry as emitted in a transaction receipt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u32,
}

/// A decoded token `Transfer(from, to, value)` event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferEvent {
    /// Contract that emitted the event, lowercase with `0x` prefix
    pub contract: String,
    pub from: String,
    pub to: String,
    pub raw_value: U256,
    pub log_index: u32,
}

/// Structured, trust-checked description of a transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDetails {
    pub hash: String,
    /// Contract the transaction called; absent for native transfers
    pub contract: Option<String>,
    pub from: String,
    pub to: Option<String>,
    /// Human-scaled amount (decimal string)
    pub amount: String,
    /// Unscaled amount in the smallest unit
    pub raw_amount: String,
    pub timestamp: u64,
    pub block_number: u64,
    pub gas_used: u64,
    /// Gas price in the smallest native unit
    pub gas_price: String,
    /// gas_used * gas_price, in native currency units
    pub fee: String,
    pub success: bool,
    pub token_symbol: Option<String>,
    pub token_decimals: Option<u8>,
    pub is_expected_token: bool,
    pub token_mismatch: bool,
    pub expected_token_address: String,
}
