use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    pub address: String,
    pub symbol: String,
    pub decimals: u8,
}

/// Answer to "is this contract the expected token?"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractValidation {
    pub is_valid: bool,
    pub is_expected_token: bool,
    pub token_mismatch: bool,
    pub details: Option<TokenMetadata>,
}

/// Transfer event selected as the delivery to the target wallet
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchedTransfer {
    pub contract: String,
    pub from: String,
    pub to: String,
    pub raw_value: String,
    /// Scaled by the emitting contract's decimals when they resolve
    pub amount: Option<String>,
    pub log_index: u32,
}

/// Answer to "did this wallet receive the expected token in this transaction?"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletValidation {
    pub transaction_hash: String,
    pub target_wallet: String,
    pub received_in_target_wallet: bool,
    /// The matched event was emitted by the expected token contract
    pub is_token_transfer: bool,
    /// The transaction's destination is the expected token contract
    pub contract_matches: bool,
    pub is_valid: bool,
    pub matched_transfer: Option<MatchedTransfer>,
    /// Number of decoded transfer events crediting the wallet
    pub matching_events: usize,
    pub expected_token_address: String,
}
