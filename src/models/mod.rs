pub mod transaction;
pub mod validation;

pub use transaction::{RawLog, TransactionDetails, TransferEvent};
pub use validation::{ContractValidation, MatchedTransfer, TokenMetadata, WalletValidation};
