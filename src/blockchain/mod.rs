pub mod chain_reader;
pub mod health;
pub mod pool;
pub mod rpc_client;
pub mod transfer_detector;
pub mod units;
pub mod validator;

pub use chain_reader::{ChainReader, ViewMethod, ViewValue};
pub use health::EndpointHealth;
pub use pool::{EndpointPool, EndpointStats, PoolConfig, PoolStats, ProbeHandle, ProbeResult};
pub use rpc_client::{Block, Receipt, RpcClient, Transaction};
pub use transfer_detector::{
    addresses_equal, canonical_address, decode_all_transfers, decode_transfer, normalize_address,
    validate_address, TRANSFER_EVENT_SIGNATURE,
};
pub use units::{canonical_hex, format_units};
pub use validator::TransactionValidator;
