pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;

pub use blockchain::{ChainReader, EndpointPool, PoolConfig, PoolStats, TransactionValidator};
pub use config::{AppConfig, LoggingConfig, RpcConfig, TokenConfig};
pub use error::{ConfigError, DecodeError, Result, RpcError, ServiceError};
pub use logging::{init_logging, ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use models::{ContractValidation, TransactionDetails, TransferEvent, WalletValidation};
pub use service::ValidatorService;
