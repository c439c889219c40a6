use thiserror::Error;

/// Main error type for the transfer validation service
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    /// Every retry candidate failed; carries the last underlying failure
    #[error("All endpoints unavailable after {attempts} attempt(s): {last_error}")]
    EndpointUnavailable { attempts: usize, last_error: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Token metadata unavailable for {address}: {reason}")]
    MetadataUnavailable { address: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{stage} failed: {source}")]
    Stage {
        stage: &'static str,
        #[source]
        source: Box<ServiceError>,
    },
}

/// Failures of a single JSON-RPC endpoint
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i64, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("HTTP status {status}")]
    Status { status: u16 },
}

/// Transfer-event log decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Transfer event expects {expected} topics, got {got}")]
    TopicCount { expected: usize, got: usize },

    #[error("Invalid topic: {0}")]
    InvalidTopic(String),

    #[error("Log data is empty")]
    EmptyData,

    #[error("Invalid log data: {0}")]
    InvalidData(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required value: {0}")]
    MissingValue(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl ServiceError {
    /// Wrap an error with the name of the pipeline stage that produced it.
    /// `NotFound` passes through untouched so callers can still map it.
    pub fn in_stage(self, stage: &'static str) -> Self {
        match self {
            ServiceError::NotFound(_) | ServiceError::Stage { .. } => self,
            other => ServiceError::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ServiceError::NotFound(_) => true,
            ServiceError::Stage { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ServiceError::Config(_) => ErrorSeverity::Critical,
            ServiceError::EndpointUnavailable { .. } => ErrorSeverity::High,
            ServiceError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,
            ServiceError::Rpc(_) => ErrorSeverity::Medium,
            ServiceError::Decode(_) => ErrorSeverity::Medium,
            ServiceError::MetadataUnavailable { .. } => ErrorSeverity::Low,
            ServiceError::NotFound(_) => ErrorSeverity::Low,
            ServiceError::Stage { source, .. } => source.severity(),
        }
    }
}

impl RpcError {
    /// Classify a transport error the way the HTTP client reports it
    pub fn from_transport(error: reqwest::Error, timeout_seconds: u64) -> Self {
        if error.is_timeout() {
            RpcError::Timeout {
                seconds: timeout_seconds,
            }
        } else if error.is_connect() {
            RpcError::Connection(error.to_string())
        } else {
            RpcError::Http(error)
        }
    }
}
