use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::blockchain::pool::PoolConfig;
use crate::blockchain::transfer_detector::validate_address;
use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub token: TokenConfig,
    pub logging: LoggingConfig,
}

/// Upstream endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URLs in priority order
    pub endpoints: Vec<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Default number of endpoints tried per call
    pub max_attempts: u32,
    /// Consecutive failures before an endpoint is marked unhealthy
    pub max_failures: u32,
    /// Interval between background health probes
    pub health_check_interval_seconds: u64,
}

/// Token and native-currency configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Token contract transfers are validated against
    pub expected_address: String,
    pub native_symbol: String,
    pub native_decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://polygon-rpc.com/".to_string(),
                "https://polygon-bor-rpc.publicnode.com".to_string(),
                "https://rpc.ankr.com/polygon".to_string(),
            ],
            timeout_seconds: 30,
            max_attempts: 3,
            max_failures: 3,
            health_check_interval_seconds: 30,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            // USDT on Polygon PoS
            expected_address: "0xc2132d05d31c914a87c6611c10748aeb04b58e8f".to_string(),
            native_symbol: "POL".to_string(),
            native_decimals: 18,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the TOML file named by `CONFIG_FILE`
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoints) = env::var("RPC_ENDPOINTS") {
            self.rpc.endpoints = endpoints
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
        }
        if let Some(timeout) = parse_env("RPC_TIMEOUT_SECONDS")? {
            self.rpc.timeout_seconds = timeout;
        }
        if let Some(attempts) = parse_env("RPC_MAX_ATTEMPTS")? {
            self.rpc.max_attempts = attempts;
        }
        if let Some(failures) = parse_env("RPC_MAX_FAILURES")? {
            self.rpc.max_failures = failures;
        }
        if let Some(interval) = parse_env("HEALTH_CHECK_INTERVAL_SECONDS")? {
            self.rpc.health_check_interval_seconds = interval;
        }

        if let Ok(address) = env::var("EXPECTED_TOKEN_ADDRESS") {
            self.token.expected_address = address;
        }
        if let Ok(symbol) = env::var("NATIVE_SYMBOL") {
            self.token.native_symbol = symbol;
        }
        if let Some(decimals) = parse_env("NATIVE_DECIMALS")? {
            self.token.native_decimals = decimals;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc.endpoints.is_empty() {
            return Err(ConfigError::MissingValue("rpc.endpoints".to_string()));
        }
        for endpoint in &self.rpc.endpoints {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(ConfigError::InvalidUrl(endpoint.clone()));
            }
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(invalid("rpc.timeout_seconds", self.rpc.timeout_seconds));
        }
        if self.rpc.max_attempts == 0 || self.rpc.max_attempts > 20 {
            return Err(invalid("rpc.max_attempts", self.rpc.max_attempts));
        }
        if self.rpc.max_failures == 0 {
            return Err(invalid("rpc.max_failures", self.rpc.max_failures));
        }
        if self.rpc.health_check_interval_seconds == 0 {
            return Err(invalid(
                "rpc.health_check_interval_seconds",
                self.rpc.health_check_interval_seconds,
            ));
        }

        if validate_address(&self.token.expected_address).is_err()
            || !self.token.expected_address.starts_with("0x")
        {
            return Err(invalid("token.expected_address", &self.token.expected_address));
        }
        if self.token.native_symbol.trim().is_empty() {
            return Err(ConfigError::MissingValue("token.native_symbol".to_string()));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid("logging.level", &self.logging.level));
        }
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid("logging.format", &self.logging.format));
        }

        Ok(())
    }

    /// Pool settings derived from the RPC section
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            endpoints: self.rpc.endpoints.clone(),
            max_failures: self.rpc.max_failures,
            max_attempts: self.rpc.max_attempts as usize,
            probe_interval: Duration::from_secs(self.rpc.health_check_interval_seconds),
            request_timeout: Duration::from_secs(self.rpc.timeout_seconds),
        }
    }

    pub fn generate_sample_config() -> Result<String, ConfigError> {
        toml::to_string_pretty(&Self::default()).map_err(|e| ConfigError::Parsing(e.to_string()))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
