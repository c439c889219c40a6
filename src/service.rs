//! Explicitly owned service handle: one pool, one validator, one probe task.

use std::sync::Arc;

use crate::blockchain::{ChainReader, EndpointPool, TransactionValidator};
use crate::config::AppConfig;
use crate::error::Result;
use crate::logging::LogContext;
use serde_json::json;

pub struct ValidatorService {
    pool: Arc<EndpointPool>,
    validator: TransactionValidator,
}

impl ValidatorService {
    /// Build the pool and validator without background probing
    pub fn new(config: &AppConfig) -> Result<Self> {
        config.validate()?;

        let pool = Arc::new(EndpointPool::new(config.pool_config())?);
        let reader = ChainReader::new(Arc::clone(&pool));
        let validator = TransactionValidator::new(reader, &config.token);

        LogContext::new("service", "initialization")
            .with_metadata("endpoints", json!(pool.len()))
            .with_metadata("expected_token", json!(validator.expected_token_address()))
            .info("Validator service created");

        Ok(Self { pool, validator })
    }

    /// Build the service and start probing endpoint health on the configured
    /// interval. Must be called from within a tokio runtime.
    pub fn start(config: &AppConfig) -> Result<Self> {
        let service = Self::new(config)?;
        service.pool.start_background_probing(service.pool.probe_interval());
        Ok(service)
    }

    pub fn validator(&self) -> &TransactionValidator {
        &self.validator
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    /// Stop background probing; safe to call more than once
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl Drop for ValidatorService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
