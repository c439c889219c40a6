use log::{debug, error, info, trace, warn};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use crate::config::LoggingConfig;
use crate::error::{ErrorSeverity, ServiceError};

/// Structured logging context emitting one JSON object per line
pub struct LogContext {
    pub component: String,
    pub operation: String,
    pub metadata: HashMap<String, Value>,
}

impl LogContext {
    pub fn new(component: &str, operation: &str) -> Self {
        Self {
            component: component.to_string(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn with_transaction_hash(self, tx_hash: &str) -> Self {
        self.with_metadata("transaction_hash", json!(tx_hash))
    }

    pub fn with_address(self, address: &str) -> Self {
        self.with_metadata("address", json!(address))
    }

    pub fn with_endpoint(self, endpoint: &str) -> Self {
        self.with_metadata("endpoint", json!(endpoint))
    }

    pub fn with_duration_ms(self, duration_ms: u64) -> Self {
        self.with_metadata("duration_ms", json!(duration_ms))
    }

    pub fn with_attempt(self, attempt: usize) -> Self {
        self.with_metadata("attempt", json!(attempt))
    }

    fn format_message(&self, level: &str, message: &str) -> String {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut log_entry = json!({
            "timestamp": timestamp,
            "level": level,
            "component": self.component,
            "operation": self.operation,
            "message": message,
        });

        for (key, value) in &self.metadata {
            log_entry[key] = value.clone();
        }

        log_entry.to_string()
    }

    pub fn info(&self, message: &str) {
        info!("{}", self.format_message("INFO", message));
    }

    pub fn warn(&self, message: &str) {
        warn!("{}", self.format_message("WARN", message));
    }

    pub fn error(&self, message: &str) {
        error!("{}", self.format_message("ERROR", message));
    }

    pub fn debug(&self, message: &str) {
        debug!("{}", self.format_message("DEBUG", message));
    }

    pub fn trace(&self, message: &str) {
        trace!("{}", self.format_message("TRACE", message));
    }
}

/// Wall-clock timer for a single operation
pub struct PerformanceMonitor {
    start: Instant,
    operation: String,
    metadata: HashMap<String, Value>,
}

impl PerformanceMonitor {
    pub fn new(operation: &str) -> Self {
        Self {
            start: Instant::now(),
            operation: operation.to_string(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn finish_with_result<T, E>(self, result: &Result<T, E>) -> u64
    where
        E: std::fmt::Display,
    {
        let duration = self.elapsed_ms();

        let mut context = LogContext::new("performance", &self.operation).with_duration_ms(duration);
        for (key, value) in self.metadata {
            context = context.with_metadata(&key, value);
        }

        match result {
            Ok(_) => context.trace(&format!("Operation completed in {}ms", duration)),
            Err(e) => {
                context = context.with_metadata("error", json!(e.to_string()));
                context.debug(&format!("Operation failed after {}ms: {}", duration, e));
            }
        }

        duration
    }
}

pub struct ErrorLogger;

impl ErrorLogger {
    pub fn log_error(error: &ServiceError, context: Option<LogContext>) {
        let severity = error.severity();

        let log_context = context
            .unwrap_or_else(|| LogContext::new("error", "unknown"))
            .with_metadata("severity", json!(format!("{:?}", severity)))
            .with_metadata("not_found", json!(error.is_not_found()));

        let message = format!("Error occurred: {}", error);

        match severity {
            ErrorSeverity::Critical | ErrorSeverity::High => log_context.error(&message),
            ErrorSeverity::Medium => log_context.warn(&message),
            ErrorSeverity::Low => log_context.info(&message),
        }
    }
}

pub struct MetricsLogger;

impl MetricsLogger {
    pub fn log_rpc_call(method: &str, endpoint: &str, duration_ms: u64, success: bool) {
        let context = LogContext::new("metrics", "rpc_call")
            .with_metadata("method", json!(method))
            .with_endpoint(endpoint)
            .with_duration_ms(duration_ms)
            .with_metadata("success", json!(success));

        if success {
            context.debug(&format!("RPC call {} completed in {}ms", method, duration_ms));
        } else {
            context.warn(&format!("RPC call {} failed after {}ms", method, duration_ms));
        }
    }

    pub fn log_probe_cycle(total: usize, healthy: usize, duration_ms: u64) {
        let context = LogContext::new("metrics", "probe_cycle")
            .with_metadata("total_endpoints", json!(total))
            .with_metadata("healthy_endpoints", json!(healthy))
            .with_duration_ms(duration_ms);

        if healthy == 0 {
            context.warn(&format!("Health probe finished: no healthy endpoints out of {}", total));
        } else {
            context.info(&format!(
                "Health probe finished: {}/{} endpoints healthy",
                healthy, total
            ));
        }
    }

    pub fn log_failover(operation: &str, endpoint: &str, attempt: usize, max_attempts: usize, error: &str) {
        let context = LogContext::new("metrics", "failover")
            .with_metadata("rpc_operation", json!(operation))
            .with_endpoint(endpoint)
            .with_attempt(attempt)
            .with_metadata("max_attempts", json!(max_attempts))
            .with_metadata("error", json!(error));

        if attempt >= max_attempts {
            context.error(&format!("Final attempt {} of {} failed: {}", attempt, max_attempts, error));
        } else {
            context.warn(&format!(
                "Attempt {} of {} failed, failing over: {}",
                attempt, max_attempts, error
            ));
        }
    }
}

/// Initialize the `log` backend from the logging configuration
pub fn init_logging(config: &LoggingConfig) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::new();
    builder.parse_filters(&config.level);

    if config.format == "pretty" {
        builder.format(|buf, record| {
            use std::io::Write;

            // Structured lines are re-indented, plain lines get a timestamp prefix
            if let Ok(json_value) = serde_json::from_str::<Value>(record.args().to_string().as_str()) {
                writeln!(buf, "{}", serde_json::to_string_pretty(&json_value)?)
            } else {
                writeln!(
                    buf,
                    "{} [{}] {}: {}",
                    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            }
        });
    } else {
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "{}", record.args())
        });
    }

    builder.try_init()?;
    info!("Structured logging initialized");
    Ok(())
}
