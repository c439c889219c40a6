use chrono::{DateTime, Utc};

/// Mutable health record of one upstream endpoint.
///
/// Health is derived: an endpoint is healthy while its consecutive failure
/// count is below `max_failures`. It is never stored on its own.
#[derive(Debug, Clone)]
pub struct EndpointHealth {
    latency_ms: u64,
    consecutive_failures: u32,
    last_checked_at: Option<DateTime<Utc>>,
    max_failures: u32,
}

impl EndpointHealth {
    pub fn new(max_failures: u32) -> Self {
        Self {
            latency_ms: 0,
            consecutive_failures: 0,
            last_checked_at: None,
            max_failures: max_failures.max(1),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.consecutive_failures < self.max_failures
    }

    pub fn latency_ms(&self) -> u64 {
        self.latency_ms
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn last_checked_at(&self) -> Option<DateTime<Utc>> {
        self.last_checked_at
    }

    /// A call succeeded; `latency_ms` is recorded when it was measured
    pub fn record_success(&mut self, latency_ms: Option<u64>) {
        self.consecutive_failures = 0;
        if let Some(latency) = latency_ms {
            self.latency_ms = latency;
        }
        self.last_checked_at = Some(Utc::now());
    }

    pub fn record_failure(&mut self) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_checked_at = Some(Utc::now());
    }

    /// Forget accumulated failures (total-outage reset)
    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
    }
}
