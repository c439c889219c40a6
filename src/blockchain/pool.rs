//! Health-tracked pool of JSON-RPC endpoints with immediate failover.
//!
//! Every read goes through [`EndpointPool::execute_with_retry`], which walks the
//! healthy endpoints fastest-first and moves to the next one on any failure.
//! A background task probes every endpoint concurrently to refresh latency and
//! reachability.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::json;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::AbortHandle;
use tokio::time::MissedTickBehavior;

use crate::blockchain::health::EndpointHealth;
use crate::blockchain::rpc_client::RpcClient;
use crate::error::{ConfigError, RpcError, ServiceError};
use crate::logging::{LogContext, MetricsLogger};

#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub endpoints: Vec<String>,
    pub max_failures: u32,
    pub max_attempts: usize,
    pub probe_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            max_failures: 3,
            max_attempts: 3,
            probe_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self {
            endpoints,
            ..Default::default()
        }
    }
}

/// One upstream provider and its health record
pub struct Endpoint {
    url: String,
    client: RpcClient,
    health: Mutex<EndpointHealth>,
}

impl Endpoint {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_healthy(&self) -> bool {
        self.health.lock().is_healthy()
    }

    pub fn latency_ms(&self) -> u64 {
        self.health.lock().latency_ms()
    }

    fn record_success(&self, latency_ms: Option<u64>) {
        self.health.lock().record_success(latency_ms);
    }

    fn record_failure(&self) {
        self.health.lock().record_failure();
    }

    fn snapshot(&self) -> EndpointStats {
        let health = self.health.lock();
        EndpointStats {
            url: self.url.clone(),
            healthy: health.is_healthy(),
            latency_ms: health.latency_ms(),
            failure_count: health.consecutive_failures(),
            last_checked_at: health.last_checked_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EndpointStats {
    pub url: String,
    pub healthy: bool,
    pub latency_ms: u64,
    pub failure_count: u32,
    pub last_checked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PoolStats {
    pub total: usize,
    pub healthy: usize,
    pub endpoints: Vec<EndpointStats>,
}

/// Outcome of probing a single endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub endpoint: String,
    pub success: bool,
    pub latency_ms: u64,
    pub block_number: Option<u64>,
    pub error: Option<String>,
}

/// Cancellation handle for the background probe task
#[derive(Clone)]
pub struct ProbeHandle {
    shutdown: Arc<Notify>,
    abort: AbortHandle,
}

impl ProbeHandle {
    pub fn cancel(&self) {
        self.shutdown.notify_one();
        self.abort.abort();
    }
}

pub struct EndpointPool {
    endpoints: Vec<Arc<Endpoint>>,
    default_attempts: usize,
    probe_interval: Duration,
    probe_task: Mutex<Option<ProbeHandle>>,
}

impl EndpointPool {
    /// Build the pool. Repeated addresses collapse into a single endpoint.
    pub fn new(config: PoolConfig) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(RpcError::from)?;

        let mut seen = HashSet::new();
        let mut endpoints = Vec::with_capacity(config.endpoints.len());
        for url in &config.endpoints {
            let url = url.trim();
            if url.is_empty() {
                continue;
            }
            if !seen.insert(endpoint_key(url)) {
                LogContext::new("endpoint_pool", "initialization")
                    .with_endpoint(url)
                    .warn("Ignoring duplicate endpoint");
                continue;
            }

            endpoints.push(Arc::new(Endpoint {
                url: url.to_string(),
                client: RpcClient::with_client(http.clone(), url.to_string(), config.request_timeout),
                health: Mutex::new(EndpointHealth::new(config.max_failures)),
            }));
        }

        if endpoints.is_empty() {
            return Err(ConfigError::MissingValue("rpc.endpoints".to_string()).into());
        }

        LogContext::new("endpoint_pool", "initialization")
            .with_metadata("endpoint_count", json!(endpoints.len()))
            .with_metadata("max_failures", json!(config.max_failures))
            .info("Endpoint pool created");

        Ok(Self {
            endpoints,
            default_attempts: config.max_attempts.max(1),
            probe_interval: config.probe_interval,
            probe_task: Mutex::new(None),
        })
    }

    pub fn endpoints(&self) -> &[Arc<Endpoint>] {
        &self.endpoints
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn default_attempts(&self) -> usize {
        self.default_attempts
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    /// Lowest-latency healthy endpoint.
    ///
    /// When nothing is healthy every endpoint is reset to healthy and the
    /// first configured one is returned: a total outage is treated as a stale
    /// health model rather than an unreachable network.
    pub fn select_best(&self) -> Arc<Endpoint> {
        let best = self
            .endpoints
            .iter()
            .filter(|endpoint| endpoint.is_healthy())
            .min_by_key(|endpoint| endpoint.latency_ms());

        if let Some(endpoint) = best {
            return Arc::clone(endpoint);
        }

        LogContext::new("endpoint_pool", "select_best")
            .with_metadata("endpoint_count", json!(self.endpoints.len()))
            .warn("No healthy endpoints, resetting health of all endpoints");
        for endpoint in &self.endpoints {
            endpoint.health.lock().reset();
        }
        Arc::clone(&self.endpoints[0])
    }

    /// Healthy endpoints fastest-first, or the first `max_attempts` configured
    /// endpoints in order when none are healthy
    fn retry_candidates(&self, max_attempts: usize) -> Vec<Arc<Endpoint>> {
        let mut healthy: Vec<(u64, Arc<Endpoint>)> = self
            .endpoints
            .iter()
            .filter_map(|endpoint| {
                let health = endpoint.health.lock();
                health
                    .is_healthy()
                    .then(|| (health.latency_ms(), Arc::clone(endpoint)))
            })
            .collect();

        if healthy.is_empty() {
            return self.endpoints.iter().take(max_attempts).cloned().collect();
        }

        healthy.sort_by_key(|(latency, _)| *latency);
        healthy.into_iter().map(|(_, endpoint)| endpoint).collect()
    }

    /// Run `operation` against up to `max_attempts` endpoints, stopping at the
    /// first success. Attempts are immediate; there is no backoff between them.
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        operation_name: &str,
        max_attempts: usize,
        operation: F,
    ) -> Result<T, ServiceError>
    where
        F: Fn(RpcClient) -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let max_attempts = max_attempts.max(1);
        let candidates = self.retry_candidates(max_attempts);
        let attempts = candidates.len().min(max_attempts);
        let mut last_error: Option<String> = None;

        for (index, endpoint) in candidates.into_iter().take(attempts).enumerate() {
            let attempt = index + 1;

            match operation(endpoint.client.clone()).await {
                Ok(value) => {
                    endpoint.record_success(None);
                    if attempt > 1 {
                        LogContext::new("endpoint_pool", operation_name)
                            .with_endpoint(&endpoint.url)
                            .with_attempt(attempt)
                            .info("Operation recovered on fallback endpoint");
                    }
                    return Ok(value);
                }
                Err(error) => {
                    endpoint.record_failure();
                    let reason = error.to_string();
                    MetricsLogger::log_failover(operation_name, &endpoint.url, attempt, attempts, &reason);
                    last_error = Some(format!("{}: {}", endpoint.url, reason));
                }
            }
        }

        Err(ServiceError::EndpointUnavailable {
            attempts,
            last_error: last_error.unwrap_or_else(|| "no endpoint candidates".to_string()),
        })
    }

    /// Probe every endpoint concurrently with a head-block query
    pub async fn probe_all(&self) -> Vec<ProbeResult> {
        let started = Instant::now();

        let probes = self.endpoints.iter().map(|endpoint| async move {
            let probe_start = Instant::now();
            let result = endpoint.client.block_number().await;
            let latency_ms = probe_start.elapsed().as_millis() as u64;

            match result {
                Ok(block_number) => {
                    endpoint.record_success(Some(latency_ms));
                    ProbeResult {
                        endpoint: endpoint.url.clone(),
                        success: true,
                        latency_ms,
                        block_number: Some(block_number),
                        error: None,
                    }
                }
                Err(error) => {
                    endpoint.record_failure();
                    LogContext::new("endpoint_pool", "probe")
                        .with_endpoint(&endpoint.url)
                        .with_duration_ms(latency_ms)
                        .warn(&format!("Health probe failed: {}", error));
                    ProbeResult {
                        endpoint: endpoint.url.clone(),
                        success: false,
                        latency_ms,
                        block_number: None,
                        error: Some(error.to_string()),
                    }
                }
            }
        });

        let results = join_all(probes).await;

        let healthy = self.endpoints.iter().filter(|e| e.is_healthy()).count();
        MetricsLogger::log_probe_cycle(self.endpoints.len(), healthy, started.elapsed().as_millis() as u64);

        results
    }

    /// Probe immediately, then every `interval` until cancelled.
    /// Starting again replaces (and cancels) the previous schedule.
    pub fn start_background_probing(self: &Arc<Self>, interval: Duration) -> ProbeHandle {
        let weak_pool = Arc::downgrade(self);
        let shutdown = Arc::new(Notify::new());
        let signal = Arc::clone(&shutdown);
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(pool) = weak_pool.upgrade() else { break };
                        pool.probe_all().await;
                    }
                    _ = signal.notified() => {
                        LogContext::new("endpoint_pool", "probe_loop").info("Health probe task shutting down");
                        break;
                    }
                }
            }
        });

        let handle = ProbeHandle {
            shutdown,
            abort: task.abort_handle(),
        };

        LogContext::new("endpoint_pool", "probe_loop")
            .with_metadata("interval_ms", json!(period.as_millis() as u64))
            .info("Started background health probing");

        if let Some(previous) = self.probe_task.lock().replace(handle.clone()) {
            previous.cancel();
        }
        handle
    }

    pub fn stats(&self) -> PoolStats {
        let endpoints: Vec<EndpointStats> = self.endpoints.iter().map(|e| e.snapshot()).collect();
        PoolStats {
            total: endpoints.len(),
            healthy: endpoints.iter().filter(|e| e.healthy).count(),
            endpoints,
        }
    }

    /// Stop background probing; safe to call more than once
    pub fn shutdown(&self) {
        if let Some(handle) = self.probe_task.lock().take() {
            handle.cancel();
            LogContext::new("endpoint_pool", "shutdown").info("Endpoint pool shut down");
        }
    }
}

impl Drop for EndpointPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn endpoint_key(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}
