//! RemoteReplicator - best-effort push of readings to a remote endpoint
//!
//! One request per reading, no retries. On the hot path every push runs on
//! its own detached task, so a slow or absent endpoint never delays
//! acquisition.

use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::{ReplicatorConfig, Reading};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{DispatcherError, Result};
use crate::metrics::{ReplicatorMetrics, ReplicatorStats};

/// How `push` waits for the outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushMode {
    /// Spawn and return immediately (hot path)
    #[default]
    Detached,
    /// Await the request and report its outcome (diagnostics)
    Wait,
}

/// Body of `POST /api/push`
#[derive(Debug, Clone, Serialize)]
struct PushPayload {
    temperature: f64,
    humidity: f64,
    heat_index: Option<f64>,
    send_discord: bool,
}

struct ReplicatorInner {
    enabled: bool,
    endpoint: String,
    api_key: String,
    push_timeout: Duration,
    health_timeout: Duration,
    client: Client,
    metrics: ReplicatorMetrics,
}

/// Remote replicator
///
/// Cheap to clone; clones share counters.
#[derive(Clone)]
pub struct RemoteReplicator {
    inner: Arc<ReplicatorInner>,
}

impl RemoteReplicator {
    /// Build from config
    ///
    /// Enabled only when the flag is on and both endpoint and key are real
    /// (non-placeholder) values.
    pub fn new(config: &ReplicatorConfig) -> Result<Self> {
        let client = Client::builder().build()?;

        Ok(Self {
            inner: Arc::new(ReplicatorInner {
                enabled: config.is_configured(),
                endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
                api_key: config.api_key.clone(),
                push_timeout: config.push_timeout(),
                health_timeout: config.health_timeout(),
                client,
                metrics: ReplicatorMetrics::new(),
            }),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Forward one reading
    ///
    /// Returns false when disabled. In `Detached` mode returns true as soon
    /// as the task is spawned; in `Wait` mode returns the push outcome.
    pub async fn push(&self, reading: &Reading, notify_remote: bool, mode: PushMode) -> bool {
        if !self.inner.enabled {
            return false;
        }

        let payload = PushPayload {
            temperature: reading.temperature,
            humidity: reading.humidity,
            heat_index: reading.heat_index,
            send_discord: notify_remote,
        };

        match mode {
            PushMode::Detached => {
                let this = self.clone();
                tokio::spawn(async move {
                    this.push_now(payload).await;
                });
                true
            }
            PushMode::Wait => self.push_now(payload).await,
        }
    }

    #[instrument(
        name = "replicator_push",
        skip(self, payload),
        fields(temperature = payload.temperature, humidity = payload.humidity)
    )]
    async fn push_now(&self, payload: PushPayload) -> bool {
        let started = Instant::now();
        let outcome = self.send_push(&payload).await;
        observability::record_replication_latency_ms(started.elapsed().as_secs_f64() * 1000.0);

        match outcome {
            Ok(()) => {
                self.inner.metrics.record_success();
                observability::record_replication(true);
                debug!("Reading replicated");
                true
            }
            Err(e) => {
                let diagnostic = match &e {
                    DispatcherError::Http(err) if err.is_timeout() => {
                        warn!("Remote push timed out");
                        "request timed out".to_string()
                    }
                    // Usually just offline; not worth a visible log line
                    DispatcherError::Http(err) if err.is_connect() => {
                        debug!(error = %err, "Remote endpoint unreachable");
                        "cannot reach remote endpoint".to_string()
                    }
                    DispatcherError::Replication { message } => {
                        warn!(error = %message, "Remote push rejected");
                        message.clone()
                    }
                    other => {
                        warn!(error = %other, "Remote push failed");
                        other.to_string()
                    }
                };

                self.inner.metrics.record_failure(diagnostic);
                observability::record_replication(false);
                false
            }
        }
    }

    async fn send_push(&self, payload: &PushPayload) -> Result<()> {
        let response = self
            .inner
            .client
            .post(format!("{}/api/push", self.inner.endpoint))
            .bearer_auth(&self.inner.api_key)
            .timeout(self.inner.push_timeout)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DispatcherError::replication(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )))
    }

    /// Probe `GET /api/health` (startup diagnostics only)
    #[instrument(name = "replicator_health", skip(self))]
    pub async fn check_connection(&self) -> bool {
        if !self.inner.enabled {
            return false;
        }

        let result = self
            .inner
            .client
            .get(format!("{}/api/health", self.inner.endpoint))
            .timeout(self.inner.health_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(endpoint = %self.inner.endpoint, "Remote endpoint healthy");
                true
            }
            Ok(response) => {
                warn!(
                    endpoint = %self.inner.endpoint,
                    status = response.status().as_u16(),
                    "Remote health check failed"
                );
                false
            }
            Err(e) => {
                warn!(endpoint = %self.inner.endpoint, error = %e, "Remote endpoint unreachable");
                false
            }
        }
    }

    /// Counter snapshot; the endpoint is only reported while enabled
    pub fn stats(&self) -> ReplicatorStats {
        let endpoint = self.inner.enabled.then(|| self.inner.endpoint.clone());
        self.inner.metrics.snapshot(self.inner.enabled, endpoint)
    }
}
