//! Acquisition loop - single consumer of accepted readings
//!
//! ```text
//! reader thread ──blocking_send──▶ mpsc ──▶ AcquisitionLoop::accept
//!                                             ├─ cache.update
//!                                             ├─ store.insert_reading (bounded)
//!                                             ├─ replicator.push (detached)
//!                                             └─ throttle ▶ notifier
//! ```
//!
//! In simulated mode the 1 Hz tick produces a synthetic reading every
//! notification interval and feeds it through the same `accept` path.

use std::future::Future;
use std::sync::Arc;

use contracts::{AcquisitionConfig, Notifier, Reading, ReadingSource, ReadingStore};
use device_link::DeviceLink;
use dispatcher::{PushMode, RemoteReplicator};
use observability::ReadingMetricsAggregator;
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::cache::ReadingCache;
use crate::error::{AcquisitionError, Result};
use crate::stats::{AcquisitionCounters, AcquisitionMode, AcquisitionReport, StatusHandle};
use crate::synthetic::SyntheticGenerator;
use crate::throttle::{SinkThrottle, NOTIFICATION_CHANNEL, SYNTHETIC_CHANNEL};

/// Acquisition loop
///
/// Owns the cache, throttle and collaborators. External readers get a
/// [`StatusHandle`] before [`run`](Self::run) consumes the loop.
pub struct AcquisitionLoop<S, N> {
    settings: AcquisitionConfig,
    link: Option<Arc<DeviceLink>>,
    store: S,
    notifier: N,
    replicator: RemoteReplicator,
    notify_remote: bool,
    generator: SyntheticGenerator,
    cache: ReadingCache,
    throttle: SinkThrottle,
    counters: Arc<AcquisitionCounters>,
    summary: ReadingMetricsAggregator,
}

impl<S, N> AcquisitionLoop<S, N>
where
    S: ReadingStore + Sync,
    N: Notifier + Sync,
{
    pub fn new(
        settings: AcquisitionConfig,
        store: S,
        notifier: N,
        replicator: RemoteReplicator,
        generator: SyntheticGenerator,
    ) -> Self {
        Self {
            settings,
            link: None,
            store,
            notifier,
            replicator,
            notify_remote: false,
            generator,
            cache: ReadingCache::new(),
            throttle: SinkThrottle::new(),
            counters: Arc::new(AcquisitionCounters::new()),
            summary: ReadingMetricsAggregator::new(),
        }
    }

    /// Attach a device link; without one the loop runs simulated
    pub fn with_device(mut self, link: Arc<DeviceLink>) -> Self {
        self.link = Some(link);
        self
    }

    /// Ask the remote side to announce replicated readings itself
    pub fn with_notify_remote(mut self, notify_remote: bool) -> Self {
        self.notify_remote = notify_remote;
        self
    }

    pub fn status_handle(&self) -> StatusHandle {
        StatusHandle::new(self.cache.reader(), Arc::clone(&self.counters))
    }

    /// Run until `shutdown` resolves, then stop the device and report
    pub async fn run<F>(mut self, shutdown: F) -> AcquisitionReport
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();

        let mut readings = self.start_device().await;
        if readings.is_none() {
            self.enter_simulated(Instant::now());
        }

        if self.replicator.is_enabled() {
            let healthy = self.replicator.check_connection().await;
            info!(endpoint = %self.replicator.endpoint(), healthy, "Remote replicator enabled");
        }

        if !self.notifier.send_startup_message().await {
            debug!(notifier = %self.notifier.name(), "Startup notification not delivered");
        }

        let mut tick = time::interval(self.settings.tick());
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            mode = %self.counters.mode(),
            interval = ?self.settings.notify_interval(),
            "Acquisition loop running"
        );

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }

                received = next_reading(&mut readings), if readings.is_some() => match received {
                    Some(reading) => self.accept(reading, ReadingSource::Device).await,
                    None => {
                        warn!("Device reader channel closed, switching to simulated data");
                        readings = None;
                        self.enter_simulated(Instant::now());
                    }
                },

                now = tick.tick() => self.on_tick(now).await,
            }
        }

        // Unblocks a reader waiting on a full channel before it is joined
        drop(readings);
        self.shutdown(started).await
    }

    /// Connect and start the reader; `None` means simulated mode
    async fn start_device(&mut self) -> Option<mpsc::Receiver<Reading>> {
        if self.settings.force_simulation {
            info!("Simulation forced by configuration");
            return None;
        }

        let Some(link) = self.link.clone() else {
            warn!("No device configured, using simulated data");
            return None;
        };

        let (tx, rx) = mpsc::channel(self.settings.channel_capacity.max(1));

        let started = tokio::task::spawn_blocking(move || {
            if !link.connect() {
                return false;
            }
            link.start_continuous_read(move |reading| {
                if tx.blocking_send(reading).is_err() {
                    debug!("Acquisition loop gone, dropping reading");
                }
            })
        })
        .await
        .map_err(|e| AcquisitionError::task(e.to_string()));

        match started {
            Ok(true) => {
                self.counters.set_mode(AcquisitionMode::Connected);
                observability::record_device_connected(true);
                info!("Device connected, reading continuously");
                Some(rx)
            }
            Ok(false) => {
                warn!("Device not available, using simulated data");
                None
            }
            Err(e) => {
                error!(error = %e, "Device startup failed, using simulated data");
                None
            }
        }
    }

    fn enter_simulated(&mut self, now: Instant) {
        self.counters.set_mode(AcquisitionMode::Simulated);
        observability::record_device_connected(false);
        // First synthetic reading after one full interval
        self.throttle.mark(SYNTHETIC_CHANNEL, now);
    }

    async fn on_tick(&mut self, now: Instant) {
        if self.counters.mode() != AcquisitionMode::Simulated {
            return;
        }

        if self
            .throttle
            .try_fire(SYNTHETIC_CHANNEL, self.settings.notify_interval(), now)
        {
            let reading = self.generator.next_reading();
            self.accept(reading, ReadingSource::Synthetic).await;
        }
    }

    /// Accept one reading; failures are counted, never propagated
    #[instrument(
        name = "acquisition_accept",
        skip(self, reading),
        fields(source = source.as_str())
    )]
    async fn accept(&mut self, reading: Reading, source: ReadingSource) {
        let seq = self.counters.record_reading(source);
        self.cache.update(reading.clone());
        self.summary.update(&reading, source);
        observability::record_reading_accepted(&reading, source);

        info!(
            seq,
            temperature = reading.temperature,
            humidity = reading.humidity,
            heat_index = ?reading.heat_index,
            air_quality = ?reading.air_quality,
            "Reading accepted"
        );

        if let Err(e) = self.persist(&reading).await {
            observability::record_acquisition_error();
            warn!(seq, error = %e, "Failed to persist reading");
        }

        if self.replicator.is_enabled() {
            self.replicator
                .push(&reading, self.notify_remote, PushMode::Detached)
                .await;
        }

        self.notify(&reading).await;
    }

    async fn persist(&mut self, reading: &Reading) -> Result<u64> {
        let timeout = self.settings.persist_timeout();

        let outcome = match time::timeout(timeout, self.store.insert_reading(reading)).await {
            Ok(Ok(id)) => Ok(id),
            Ok(Err(e)) => Err(AcquisitionError::from(e)),
            Err(_) => Err(AcquisitionError::persist_timeout(self.store.name(), timeout)),
        };

        let success = outcome.is_ok();
        self.counters.record_persist(success);
        observability::record_persist(self.store.name(), success);

        if let Ok(id) = &outcome {
            debug!(id, store = %self.store.name(), "Reading persisted");
        }
        outcome
    }

    async fn notify(&mut self, reading: &Reading) {
        let now = Instant::now();
        if !self
            .throttle
            .try_fire(NOTIFICATION_CHANNEL, self.settings.notify_interval(), now)
        {
            self.counters.record_suppressed();
            observability::record_notification_suppressed(NOTIFICATION_CHANNEL);
            return;
        }

        let delivered = self.notifier.send_sensor_data(reading).await;
        self.counters.record_notification(delivered);
        if !delivered {
            debug!(notifier = %self.notifier.name(), "Sensor notification not delivered");
        }

        if self
            .notifier
            .check_and_send_warning(reading.temperature, reading.humidity)
            .await
        {
            info!(
                temperature = reading.temperature,
                humidity = reading.humidity,
                "Threshold warning sent"
            );
        }
    }

    async fn shutdown(mut self, started: Instant) -> AcquisitionReport {
        info!("Stopping acquisition");
        self.counters.set_mode(AcquisitionMode::Stopped);

        if let Some(link) = self.link.take() {
            if let Err(e) = tokio::task::spawn_blocking(move || link.disconnect()).await {
                error!(error = %e, "Device disconnect task failed");
            }
        }

        if !self.notifier.send_shutdown_message().await {
            debug!(notifier = %self.notifier.name(), "Shutdown notification not delivered");
        }

        let stored_records = match self.store.reading_count().await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(error = %e, "Could not read stored record count");
                None
            }
        };

        let report = AcquisitionReport {
            duration: started.elapsed(),
            stats: self.counters.snapshot(),
            stored_records,
            replicator: self.replicator.stats(),
            summary: self.summary.summary(),
        };

        info!(
            readings = report.stats.readings,
            errors = report.stats.errors,
            persisted = report.stats.persisted,
            replicated = report.replicator.successful_count,
            replication_failures = report.replicator.failed_count,
            "Acquisition stopped"
        );

        report
    }
}

async fn next_reading(readings: &mut Option<mpsc::Receiver<Reading>>) -> Option<Reading> {
    match readings {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ReplicatorConfig, SyntheticConfig, WarningThresholds};
    use device_link::{DeviceLinkConfig, MockDevice};
    use dispatcher::{LogNotifier, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;

    const WAIT_STEP: Duration = Duration::from_millis(10);

    /// Notifier counting calls
    #[derive(Clone, Default)]
    struct CountingNotifier {
        sensor: Arc<AtomicUsize>,
        warnings: Arc<AtomicUsize>,
        lifecycle: Arc<AtomicUsize>,
        deliver: bool,
    }

    impl Notifier for CountingNotifier {
        fn name(&self) -> &str {
            "counting"
        }

        async fn send_sensor_data(&self, _reading: &Reading) -> bool {
            self.sensor.fetch_add(1, Ordering::SeqCst);
            self.deliver
        }

        async fn send_startup_message(&self) -> bool {
            self.lifecycle.fetch_add(1, Ordering::SeqCst);
            true
        }

        async fn send_shutdown_message(&self) -> bool {
            self.lifecycle.fetch_add(1, Ordering::SeqCst);
            true
        }

        async fn check_and_send_warning(&self, _t: f64, _h: f64) -> bool {
            self.warnings.fetch_add(1, Ordering::SeqCst);
            false
        }
    }

    /// Store that never answers
    struct StuckStore;

    impl ReadingStore for StuckStore {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn insert_reading(
            &mut self,
            _reading: &Reading,
        ) -> std::result::Result<u64, contracts::ContractError> {
            std::future::pending().await
        }

        async fn reading_count(&self) -> std::result::Result<u64, contracts::ContractError> {
            Ok(0)
        }
    }

    fn settings() -> AcquisitionConfig {
        AcquisitionConfig {
            notify_interval_secs: 60,
            tick_ms: 1000,
            persist_timeout_ms: 500,
            channel_capacity: 8,
            force_simulation: false,
        }
    }

    fn replicator() -> RemoteReplicator {
        RemoteReplicator::new(&ReplicatorConfig::default()).unwrap()
    }

    fn generator() -> SyntheticGenerator {
        SyntheticGenerator::with_seed(SyntheticConfig::default(), 11)
    }

    fn mock_link(device: &MockDevice) -> Arc<DeviceLink> {
        let config = DeviceLinkConfig {
            port: "mock".to_string(),
            settle_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(5),
            error_backoff: Duration::from_millis(20),
            join_timeout: Duration::from_millis(500),
            ..Default::default()
        };
        Arc::new(DeviceLink::new(config, Arc::new(device.clone())))
    }

    async fn wait_until<F: Fn() -> bool>(f: F) {
        for _ in 0..500 {
            if f() {
                return;
            }
            tokio::time::sleep(WAIT_STEP).await;
        }
        panic!("condition not reached in time");
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_synthetic_reading_per_interval() {
        let store = MemoryStore::new("memory");
        let acquisition = AcquisitionLoop::new(
            settings(),
            store.clone(),
            LogNotifier::new("log", WarningThresholds::default()),
            replicator(),
            generator(),
        );
        let status = acquisition.status_handle();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(acquisition.run(async {
            let _ = stop_rx.await;
        }));

        time::sleep(Duration::from_millis(59_500)).await;
        assert_eq!(store.len(), 0);
        assert!(status.latest().is_none());
        assert_eq!(status.mode(), AcquisitionMode::Simulated);

        time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.len(), 1);
        let cached = status.latest().unwrap();
        assert_eq!(cached.temperature, store.records()[0].temperature);

        time::sleep(Duration::from_secs(60)).await;
        assert_eq!(store.len(), 2);

        stop_tx.send(()).unwrap();
        let report = task.await.unwrap();
        assert_eq!(report.stats.synthetic_readings, 2);
        assert_eq!(report.stats.device_readings, 0);
        assert_eq!(report.stats.mode, AcquisitionMode::Stopped);
        assert_eq!(report.stored_records, Some(2));
        assert_eq!(report.summary.total_readings, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_notification_throttled_within_interval() {
        let notifier = CountingNotifier {
            deliver: true,
            ..Default::default()
        };
        let mut acquisition = AcquisitionLoop::new(
            settings(),
            MemoryStore::new("memory"),
            notifier.clone(),
            replicator(),
            generator(),
        );

        acquisition.accept(Reading::new(20.0, 50.0), ReadingSource::Device).await;
        time::advance(Duration::from_secs(30)).await;
        acquisition.accept(Reading::new(21.0, 50.0), ReadingSource::Device).await;

        assert_eq!(notifier.sensor.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.warnings.load(Ordering::SeqCst), 1);

        time::advance(Duration::from_secs(30)).await;
        acquisition.accept(Reading::new(22.0, 50.0), ReadingSource::Device).await;
        assert_eq!(notifier.sensor.load(Ordering::SeqCst), 2);

        let stats = acquisition.status_handle().stats();
        assert_eq!(stats.readings, 3);
        assert_eq!(stats.notifications_sent, 2);
        assert_eq!(stats.notifications_suppressed, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_notification_still_advances_throttle() {
        let notifier = CountingNotifier::default();
        let mut acquisition = AcquisitionLoop::new(
            settings(),
            MemoryStore::new("memory"),
            notifier.clone(),
            replicator(),
            generator(),
        );

        acquisition.accept(Reading::new(20.0, 50.0), ReadingSource::Device).await;
        acquisition.accept(Reading::new(20.0, 50.0), ReadingSource::Device).await;

        assert_eq!(notifier.sensor.load(Ordering::SeqCst), 1);
        let stats = acquisition.status_handle().stats();
        assert_eq!(stats.notification_failures, 1);
        assert_eq!(stats.notifications_suppressed, 1);
    }

    #[tokio::test]
    async fn test_persist_failure_is_counted_and_loop_continues() {
        let store = MemoryStore::new("memory");
        store.set_failing(true);
        let mut acquisition = AcquisitionLoop::new(
            settings(),
            store.clone(),
            CountingNotifier::default(),
            replicator(),
            generator(),
        );

        acquisition.accept(Reading::new(20.0, 50.0), ReadingSource::Device).await;
        store.set_failing(false);
        acquisition.accept(Reading::new(21.0, 50.0), ReadingSource::Device).await;

        let status = acquisition.status_handle();
        let stats = status.stats();
        assert_eq!(stats.readings, 2);
        assert_eq!(stats.persist_failures, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.persisted, 1);
        assert_eq!(status.latest().unwrap().temperature, 21.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_store_is_bounded() {
        let mut acquisition = AcquisitionLoop::new(
            settings(),
            StuckStore,
            CountingNotifier::default(),
            replicator(),
            generator(),
        );

        let started = Instant::now();
        acquisition.accept(Reading::new(20.0, 50.0), ReadingSource::Device).await;
        assert!(started.elapsed() >= Duration::from_millis(500));
        assert!(started.elapsed() < Duration::from_secs(1));

        let stats = acquisition.status_handle().stats();
        assert_eq!(stats.persist_failures, 1);
        assert!(acquisition.status_handle().latest().is_some());
    }

    #[tokio::test]
    async fn test_device_reading_updates_cache_and_persists_once() {
        let device = MockDevice::new();
        let link = mock_link(&device);
        let store = MemoryStore::new("memory");

        let acquisition = AcquisitionLoop::new(
            settings(),
            store.clone(),
            CountingNotifier::default(),
            replicator(),
            generator(),
        )
        .with_device(Arc::clone(&link));
        let status = acquisition.status_handle();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(acquisition.run(async {
            let _ = stop_rx.await;
        }));

        wait_until(|| status.mode() == AcquisitionMode::Connected).await;
        device.push_line(r#"{"temp":25.5,"humidity":60.2,"heat_index":26.1}"#);
        wait_until(|| store.len() == 1).await;

        let cached = status.latest().unwrap();
        assert_eq!(cached.temperature, 25.5);
        assert_eq!(cached.humidity, 60.2);
        assert_eq!(cached.heat_index, Some(26.1));

        let records = store.records();
        assert_eq!(records[0].temperature, 25.5);
        assert_eq!(records[0].humidity, 60.2);
        assert_eq!(records[0].heat_index, Some(26.1));

        stop_tx.send(()).unwrap();
        let report = task.await.unwrap();
        assert_eq!(report.stats.device_readings, 1);
        assert_eq!(report.stored_records, Some(1));
        assert!(!link.is_connected());
        assert!(!link.is_running());
    }

    #[tokio::test]
    async fn test_partial_record_is_ignored() {
        let device = MockDevice::new();
        let link = mock_link(&device);
        let store = MemoryStore::new("memory");

        let acquisition = AcquisitionLoop::new(
            settings(),
            store.clone(),
            CountingNotifier::default(),
            replicator(),
            generator(),
        )
        .with_device(Arc::clone(&link));
        let status = acquisition.status_handle();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(acquisition.run(async {
            let _ = stop_rx.await;
        }));

        wait_until(|| status.mode() == AcquisitionMode::Connected).await;
        device.push_line(r#"{"temp":25.5}"#);
        device.push_line("not json at all");
        wait_until(|| link.stats().lines_parsed >= 1 && link.stats().parse_errors >= 1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(status.latest().is_none());
        assert!(store.is_empty());

        stop_tx.send(()).unwrap();
        let report = task.await.unwrap();
        assert_eq!(report.stats.readings, 0);
    }

    #[tokio::test]
    async fn test_unavailable_device_falls_back_to_simulation() {
        let device = MockDevice::new();
        device.set_fail_open(true);
        let link = mock_link(&device);

        let notifier = CountingNotifier::default();
        let acquisition = AcquisitionLoop::new(
            settings(),
            MemoryStore::new("memory"),
            notifier.clone(),
            replicator(),
            generator(),
        )
        .with_device(link);
        let status = acquisition.status_handle();

        let report = acquisition.run(async {}).await;
        assert_eq!(report.stats.mode, AcquisitionMode::Stopped);
        assert_eq!(status.mode(), AcquisitionMode::Stopped);
        // startup + shutdown
        assert_eq!(notifier.lifecycle.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_forced_simulation_skips_device() {
        let device = MockDevice::new();
        let link = mock_link(&device);

        let acquisition = AcquisitionLoop::new(
            AcquisitionConfig {
                force_simulation: true,
                ..settings()
            },
            MemoryStore::new("memory"),
            CountingNotifier::default(),
            replicator(),
            generator(),
        )
        .with_device(link);

        acquisition.run(async {}).await;
        assert_eq!(device.open_count(), 0);
    }
}
