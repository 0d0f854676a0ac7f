//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 配置文件到采集循环的装配测试
//! - 模拟设备 e2e 测试（无需真实串口）
//! - 远端复制的 HTTP 往返测试

#[cfg(test)]
mod support {
    use std::sync::Arc;
    use std::time::Duration;

    use device_link::{DeviceLink, DeviceLinkConfig, MockDevice};

    /// Link over a mock device with no settle delay and a fast reader
    pub fn mock_link(device: &MockDevice) -> Arc<DeviceLink> {
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

    pub async fn wait_until<F: Fn() -> bool>(f: F) {
        for _ in 0..500 {
            if f() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached in time");
    }
}

#[cfg(test)]
mod config_tests {
    use std::io::Write;
    use std::time::Duration;

    use acquisition::{AcquisitionLoop, AcquisitionMode, SyntheticGenerator};
    use config_loader::ConfigLoader;
    use contracts::{NotifierKind, StorageKind};
    use dispatcher::{NotifierSink, RemoteReplicator, StoreSink};
    use tempfile::NamedTempFile;

    const SIMULATED_TOML: &str = r#"
[acquisition]
notify_interval_secs = 5
force_simulation = true

[synthetic]
base_temperature = 24.0

[storage]
kind = "memory"

[notifier]
kind = "log"
"#;

    #[test]
    fn test_toml_and_json_describe_the_same_blueprint() {
        let mut toml_file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(toml_file, "{SIMULATED_TOML}").unwrap();
        let from_toml = ConfigLoader::load_from_path(toml_file.path()).unwrap();

        let mut json_file = NamedTempFile::with_suffix(".json").unwrap();
        write!(json_file, "{}", ConfigLoader::to_json(&from_toml).unwrap()).unwrap();
        let from_json = ConfigLoader::load_from_path(json_file.path()).unwrap();

        assert_eq!(from_json.acquisition.notify_interval_secs, 5);
        assert!(from_json.acquisition.force_simulation);
        assert_eq!(from_json.storage.kind, StorageKind::Memory);
        assert_eq!(from_json.notifier.kind, NotifierKind::Log);
        assert_eq!(from_json.synthetic.base_temperature, 24.0);
        assert!(!from_json.replicator.is_configured());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(file, "[acquisition]\nnotify_interval_secs = 0\n").unwrap();
        assert!(ConfigLoader::load_from_path(file.path()).is_err());
    }

    /// Config file -> sinks -> simulated loop, on a paused clock
    #[tokio::test(start_paused = true)]
    async fn test_blueprint_drives_simulated_run() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        write!(file, "{SIMULATED_TOML}").unwrap();
        let blueprint = ConfigLoader::load_from_path(file.path()).unwrap();

        let acquisition = AcquisitionLoop::new(
            blueprint.acquisition.clone(),
            StoreSink::from_config(&blueprint.storage).unwrap(),
            NotifierSink::from_config(&blueprint.notifier).unwrap(),
            RemoteReplicator::new(&blueprint.replicator).unwrap(),
            SyntheticGenerator::new(blueprint.synthetic.clone()),
        );

        let report = acquisition
            .run(tokio::time::sleep(Duration::from_secs(16)))
            .await;

        assert_eq!(report.stats.mode, AcquisitionMode::Stopped);
        assert_eq!(report.stats.synthetic_readings, 3);
        assert_eq!(report.stats.persisted, 3);
        assert_eq!(report.stored_records, Some(3));
        assert_eq!(report.summary.total_readings, 3);
        assert!(!report.replicator.enabled);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;

    use acquisition::{AcquisitionLoop, AcquisitionMode, SyntheticGenerator};
    use contracts::{
        AcquisitionConfig, Reading, ReadingStore, ReplicatorConfig, SyntheticConfig,
        WarningThresholds,
    };
    use device_link::MockDevice;
    use dispatcher::test_support::StubServer;
    use dispatcher::{FileStore, LogNotifier, MemoryStore, RemoteReplicator};
    use tokio::sync::oneshot;

    use crate::support::{mock_link, wait_until};

    fn settings() -> AcquisitionConfig {
        AcquisitionConfig {
            notify_interval_secs: 60,
            tick_ms: 1000,
            persist_timeout_ms: 500,
            channel_capacity: 8,
            force_simulation: false,
        }
    }

    fn notifier() -> LogNotifier {
        LogNotifier::new("log", WarningThresholds::default())
    }

    fn generator() -> SyntheticGenerator {
        SyntheticGenerator::with_seed(SyntheticConfig::default(), 3)
    }

    /// MockDevice -> DeviceLink -> AcquisitionLoop -> FileStore
    #[tokio::test]
    async fn test_device_lines_reach_disk() {
        let dir = tempfile::tempdir().unwrap();
        let device = MockDevice::new();
        // Records split across reads must still be reassembled
        device.set_max_chunk(7);
        let link = mock_link(&device);

        let acquisition = AcquisitionLoop::new(
            settings(),
            FileStore::new("file", dir.path()).unwrap(),
            notifier(),
            RemoteReplicator::new(&ReplicatorConfig::default()).unwrap(),
            generator(),
        )
        .with_device(Arc::clone(&link));
        let status = acquisition.status_handle();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(acquisition.run(async {
            let _ = stop_rx.await;
        }));

        wait_until(|| status.mode() == AcquisitionMode::Connected).await;
        device.push_line(r#"{"temp":21.0,"humidity":40.0}"#);
        device.push_line(r#"{"status":"booting"}"#);
        device.push_line(r#"{"temp":22.0,"humidity":41.0,"heat_index":22.4}"#);
        device.push_line(r#"{"temp":23.0,"humidity":42.0,"air_quality":410}"#);
        wait_until(|| status.stats().persisted == 3).await;

        assert_eq!(status.latest().unwrap().temperature, 23.0);

        stop_tx.send(()).unwrap();
        let report = task.await.unwrap();
        assert_eq!(report.stats.device_readings, 3);
        assert_eq!(report.stats.synthetic_readings, 0);
        assert_eq!(report.stored_records, Some(3));
        assert!(!link.is_connected());

        let jsonl = fs::read_to_string(dir.path().join("readings.jsonl")).unwrap();
        let rows: Vec<serde_json::Value> = jsonl
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["id"], 1);
        assert_eq!(rows[1]["heat_index"], 22.4);
        assert_eq!(rows[2]["air_quality"], 410.0);

        let csv = fs::read_to_string(dir.path().join("readings.csv")).unwrap();
        assert_eq!(csv.lines().count(), 4);

        // Reopening continues the id sequence
        let mut reopened = FileStore::new("file", dir.path()).unwrap();
        assert_eq!(reopened.insert_reading(&Reading::new(24.0, 43.0)).await.unwrap(), 4);
    }

    /// Accepted readings are forwarded to the remote endpoint off the hot path
    #[tokio::test]
    async fn test_readings_replicated_to_remote() {
        let endpoint = StubServer::start(200, "ok", Duration::ZERO).await;
        let replicator = RemoteReplicator::new(&ReplicatorConfig {
            enabled: true,
            endpoint: endpoint.url.clone(),
            api_key: "integration-key".to_string(),
            ..Default::default()
        })
        .unwrap();

        let device = MockDevice::new();
        let link = mock_link(&device);
        let store = MemoryStore::new("memory");

        let acquisition = AcquisitionLoop::new(
            settings(),
            store.clone(),
            notifier(),
            replicator.clone(),
            generator(),
        )
        .with_device(link)
        .with_notify_remote(true);
        let status = acquisition.status_handle();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(acquisition.run(async {
            let _ = stop_rx.await;
        }));

        wait_until(|| status.mode() == AcquisitionMode::Connected).await;
        device.push_line(r#"{"temp":25.5,"humidity":60.2,"heat_index":26.1}"#);
        wait_until(|| replicator.stats().successful_count == 1).await;

        stop_tx.send(()).unwrap();
        let report = task.await.unwrap();

        assert_eq!(endpoint.requests_to("/api/health").len(), 1);
        let pushes = endpoint.requests_to("/api/push");
        assert_eq!(pushes.len(), 1);
        let push = pushes[0].to_lowercase();
        assert!(push.contains("authorization: bearer integration-key"));
        assert!(push.contains(r#""temperature":25.5"#));
        assert!(push.contains(r#""send_discord":true"#));

        assert_eq!(store.len(), 1);
        assert!(report.replicator.enabled);
        assert_eq!(report.replicator.successful_count, 1);
        assert!(report.replicator.last_sync.is_some());
    }

    /// A device that cannot be opened leaves the loop running on synthetic data
    #[tokio::test]
    async fn test_missing_device_runs_simulated() {
        let device = MockDevice::new();
        device.set_fail_open(true);
        let store = MemoryStore::new("memory");

        let acquisition = AcquisitionLoop::new(
            AcquisitionConfig {
                notify_interval_secs: 1,
                tick_ms: 100,
                ..settings()
            },
            store.clone(),
            notifier(),
            RemoteReplicator::new(&ReplicatorConfig::default()).unwrap(),
            generator(),
        )
        .with_device(mock_link(&device));

        let report = acquisition
            .run(tokio::time::sleep(Duration::from_millis(2500)))
            .await;

        assert_eq!(report.stats.device_readings, 0);
        assert_eq!(report.stats.synthetic_readings, 2);
        for reading in store.records() {
            assert!((0.0..=100.0).contains(&reading.humidity));
        }
    }
}
