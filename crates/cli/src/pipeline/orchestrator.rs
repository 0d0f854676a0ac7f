//! Pipeline orchestrator - builds the collaborators and runs the loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use acquisition::{AcquisitionLoop, AcquisitionReport, SyntheticGenerator};
use anyhow::{Context, Result};
use contracts::{DeviceConfig, MonitorBlueprint};
use device_link::{DeviceLink, DeviceLinkConfig};
use dispatcher::{NotifierSink, RemoteReplicator, StoreSink};
use tracing::{info, warn};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The monitor blueprint
    pub blueprint: MonitorBlueprint,

    /// Serial port given on the command line (skips auto-detection)
    pub port_override: Option<String>,

    /// Pipeline timeout (None = run until shutdown)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the timeout elapses
    pub async fn run<F>(self, shutdown: F) -> Result<AcquisitionReport>
    where
        F: Future<Output = ()> + Send,
    {
        let blueprint = &self.config.blueprint;

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let store = StoreSink::from_config(&blueprint.storage)
            .with_context(|| format!("Failed to open store at {}", blueprint.storage.path.display()))?;
        let notifier =
            NotifierSink::from_config(&blueprint.notifier).context("Failed to create notifier")?;
        let replicator =
            RemoteReplicator::new(&blueprint.replicator).context("Failed to create replicator")?;

        info!(
            store = ?blueprint.storage.kind,
            notifier = ?blueprint.notifier.kind,
            replicator = replicator.is_enabled(),
            "Collaborators ready"
        );

        let mut acquisition = AcquisitionLoop::new(
            blueprint.acquisition.clone(),
            store,
            notifier,
            replicator,
            SyntheticGenerator::new(blueprint.synthetic.clone()),
        )
        .with_notify_remote(blueprint.replicator.notify_remote);

        if !blueprint.acquisition.force_simulation {
            match resolve_port(&blueprint.device, self.config.port_override.as_deref()) {
                Some(port) => {
                    info!(port = %port, baud_rate = blueprint.device.baud_rate, "Using serial device");
                    let link_config = DeviceLinkConfig::from(&blueprint.device).with_port(port);
                    acquisition = acquisition.with_device(Arc::new(DeviceLink::serial(link_config)));
                }
                None => warn!("No serial port configured or detected"),
            }
        }

        let timeout = self.config.timeout;
        let stop = async move {
            match timeout {
                Some(limit) => {
                    tokio::select! {
                        _ = shutdown => {}
                        _ = tokio::time::sleep(limit) => {
                            info!(timeout_secs = limit.as_secs(), "Run timeout reached");
                        }
                    }
                }
                None => shutdown.await,
            }
        };

        Ok(acquisition.run(stop).await)
    }
}

/// Pick the serial port: CLI override, then auto-detection, then config
pub fn resolve_port(device: &DeviceConfig, port_override: Option<&str>) -> Option<String> {
    if let Some(port) = port_override.map(str::trim).filter(|p| !p.is_empty()) {
        return Some(port.to_string());
    }

    if device.auto_detect {
        match device_link::find_device_port() {
            Some(port) => {
                info!(port = %port, "Auto-detected device port");
                return Some(port);
            }
            None => info!("No known adapter found, using configured port"),
        }
    }

    let port = device.port.trim();
    (!port.is_empty()).then(|| port.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let device = DeviceConfig::default();
        assert_eq!(
            resolve_port(&device, Some(" COM7 ")).as_deref(),
            Some("COM7")
        );
    }

    #[test]
    fn test_configured_port_without_auto_detect() {
        let device = DeviceConfig {
            port: "/dev/ttyACM1".to_string(),
            auto_detect: false,
            ..Default::default()
        };
        assert_eq!(resolve_port(&device, None).as_deref(), Some("/dev/ttyACM1"));

        let device = DeviceConfig {
            port: String::new(),
            auto_detect: false,
            ..Default::default()
        };
        assert_eq!(resolve_port(&device, Some("")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_run_with_timeout() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let mut blueprint = MonitorBlueprint::default();
        blueprint.acquisition.force_simulation = true;
        blueprint.acquisition.notify_interval_secs = 10;
        blueprint.storage.path = temp_dir.path().to_path_buf();

        let pipeline = Pipeline::new(PipelineConfig {
            blueprint,
            port_override: None,
            timeout: Some(Duration::from_secs(35)),
            metrics_port: None,
        });

        let report = pipeline.run(std::future::pending()).await.unwrap();
        assert_eq!(report.stats.synthetic_readings, 3);
        assert_eq!(report.stored_records, Some(3));
    }
}
