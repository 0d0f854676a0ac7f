//! LogNotifier - announces readings via tracing

use contracts::{Notifier, Reading, WarningThresholds};
use tracing::{info, warn};

use super::{status_labels, threshold_warnings};

/// Notifier that only writes log lines
pub struct LogNotifier {
    name: String,
    thresholds: WarningThresholds,
}

impl LogNotifier {
    /// Create a new LogNotifier with the given name
    pub fn new(name: impl Into<String>, thresholds: WarningThresholds) -> Self {
        Self {
            name: name.into(),
            thresholds,
        }
    }
}

impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send_sensor_data(&self, reading: &Reading) -> bool {
        let labels = status_labels(&self.thresholds, reading);
        let status = if labels.is_empty() {
            "normal".to_string()
        } else {
            labels.join(" | ")
        };

        info!(
            sink = %self.name,
            temperature = reading.temperature,
            humidity = reading.humidity,
            heat_index = ?reading.heat_index,
            air_quality = ?reading.air_quality,
            status = %status,
            "Sensor report"
        );
        observability::record_notification(&self.name, true);
        true
    }

    async fn send_startup_message(&self) -> bool {
        info!(sink = %self.name, "Monitor started");
        true
    }

    async fn send_shutdown_message(&self) -> bool {
        info!(sink = %self.name, "Monitor stopped");
        true
    }

    async fn check_and_send_warning(&self, temperature: f64, humidity: f64) -> bool {
        let warnings = threshold_warnings(&self.thresholds, temperature, humidity);

        for warning in &warnings {
            warn!(
                sink = %self.name,
                kind = warning.kind.title(),
                temperature,
                humidity,
                "{}",
                warning.message
            );
        }

        !warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier() {
        let sink = LogNotifier::new("my_logger", WarningThresholds::default());
        assert_eq!(sink.name(), "my_logger");
        assert!(sink.send_sensor_data(&Reading::new(25.0, 50.0)).await);
        assert!(sink.send_startup_message().await);
    }

    #[tokio::test]
    async fn test_log_notifier_warnings() {
        let sink = LogNotifier::new("log", WarningThresholds::default());
        assert!(!sink.check_and_send_warning(25.0, 50.0).await);
        assert!(sink.check_and_send_warning(5.0, 50.0).await);
    }
}
