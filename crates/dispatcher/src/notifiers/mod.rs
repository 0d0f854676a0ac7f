//! Notifier implementations
//!
//! Contains DiscordNotifier, LogNotifier and the runtime-selected
//! `NotifierSink` wrapper.

mod discord;
mod log;

pub use self::discord::DiscordNotifier;
pub use self::log::LogNotifier;

use contracts::{Notifier, NotifierConfig, NotifierKind, Reading, WarningThresholds};
use tracing::{debug, warn};

use crate::error::Result;

/// Threshold violation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    HighTemperature,
    LowTemperature,
    HighHumidity,
    LowHumidity,
}

impl WarningKind {
    pub fn title(&self) -> &'static str {
        match self {
            Self::HighTemperature => "High temperature",
            Self::LowTemperature => "Low temperature",
            Self::HighHumidity => "High humidity",
            Self::LowHumidity => "Low humidity",
        }
    }
}

/// One violated threshold with its message
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

/// Temperature (high xor low) and humidity (high xor low) violations
pub fn threshold_warnings(t: &WarningThresholds, temperature: f64, humidity: f64) -> Vec<Warning> {
    let mut warnings = Vec::new();

    if temperature >= t.temp_high {
        warnings.push(Warning {
            kind: WarningKind::HighTemperature,
            message: format!(
                "Temperature reached {temperature:.1}°C, above the {}°C limit",
                t.temp_high
            ),
        });
    } else if temperature <= t.temp_low {
        warnings.push(Warning {
            kind: WarningKind::LowTemperature,
            message: format!(
                "Temperature dropped to {temperature:.1}°C, below the {}°C limit",
                t.temp_low
            ),
        });
    }

    if humidity >= t.humidity_high {
        warnings.push(Warning {
            kind: WarningKind::HighHumidity,
            message: format!(
                "Humidity reached {humidity:.1}%, above the {}% limit",
                t.humidity_high
            ),
        });
    } else if humidity <= t.humidity_low {
        warnings.push(Warning {
            kind: WarningKind::LowHumidity,
            message: format!(
                "Humidity dropped to {humidity:.1}%, below the {}% limit",
                t.humidity_low
            ),
        });
    }

    warnings
}

/// Short status labels for a reading; empty means normal
pub fn status_labels(t: &WarningThresholds, reading: &Reading) -> Vec<&'static str> {
    let mut labels = Vec::new();

    if reading.temperature >= t.temp_high {
        labels.push("🔴 High temp");
    } else if reading.temperature <= t.temp_low {
        labels.push("🔵 Low temp");
    }

    if reading.humidity >= t.humidity_high {
        labels.push("💦 Humid");
    } else if reading.humidity <= t.humidity_low {
        labels.push("🏜️ Dry");
    }

    if reading.air_quality.is_some_and(|ppm| ppm > t.air_quality_poor) {
        labels.push("💨 Poor air");
    }

    labels
}

/// Air-quality grade for a ppm value
pub fn air_quality_grade(ppm: f64) -> &'static str {
    match ppm {
        p if p <= 400.0 => "excellent",
        p if p <= 600.0 => "good",
        p if p <= 1000.0 => "fair",
        p if p <= 2000.0 => "poor",
        _ => "hazardous",
    }
}

/// Notifier selected from config at runtime
pub enum NotifierSink {
    Discord(DiscordNotifier),
    Log(LogNotifier),
    /// `kind = "none"`: every call is a no-op reporting false
    Disabled,
}

impl NotifierSink {
    /// Create the configured notifier
    ///
    /// A `discord` notifier without a real webhook URL falls back to `log`.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        match config.kind {
            NotifierKind::Discord if config.webhook_configured() => {
                Ok(Self::Discord(DiscordNotifier::new(config)?))
            }
            NotifierKind::Discord => {
                warn!("Webhook URL not configured, falling back to log notifier");
                Ok(Self::Log(LogNotifier::new("log", config.thresholds)))
            }
            NotifierKind::Log => Ok(Self::Log(LogNotifier::new("log", config.thresholds))),
            NotifierKind::None => Ok(Self::Disabled),
        }
    }
}

impl Notifier for NotifierSink {
    fn name(&self) -> &str {
        match self {
            Self::Discord(n) => n.name(),
            Self::Log(n) => n.name(),
            Self::Disabled => "none",
        }
    }

    async fn send_sensor_data(&self, reading: &Reading) -> bool {
        match self {
            Self::Discord(n) => n.send_sensor_data(reading).await,
            Self::Log(n) => n.send_sensor_data(reading).await,
            Self::Disabled => {
                debug!("Notifier disabled, reading not announced");
                false
            }
        }
    }

    async fn send_startup_message(&self) -> bool {
        match self {
            Self::Discord(n) => n.send_startup_message().await,
            Self::Log(n) => n.send_startup_message().await,
            Self::Disabled => false,
        }
    }

    async fn send_shutdown_message(&self) -> bool {
        match self {
            Self::Discord(n) => n.send_shutdown_message().await,
            Self::Log(n) => n.send_shutdown_message().await,
            Self::Disabled => false,
        }
    }

    async fn check_and_send_warning(&self, temperature: f64, humidity: f64) -> bool {
        match self {
            Self::Discord(n) => n.check_and_send_warning(temperature, humidity).await,
            Self::Log(n) => n.check_and_send_warning(temperature, humidity).await,
            Self::Disabled => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_warnings() {
        let t = WarningThresholds::default();
        assert!(threshold_warnings(&t, 25.0, 50.0).is_empty());

        let warnings = threshold_warnings(&t, 36.0, 15.0);
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::HighTemperature, WarningKind::LowHumidity]
        );
        assert!(warnings[0].message.contains("36.0°C"));

        let warnings = threshold_warnings(&t, 10.0, 80.0);
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(
            kinds,
            vec![WarningKind::LowTemperature, WarningKind::HighHumidity]
        );
    }

    #[test]
    fn test_status_labels() {
        let t = WarningThresholds::default();
        assert!(status_labels(&t, &Reading::new(25.0, 50.0)).is_empty());

        let reading = Reading::new(25.0, 50.0).with_air_quality(Some(1500.0));
        assert_eq!(status_labels(&t, &reading), vec!["💨 Poor air"]);
    }

    #[test]
    fn test_air_quality_grade() {
        assert_eq!(air_quality_grade(400.0), "excellent");
        assert_eq!(air_quality_grade(401.0), "good");
        assert_eq!(air_quality_grade(1000.0), "fair");
        assert_eq!(air_quality_grade(2000.0), "poor");
        assert_eq!(air_quality_grade(2500.0), "hazardous");
    }

    #[test]
    fn test_from_config_falls_back_to_log() {
        let config = NotifierConfig {
            kind: NotifierKind::Discord,
            ..Default::default()
        };
        let sink = NotifierSink::from_config(&config).unwrap();
        assert!(matches!(sink, NotifierSink::Log(_)));

        let config = NotifierConfig {
            kind: NotifierKind::None,
            ..Default::default()
        };
        assert_eq!(NotifierSink::from_config(&config).unwrap().name(), "none");
    }

    #[tokio::test]
    async fn test_disabled_sink_reports_false() {
        let sink = NotifierSink::Disabled;
        assert!(!sink.send_sensor_data(&Reading::new(20.0, 50.0)).await);
        assert!(!sink.check_and_send_warning(50.0, 50.0).await);
    }
}
