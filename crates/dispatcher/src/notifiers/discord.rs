//! DiscordNotifier - Discord-compatible webhook embeds

use chrono::Utc;
use contracts::{ContractError, Notifier, NotifierConfig, Reading, WarningThresholds};
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::{air_quality_grade, status_labels, threshold_warnings, Warning};
use crate::error::Result;

const FOOTER: &str = "DHT Sensor Monitor";

const COLOR_NORMAL: u32 = 0x00ff00;
const COLOR_WARNING: u32 = 0xff6600;
const COLOR_ALERT: u32 = 0xff0000;
const COLOR_STOPPED: u32 = 0x808080;

/// Notifier posting embeds to a webhook URL
pub struct DiscordNotifier {
    name: String,
    webhook_url: String,
    username: Option<String>,
    thresholds: WarningThresholds,
    client: Client,
}

impl DiscordNotifier {
    /// Create from config (the webhook URL is used as-is)
    pub fn new(config: &NotifierConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            name: "discord".to_string(),
            webhook_url: config.webhook_url.clone(),
            username: config.username.clone(),
            thresholds: config.thresholds,
            client,
        })
    }

    /// Embed announcing one reading
    fn sensor_embed(&self, reading: &Reading) -> Value {
        let mut summary = format!(
            "🌡️ **{:.1}°C** | 💧 **{:.1}%**",
            reading.temperature, reading.humidity
        );
        if let Some(heat_index) = reading.heat_index {
            summary.push_str(&format!(" | 🔥 **{heat_index:.1}°C**"));
        }
        if let Some(ppm) = reading.air_quality {
            summary.push_str(&format!(" | 💨 **{ppm:.0} ppm**"));
        }

        let labels = status_labels(&self.thresholds, reading);
        let (mut status, color) = if labels.is_empty() {
            ("✅ Normal".to_string(), COLOR_NORMAL)
        } else {
            (labels.join(" | "), COLOR_WARNING)
        };
        if let Some(ppm) = reading.air_quality {
            status.push_str(&format!(" (air {})", air_quality_grade(ppm)));
        }

        json!({
            "title": "🌡️ Temperature & Humidity Report",
            "description": summary,
            "color": color,
            "fields": [
                { "name": "📊 Status", "value": status, "inline": false }
            ],
            "footer": { "text": FOOTER },
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    fn warning_embed(warning: &Warning, temperature: f64, humidity: f64) -> Value {
        json!({
            "title": format!("⚠️ Warning: {}", warning.kind.title()),
            "description": warning.message,
            "color": COLOR_ALERT,
            "fields": [
                { "name": "🌡️ Temperature", "value": format!("**{temperature:.1}°C**"), "inline": true },
                { "name": "💧 Humidity", "value": format!("**{humidity:.1}%**"), "inline": true }
            ],
            "footer": { "text": format!("{FOOTER} - warning") },
            "timestamp": Utc::now().to_rfc3339(),
        })
    }

    fn build_payload(&self, embed: Value, content: Option<&str>) -> Value {
        let mut payload = json!({ "embeds": [embed] });

        if let Some(content) = content {
            payload["content"] = json!(content);
        }
        if let Some(username) = &self.username {
            payload["username"] = json!(username);
        }

        payload
    }

    async fn post(&self, payload: &Value) -> std::result::Result<(), ContractError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(|e| ContractError::notification(&self.name, e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(ContractError::notification(
            &self.name,
            format!("webhook returned {status}: {body}"),
        ))
    }

    /// Post and translate the outcome into the sink's bool contract
    async fn deliver(&self, what: &str, payload: Value) -> bool {
        match self.post(&payload).await {
            Ok(()) => {
                debug!(sink = %self.name, what, "Webhook delivered");
                observability::record_notification(&self.name, true);
                true
            }
            Err(e) => {
                warn!(sink = %self.name, what, error = %e, "Webhook delivery failed");
                observability::record_notification(&self.name, false);
                false
            }
        }
    }
}

impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "discord_send_sensor_data",
        skip(self, reading),
        fields(sink = %self.name)
    )]
    async fn send_sensor_data(&self, reading: &Reading) -> bool {
        let payload = self.build_payload(self.sensor_embed(reading), None);
        self.deliver("sensor_data", payload).await
    }

    async fn send_startup_message(&self) -> bool {
        let embed = json!({
            "title": "🚀 Monitor started",
            "description": "DHT temperature/humidity monitoring is running",
            "color": COLOR_NORMAL,
            "fields": [
                { "name": "📡 Status", "value": "Running", "inline": true }
            ],
            "footer": { "text": FOOTER },
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.deliver("startup", self.build_payload(embed, None)).await
    }

    async fn send_shutdown_message(&self) -> bool {
        let embed = json!({
            "title": "🔴 Monitor stopped",
            "description": "DHT temperature/humidity monitoring has stopped",
            "color": COLOR_STOPPED,
            "footer": { "text": FOOTER },
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.deliver("shutdown", self.build_payload(embed, None)).await
    }

    #[instrument(name = "discord_check_warning", skip(self), fields(sink = %self.name))]
    async fn check_and_send_warning(&self, temperature: f64, humidity: f64) -> bool {
        let mut sent = false;

        for warning in threshold_warnings(&self.thresholds, temperature, humidity) {
            let embed = Self::warning_embed(&warning, temperature, humidity);
            let payload = self.build_payload(embed, Some("@here ⚠️ Environment warning!"));
            sent |= self.deliver("warning", payload).await;
        }

        sent
    }
}
