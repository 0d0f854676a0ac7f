//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
///
/// Secrets are reported as configured / not configured only.
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    device: DeviceInfo,
    acquisition: contracts::AcquisitionConfig,
    storage: contracts::StorageConfig,
    notifier: NotifierInfo,
    replicator: ReplicatorInfo,
}

#[derive(Serialize)]
struct DeviceInfo {
    port: String,
    baud_rate: u32,
    auto_detect: bool,
    settle_delay_ms: u64,
}

#[derive(Serialize)]
struct NotifierInfo {
    kind: contracts::NotifierKind,
    webhook_configured: bool,
    thresholds: contracts::WarningThresholds,
}

#[derive(Serialize)]
struct ReplicatorInfo {
    enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    notify_remote: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config, false)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint);
    }

    Ok(())
}

fn build_config_info(blueprint: &MonitorBlueprint) -> ConfigInfo {
    let replicator = &blueprint.replicator;

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        device: DeviceInfo {
            port: blueprint.device.port.clone(),
            baud_rate: blueprint.device.baud_rate,
            auto_detect: blueprint.device.auto_detect,
            settle_delay_ms: blueprint.device.settle_delay_ms,
        },
        acquisition: blueprint.acquisition.clone(),
        storage: blueprint.storage.clone(),
        notifier: NotifierInfo {
            kind: blueprint.notifier.kind,
            webhook_configured: blueprint.notifier.webhook_configured(),
            thresholds: blueprint.notifier.thresholds,
        },
        replicator: ReplicatorInfo {
            enabled: replicator.is_configured(),
            endpoint: replicator
                .is_configured()
                .then(|| replicator.endpoint.clone()),
            notify_remote: replicator.notify_remote,
        },
    }
}

fn print_config_info(blueprint: &MonitorBlueprint) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║                 DHT Monitor Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let device = &blueprint.device;
    println!("🔌 Device");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Port: {}", device.port);
    println!("   ├─ Auto-detect: {}", device.auto_detect);
    println!("   ├─ Baud rate: {}", device.baud_rate);
    println!("   └─ Settle delay: {}ms", device.settle_delay_ms);

    let acq = &blueprint.acquisition;
    println!("\n⏱️  Acquisition");
    println!("   ├─ Notification interval: {}s", acq.notify_interval_secs);
    println!("   ├─ Tick: {}ms", acq.tick_ms);
    println!("   ├─ Persist timeout: {}ms", acq.persist_timeout_ms);
    println!("   └─ Forced simulation: {}", acq.force_simulation);

    println!("\n💾 Storage");
    println!("   ├─ Kind: {:?}", blueprint.storage.kind);
    println!("   └─ Path: {}", blueprint.storage.path.display());

    let notifier = &blueprint.notifier;
    let t = &notifier.thresholds;
    println!("\n📣 Notifier");
    println!("   ├─ Kind: {:?}", notifier.kind);
    println!(
        "   ├─ Webhook: {}",
        if notifier.webhook_configured() { "configured" } else { "not configured" }
    );
    println!("   ├─ Temperature: {}°C .. {}°C", t.temp_low, t.temp_high);
    println!("   └─ Humidity: {}% .. {}%", t.humidity_low, t.humidity_high);

    let replicator = &blueprint.replicator;
    println!("\n☁️  Replicator");
    if replicator.is_configured() {
        println!("   ├─ Endpoint: {}", replicator.endpoint);
        println!("   └─ Remote notifications: {}", replicator.notify_remote);
    } else {
        println!("   └─ Disabled");
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_not_exposed() {
        let mut blueprint = MonitorBlueprint::default();
        blueprint.replicator.enabled = true;
        blueprint.replicator.endpoint = "https://example.org".to_string();
        blueprint.replicator.api_key = "secret-key".to_string();
        blueprint.notifier.webhook_url = "https://hooks.example.org/abc".to_string();

        let json = serde_json::to_string(&build_config_info(&blueprint)).unwrap();
        assert!(!json.contains("secret-key"));
        assert!(!json.contains("hooks.example.org"));
        assert!(json.contains("https://example.org"));
        assert!(json.contains(r#""webhook_configured":true"#));
    }
}
