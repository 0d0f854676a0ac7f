//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{MonitorBlueprint, NotifierKind, StorageKind};
use serde::Serialize;
use tracing::info;

use super::load_blueprint;
use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    port: String,
    baud_rate: u32,
    notify_interval_secs: u64,
    storage: String,
    notifier: String,
    replicator_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    match load_blueprint(&args.config, false) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    port: blueprint.device.port.clone(),
                    baud_rate: blueprint.device.baud_rate,
                    notify_interval_secs: blueprint.acquisition.notify_interval_secs,
                    storage: format!("{:?}", blueprint.storage.kind),
                    notifier: format!("{:?}", blueprint.notifier.kind),
                    replicator_enabled: blueprint.replicator.is_configured(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &MonitorBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.notifier.kind == NotifierKind::Discord && !blueprint.notifier.webhook_configured()
    {
        warnings.push("notifier.webhook_url is not set - falling back to log notifier".to_string());
    }

    if blueprint.replicator.enabled && !blueprint.replicator.is_configured() {
        warnings.push(
            "replicator.enabled is set but endpoint/api_key are placeholders - replicator stays disabled"
                .to_string(),
        );
    }

    if blueprint.acquisition.force_simulation {
        warnings.push("acquisition.force_simulation is set - the device will not be used".to_string());
    }

    if blueprint.storage.kind == StorageKind::Memory {
        warnings.push("storage.kind = memory - readings are lost on exit".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  Port: {} @ {} baud", summary.port, summary.baud_rate);
            println!("  Notification interval: {}s", summary.notify_interval_secs);
            println!("  Storage: {}", summary.storage);
            println!("  Notifier: {}", summary.notifier);
            println!("  Replicator: {}", if summary.replicator_enabled { "enabled" } else { "disabled" });
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
