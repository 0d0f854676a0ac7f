//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::MonitorBlueprint;
use std::time::Duration;
use tracing::info;

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{print_report, Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config, true)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after applying command-line overrides")?;

    info!(
        port = %args.port.as_deref().unwrap_or(&blueprint.device.port),
        baud_rate = blueprint.device.baud_rate,
        simulate = blueprint.acquisition.force_simulation,
        interval_secs = blueprint.acquisition.notify_interval_secs,
        storage = ?blueprint.storage.kind,
        notifier = ?blueprint.notifier.kind,
        replicator = blueprint.replicator.is_configured(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint, args.port.as_deref());
        return Ok(());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        port_override: args.port.clone(),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting acquisition...");

    let report = pipeline
        .run(shutdown_signal())
        .await
        .context("Acquisition failed")?;

    info!(
        readings = report.stats.readings,
        errors = report.stats.errors,
        duration_secs = report.duration.as_secs_f64(),
        "Acquisition finished"
    );
    print_report(&report);

    info!("DHT Monitor finished");
    Ok(())
}

fn apply_overrides(blueprint: &mut MonitorBlueprint, args: &RunArgs) {
    if let Some(port) = &args.port {
        info!(port = %port, "Overriding serial port from CLI");
        blueprint.device.port = port.clone();
        blueprint.device.auto_detect = false;
    }
    if let Some(baud) = args.baud {
        info!(baud, "Overriding baud rate from CLI");
        blueprint.device.baud_rate = baud;
    }
    if args.simulate {
        info!("Simulation mode requested from CLI");
        blueprint.acquisition.force_simulation = true;
    }
    if let Some(interval) = args.interval {
        info!(interval, "Overriding notification interval from CLI");
        blueprint.acquisition.notify_interval_secs = interval;
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &MonitorBlueprint, port_override: Option<&str>) {
    println!("\n=== Configuration Summary ===\n");
    println!("Device:");
    if blueprint.acquisition.force_simulation {
        println!("  Disabled (simulation)");
    } else {
        println!(
            "  Port: {} (auto-detect: {})",
            port_override.unwrap_or(&blueprint.device.port),
            blueprint.device.auto_detect
        );
        println!("  Baud rate: {}", blueprint.device.baud_rate);
    }

    println!("\nAcquisition:");
    println!(
        "  Notification interval: {}s",
        blueprint.acquisition.notify_interval_secs
    );
    println!(
        "  Persist timeout: {}ms",
        blueprint.acquisition.persist_timeout_ms
    );

    println!("\nStorage: {:?} ({})", blueprint.storage.kind, blueprint.storage.path.display());
    println!("Notifier: {:?}", blueprint.notifier.kind);
    if blueprint.replicator.is_configured() {
        println!("Replicator: {}", blueprint.replicator.endpoint);
    } else {
        println!("Replicator: disabled");
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args() -> RunArgs {
        RunArgs {
            config: PathBuf::from("config.toml"),
            port: None,
            baud: None,
            simulate: false,
            interval: None,
            timeout: 0,
            dry_run: false,
            metrics_port: 0,
        }
    }

    #[test]
    fn test_overrides_applied() {
        let mut blueprint = MonitorBlueprint::default();
        let args = RunArgs {
            port: Some("COM3".to_string()),
            baud: Some(115_200),
            simulate: true,
            interval: Some(15),
            ..args()
        };

        apply_overrides(&mut blueprint, &args);
        assert_eq!(blueprint.device.port, "COM3");
        assert!(!blueprint.device.auto_detect);
        assert_eq!(blueprint.device.baud_rate, 115_200);
        assert!(blueprint.acquisition.force_simulation);
        assert_eq!(blueprint.acquisition.notify_interval_secs, 15);
    }

    #[test]
    fn test_zero_interval_override_fails_validation() {
        let mut blueprint = MonitorBlueprint::default();
        apply_overrides(
            &mut blueprint,
            &RunArgs {
                interval: Some(0),
                ..args()
            },
        );
        assert!(config_loader::ConfigLoader::validate(&blueprint).is_err());
    }
}
