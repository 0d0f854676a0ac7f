//! `device` command implementation.

use anyhow::{Context, Result};
use device_link::{DeviceCommand, DeviceLink, DeviceLinkConfig};
use tracing::info;

use super::load_blueprint;
use crate::cli::{DeviceAction, DeviceArgs};
use crate::error::CliError;
use crate::pipeline::resolve_port;

/// Execute the `device` command
pub async fn run_device(args: &DeviceArgs) -> Result<()> {
    let blueprint = load_blueprint(&args.config, true)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let command = to_command(&args.action)?;
    let port = resolve_port(&blueprint.device, args.port.as_deref())
        .ok_or_else(|| CliError::device_unavailable("<none>"))?;

    info!(port = %port, command = %command, "Sending device command");

    let link = DeviceLink::serial(DeviceLinkConfig::from(&blueprint.device).with_port(port));

    // Opening a serial port blocks for the settle delay
    let outcome = tokio::task::spawn_blocking(move || {
        let outcome = execute(&link, command);
        link.disconnect();
        outcome
    })
    .await
    .context("Device task failed")??;

    println!("{outcome}");
    Ok(())
}

fn to_command(action: &DeviceAction) -> Result<DeviceCommand> {
    let command = match *action {
        DeviceAction::Ping => DeviceCommand::Ping,
        DeviceAction::Read => DeviceCommand::Read,
        DeviceAction::Buzz => DeviceCommand::Buzz,
        DeviceAction::SetColor { r, g, b } => {
            DeviceCommand::set_color(r, g, b).context("Invalid colour")?
        }
        DeviceAction::AutoColor => DeviceCommand::AutoColor,
        DeviceAction::SetBuzzer { value } => DeviceCommand::SetBuzzer(value),
    };
    Ok(command)
}

/// Connect, run one command, describe the result
fn execute(link: &DeviceLink, command: DeviceCommand) -> std::result::Result<String, CliError> {
    if !link.connect() {
        return Err(CliError::device_unavailable(link.port()));
    }

    match command {
        DeviceCommand::Ping => {
            if link.ping() {
                Ok("pong".to_string())
            } else {
                Err(CliError::no_response(link.port(), command.to_string()))
            }
        }
        DeviceCommand::Read => match link.request_reading() {
            Some(r) => {
                let mut line = format!(
                    "temperature={:.1}°C humidity={:.1}%",
                    r.temperature, r.humidity
                );
                if let Some(hi) = r.heat_index {
                    line.push_str(&format!(" heat_index={hi:.1}°C"));
                }
                if let Some(ppm) = r.air_quality {
                    line.push_str(&format!(" air_quality={ppm:.0}ppm"));
                }
                Ok(line)
            }
            None => Err(CliError::no_response(link.port(), command.to_string())),
        },
        other => {
            if link.send(other) {
                Ok(format!("sent {other}"))
            } else {
                Err(CliError::no_response(link.port(), other.to_string()))
            }
        }
    }
}
