//! `ports` command implementation.

use anyhow::Result;
use device_link::{list_available_ports, match_device_port, PortInfo};
use tracing::info;

/// Execute the `ports` command
pub fn run_ports() -> Result<()> {
    let ports = list_available_ports();
    info!(count = ports.len(), "Serial ports enumerated");

    print!("{}", render_ports(&ports));
    Ok(())
}

fn render_ports(ports: &[PortInfo]) -> String {
    if ports.is_empty() {
        return "No serial ports found\n".to_string();
    }

    let detected = match_device_port(ports).map(|p| p.name.as_str());

    let mut out = String::from("Available serial ports:\n");
    for port in ports {
        let marker = if Some(port.name.as_str()) == detected { "*" } else { " " };
        out.push_str(&format!(" {marker} {:<20} {}\n", port.name, port.description));
    }
    if detected.is_some() {
        out.push_str("\n(* = auto-detected sensor board)\n");
    }
    out
}
