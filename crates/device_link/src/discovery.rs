//! Serial port discovery
//!
//! Best-effort: picks the first port whose description looks like a common
//! USB-to-serial adapter. Not finding one is not an error.

use serialport::SerialPortType;
use tracing::{debug, warn};

/// Adapter chips / boards we recognise (matched case-insensitively)
pub const KNOWN_ADAPTERS: [&str; 4] = ["arduino", "ch340", "usb serial", "usb-serial"];

/// One enumerated port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Enumerate serial ports with a human readable description
pub fn list_available_ports() -> Vec<PortInfo> {
    match serialport::available_ports() {
        Ok(ports) => ports
            .into_iter()
            .map(|p| PortInfo {
                description: describe(&p.port_type),
                name: p.port_name,
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, "Failed to enumerate serial ports");
            Vec::new()
        }
    }
}

/// Name of the first port that looks like the sensor board
pub fn find_device_port() -> Option<String> {
    let ports = list_available_ports();
    let found = match_device_port(&ports).map(|p| p.name.clone());

    match &found {
        Some(name) => debug!(port = %name, "Auto-detected device port"),
        None => debug!(candidates = ports.len(), "No known adapter found"),
    }

    found
}

/// First port whose description names a known adapter
pub fn match_device_port(ports: &[PortInfo]) -> Option<&PortInfo> {
    ports.iter().find(|p| {
        let description = p.description.to_lowercase();
        KNOWN_ADAPTERS.iter().any(|k| description.contains(k))
    })
}

fn describe(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(info) => {
            let parts: Vec<&str> = [info.manufacturer.as_deref(), info.product.as_deref()]
                .into_iter()
                .flatten()
                .collect();

            if parts.is_empty() {
                format!("USB {:04x}:{:04x}", info.vid, info.pid)
            } else {
                parts.join(" ")
            }
        }
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::Unknown => "Unknown".to_string(),
    }
}
