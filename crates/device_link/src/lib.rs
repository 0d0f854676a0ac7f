//! # Device Link
//!
//! Connection to the DHT sensor board.
//!
//! Responsibilities:
//! - Open/close the byte-stream connection (serial port or mock)
//! - Split the stream into lines and parse structured records
//! - Send fire-and-forget commands
//! - Run one background reader delivering complete readings in order
//! - Best-effort port auto-detection

pub mod codec;
pub mod command;
pub mod discovery;
pub mod error;
pub mod link;
pub mod message;
pub mod mock;
pub mod transport;

pub use command::DeviceCommand;
pub use discovery::{find_device_port, list_available_ports, match_device_port, PortInfo};
pub use error::{DeviceLinkError, Result};
pub use link::{DeviceLink, DeviceLinkConfig, LinkStats};
pub use message::DeviceMessage;
pub use mock::MockDevice;
pub use transport::{DeviceConnector, DeviceTransport, SerialConnector};
