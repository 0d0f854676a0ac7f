//! Byte-stream transport abstraction
//!
//! `DeviceLink` only needs four operations from the wire. Keeping them behind
//! a trait lets the same link drive a real serial port or the scripted
//! [`MockDevice`](crate::mock::MockDevice).

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, FlowControl, SerialPort};
use tracing::debug;

use crate::error::{DeviceLinkError, Result};

/// An open byte-stream connection
pub trait DeviceTransport: Send {
    /// Bytes that can be read without blocking
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read up to `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write the whole buffer
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Drop anything received but not yet read
    fn clear_input(&mut self) -> io::Result<()>;
}

/// Opens transports by port name
pub trait DeviceConnector: Send + Sync {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn DeviceTransport>>;
}

/// Connector for real serial ports
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialConnector;

impl DeviceConnector for SerialConnector {
    fn open(
        &self,
        port: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn DeviceTransport>> {
        let serial = serialport::new(port, baud_rate)
            .timeout(timeout)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| DeviceLinkError::connection(port, e.to_string()))?;

        debug!(port = %port, baud_rate, "Serial port opened");

        Ok(Box::new(SerialTransport { port: serial }))
    }
}

struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl DeviceTransport for SerialTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.port.bytes_to_read()? as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Read::read(&mut self.port, buf) {
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            other => other,
        }
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Write::write_all(&mut self.port, data)?;
        self.port.flush()
    }

    fn clear_input(&mut self) -> io::Result<()> {
        Ok(self.port.clear(ClearBuffer::Input)?)
    }
}
