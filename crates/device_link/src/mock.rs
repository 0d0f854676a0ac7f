//! Scripted in-memory device
//!
//! Implements [`DeviceConnector`] and hands out transports that share one
//! script. Used for testing and development without hardware attached.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{DeviceLinkError, Result};
use crate::transport::{DeviceConnector, DeviceTransport};

#[derive(Debug, Default)]
struct MockState {
    incoming: VecDeque<u8>,
    written: Vec<String>,
    replies: HashMap<String, Vec<String>>,
    fail_open: bool,
    failing_reads: u32,
    max_chunk: Option<usize>,
    open_count: u32,
    clear_count: u32,
}

/// Mock device
///
/// Cloning yields another handle onto the same script, so a test can keep a
/// handle while the link owns the transport.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue one terminated line for the link to read
    pub fn push_line(&self, line: &str) {
        let mut state = self.state();
        state.incoming.extend(line.as_bytes());
        state.incoming.push_back(b'\n');
    }

    /// Queue raw bytes (no terminator added)
    pub fn push_bytes(&self, bytes: &[u8]) {
        self.state().incoming.extend(bytes);
    }

    /// Reply with `line` every time `command` is written
    pub fn reply_to(&self, command: &str, line: &str) {
        self.state()
            .replies
            .entry(command.to_string())
            .or_default()
            .push(line.to_string());
    }

    /// Make every subsequent `open` fail
    pub fn set_fail_open(&self, fail: bool) {
        self.state().fail_open = fail;
    }

    /// Fail the next `n` reads with an I/O error
    pub fn fail_reads(&self, n: u32) {
        self.state().failing_reads = n;
    }

    /// Cap the bytes returned per read, to split records across reads
    pub fn set_max_chunk(&self, max: usize) {
        self.state().max_chunk = Some(max.max(1));
    }

    /// Command lines written so far (without terminator)
    pub fn written_commands(&self) -> Vec<String> {
        self.state().written.clone()
    }

    pub fn pending_bytes(&self) -> usize {
        self.state().incoming.len()
    }

    pub fn open_count(&self) -> u32 {
        self.state().open_count
    }

    /// How many times stale input was cleared
    pub fn clear_count(&self) -> u32 {
        self.state().clear_count
    }
}

impl DeviceConnector for MockDevice {
    fn open(
        &self,
        port: &str,
        _baud_rate: u32,
        _timeout: Duration,
    ) -> Result<Box<dyn DeviceTransport>> {
        let mut state = self.state();
        if state.fail_open {
            return Err(DeviceLinkError::connection(port, "no such device"));
        }
        state.open_count += 1;

        Ok(Box::new(MockTransport {
            device: self.clone(),
        }))
    }
}

struct MockTransport {
    device: MockDevice,
}

impl DeviceTransport for MockTransport {
    fn bytes_available(&mut self) -> io::Result<usize> {
        Ok(self.device.state().incoming.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.device.state();

        if state.failing_reads > 0 {
            state.failing_reads -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock read failure"));
        }

        let limit = state.max_chunk.unwrap_or(usize::MAX).min(buf.len());
        let n = limit.min(state.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(state.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        let mut state = self.device.state();
        let text = String::from_utf8_lossy(data);

        for command in text.split('\n').map(str::trim).filter(|c| !c.is_empty()) {
            state.written.push(command.to_string());

            if let Some(replies) = state.replies.get(command).cloned() {
                for reply in replies {
                    state.incoming.extend(reply.as_bytes());
                    state.incoming.push_back(b'\n');
                }
            }
        }
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        let mut state = self.device.state();
        state.incoming.clear();
        state.clear_count += 1;
        Ok(())
    }
}
