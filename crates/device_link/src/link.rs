//! DeviceLink - owns the connection to the sensor board
//!
//! All I/O failures are converted into `bool` / `Option` results at this
//! boundary and logged; nothing here panics or propagates into callers that
//! only want the next reading.
//!
//! Continuous reading runs on one dedicated thread. Starting a reader always
//! stops the previous one first, and a per-link iteration lock plus a
//! generation counter make sure that a reader which missed its join window
//! can never run an iteration concurrently with its successor.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use contracts::{DeviceConfig, Reading};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::codec::LineBuffer;
use crate::command::DeviceCommand;
use crate::error::{DeviceLinkError, Result};
use crate::message::DeviceMessage;
use crate::transport::{DeviceConnector, DeviceTransport, SerialConnector};

const READ_CHUNK: usize = 256;

/// Link timing and addressing
#[derive(Debug, Clone)]
pub struct DeviceLinkConfig {
    /// Port name handed to the connector
    pub port: String,
    pub baud_rate: u32,
    /// Transport read timeout
    pub read_timeout: Duration,
    /// Wait after open for the board to finish rebooting
    pub settle_delay: Duration,
    /// Reader cadence when no input is pending
    pub poll_interval: Duration,
    /// Reader back-off after an I/O error
    pub error_backoff: Duration,
    /// Upper bound on waiting for the reader to exit
    pub join_timeout: Duration,
}

impl Default for DeviceLinkConfig {
    fn default() -> Self {
        Self::from(&DeviceConfig::default())
    }
}

impl From<&DeviceConfig> for DeviceLinkConfig {
    fn from(config: &DeviceConfig) -> Self {
        Self {
            port: config.port.clone(),
            baud_rate: config.baud_rate,
            read_timeout: config.read_timeout(),
            settle_delay: config.settle_delay(),
            poll_interval: Duration::from_millis(100),
            error_backoff: Duration::from_secs(1),
            join_timeout: Duration::from_secs(2),
        }
    }
}

impl DeviceLinkConfig {
    /// Override the port (e.g. with an auto-detected one)
    pub fn with_port(mut self, port: impl Into<String>) -> Self {
        self.port = port.into();
        self
    }
}

/// Reader/parse counters
#[derive(Debug, Default)]
pub struct LinkMetrics {
    lines_parsed: AtomicU64,
    parse_errors: AtomicU64,
    io_errors: AtomicU64,
    bytes_discarded: AtomicU64,
    readings_delivered: AtomicU64,
    active_iterations: AtomicUsize,
    peak_iterations: AtomicUsize,
}

impl LinkMetrics {
    fn enter_iteration(&self) {
        let active = self.active_iterations.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_iterations.fetch_max(active, Ordering::SeqCst);
    }

    fn exit_iteration(&self) {
        self.active_iterations.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> LinkStats {
        LinkStats {
            lines_parsed: self.lines_parsed.load(Ordering::Relaxed),
            parse_errors: self.parse_errors.load(Ordering::Relaxed),
            io_errors: self.io_errors.load(Ordering::Relaxed),
            bytes_discarded: self.bytes_discarded.load(Ordering::Relaxed),
            readings_delivered: self.readings_delivered.load(Ordering::Relaxed),
            peak_concurrent_iterations: self.peak_iterations.load(Ordering::SeqCst),
        }
    }
}

/// Snapshot of link counters (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkStats {
    pub lines_parsed: u64,
    pub parse_errors: u64,
    pub io_errors: u64,
    /// Unterminated input dropped by the line codec
    pub bytes_discarded: u64,
    pub readings_delivered: u64,
    /// Highest number of read-loop iterations ever observed at once
    pub peak_concurrent_iterations: usize,
}

struct Connection {
    transport: Box<dyn DeviceTransport>,
    buffer: LineBuffer,
}

/// State shared with the reader thread
struct LinkShared {
    port: String,
    connection: Mutex<Option<Connection>>,
    last_parsed: Mutex<Option<DeviceMessage>>,
    running: AtomicBool,
    generation: AtomicU64,
    iteration: Mutex<()>,
    metrics: LinkMetrics,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LinkShared {
    /// Pull at most one complete record off the wire
    ///
    /// `Ok(None)` means nothing complete is pending (partial bytes stay
    /// buffered). An unparseable line is logged and counted, and also ends
    /// the call with `Ok(None)`; the next poll resumes with the following line.
    fn poll_message(&self) -> Result<Option<DeviceMessage>> {
        let mut guard = lock(&self.connection);
        let conn = guard.as_mut().ok_or(DeviceLinkError::NotConnected)?;

        loop {
            if let Some(line) = conn.buffer.next_line() {
                match DeviceMessage::parse(&line) {
                    Ok(message) => {
                        self.metrics.lines_parsed.fetch_add(1, Ordering::Relaxed);
                        *lock(&self.last_parsed) = Some(message.clone());
                        return Ok(Some(message));
                    }
                    Err(e) => {
                        self.metrics.parse_errors.fetch_add(1, Ordering::Relaxed);
                        observability::record_device_parse_error();
                        warn!(port = %self.port, error = %e, "Discarding device line");
                        return Ok(None);
                    }
                }
            }

            let available = conn.transport.bytes_available()?;
            if available == 0 {
                return Ok(None);
            }

            let mut chunk = vec![0u8; available.min(READ_CHUNK)];
            let n = conn.transport.read(&mut chunk)?;
            if n == 0 {
                return Ok(None);
            }
            trace!(port = %self.port, bytes = n, "Read from device");
            let dropped = conn.buffer.extend(&chunk[..n]);
            if dropped > 0 {
                self.metrics
                    .bytes_discarded
                    .fetch_add(dropped as u64, Ordering::Relaxed);
                warn!(port = %self.port, bytes = dropped, "Dropping unterminated device input");
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Sleep in small slices so a stop request is observed promptly
    fn pause(&self, generation: u64, total: Duration) {
        let slice = Duration::from_millis(20);
        let deadline = Instant::now() + total;

        while self.is_current(generation) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep(slice.min(deadline - now));
        }
    }
}

/// DeviceLink
///
/// Exactly one link owns a given connection. The link is `Sync`, so the
/// acquisition side may share it behind an `Arc` while the reader runs.
pub struct DeviceLink {
    config: DeviceLinkConfig,
    connector: Arc<dyn DeviceConnector>,
    shared: Arc<LinkShared>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl DeviceLink {
    /// Create a link that opens transports through `connector`
    pub fn new(config: DeviceLinkConfig, connector: Arc<dyn DeviceConnector>) -> Self {
        let shared = Arc::new(LinkShared {
            port: config.port.clone(),
            connection: Mutex::new(None),
            last_parsed: Mutex::new(None),
            running: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            iteration: Mutex::new(()),
            metrics: LinkMetrics::default(),
        });

        Self {
            config,
            connector,
            shared,
            reader: Mutex::new(None),
        }
    }

    /// Create a link backed by a real serial port
    pub fn serial(config: DeviceLinkConfig) -> Self {
        Self::new(config, Arc::new(SerialConnector))
    }

    pub fn port(&self) -> &str {
        &self.config.port
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.shared.connection).is_some()
    }

    /// Whether a continuous reader has been started and not stopped
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Open the connection, wait for the board to settle, drop stale input
    ///
    /// Returns false on any failure; the error has already been logged.
    pub fn connect(&self) -> bool {
        match self.try_connect() {
            Ok(()) => true,
            Err(e) => {
                error!(port = %self.config.port, error = %e, "Device connection failed");
                false
            }
        }
    }

    /// Typed variant of [`connect`](Self::connect)
    ///
    /// # Errors
    /// `Connection` when the port cannot be opened, `Io` when clearing fails.
    #[instrument(name = "device_connect", skip(self), fields(port = %self.config.port))]
    pub fn try_connect(&self) -> Result<()> {
        if self.is_connected() {
            debug!("Already connected");
            return Ok(());
        }

        let mut transport = self.connector.open(
            &self.config.port,
            self.config.baud_rate,
            self.config.read_timeout,
        )?;

        if !self.config.settle_delay.is_zero() {
            debug!(delay = ?self.config.settle_delay, "Waiting for device to settle");
            thread::sleep(self.config.settle_delay);
        }

        transport.clear_input().map_err(|e| {
            observability::record_device_io_error();
            DeviceLinkError::connection(&self.config.port, format!("clear input: {e}"))
        })?;

        *lock(&self.shared.connection) = Some(Connection {
            transport,
            buffer: LineBuffer::new(),
        });

        info!(
            port = %self.config.port,
            baud_rate = self.config.baud_rate,
            "Device connected"
        );
        Ok(())
    }

    /// Stop reading and close the connection. Idempotent.
    pub fn disconnect(&self) {
        self.stop_continuous_read();

        if lock(&self.shared.connection).take().is_some() {
            info!(port = %self.config.port, "Device disconnected");
        }
    }

    /// Write one command line; does not wait for a reply
    pub fn send_command(&self, text: &str) -> bool {
        let mut guard = lock(&self.shared.connection);
        let Some(conn) = guard.as_mut() else {
            warn!(command = %text, "Cannot send command: device not connected");
            return false;
        };

        match conn.transport.write_all(format!("{text}\n").as_bytes()) {
            Ok(()) => {
                debug!(command = %text, "Command sent");
                true
            }
            Err(e) => {
                self.shared.metrics.io_errors.fetch_add(1, Ordering::Relaxed);
                observability::record_device_io_error();
                error!(command = %text, error = %e, "Failed to send command");
                false
            }
        }
    }

    /// Send a typed command
    pub fn send(&self, command: DeviceCommand) -> bool {
        self.send_command(&command.to_string())
    }

    /// Non-blocking: parse one pending record, if any
    pub fn read_line(&self) -> Option<DeviceMessage> {
        match self.shared.poll_message() {
            Ok(message) => message,
            Err(DeviceLinkError::NotConnected) => None,
            Err(e) => {
                self.shared.metrics.io_errors.fetch_add(1, Ordering::Relaxed);
                observability::record_device_io_error();
                error!(port = %self.config.port, error = %e, "Device read failed");
                None
            }
        }
    }

    /// Poll [`read_line`](Self::read_line) until a record arrives or `timeout` elapses
    pub fn read_blocking(&self, timeout: Duration) -> Option<DeviceMessage> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(message) = self.read_line() {
                return Some(message);
            }

            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            thread::sleep(self.config.poll_interval.min(deadline - now));
        }
    }

    /// Send `READ` and wait up to 5 s for a complete reading
    ///
    /// Meant for one-shot use while no continuous reader is running.
    pub fn request_reading(&self) -> Option<Reading> {
        if !self.send(DeviceCommand::Read) {
            return None;
        }
        self.read_blocking(Duration::from_secs(5))
            .and_then(|m| m.reading())
    }

    /// Send `PING` and wait up to 2 s for a truthy `pong`
    pub fn ping(&self) -> bool {
        if !self.send(DeviceCommand::Ping) {
            return false;
        }
        self.read_blocking(Duration::from_secs(2))
            .is_some_and(|m| m.is_pong())
    }

    /// Most recently parsed record (reading or not)
    pub fn last_message(&self) -> Option<DeviceMessage> {
        lock(&self.shared.last_parsed).clone()
    }

    pub fn stats(&self) -> LinkStats {
        self.shared.metrics.snapshot()
    }

    /// Start the background reader
    ///
    /// `on_data` runs on the reader thread, synchronously, once per record
    /// that carries both temperature and humidity, in arrival order. Any
    /// previous reader is stopped first. Returns false when not connected.
    pub fn start_continuous_read<F>(&self, mut on_data: F) -> bool
    where
        F: FnMut(Reading) + Send + 'static,
    {
        if !self.is_connected() {
            warn!(port = %self.config.port, "Cannot start reader: device not connected");
            return false;
        }

        self.stop_continuous_read();

        let shared = Arc::clone(&self.shared);
        let generation = shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        shared.running.store(true, Ordering::SeqCst);

        let poll_interval = self.config.poll_interval;
        let error_backoff = self.config.error_backoff;

        let spawned = thread::Builder::new()
            .name("device-reader".to_string())
            .spawn(move || {
                debug!(port = %shared.port, generation, "Reader thread started");

                while shared.is_current(generation) {
                    let outcome = {
                        let _iteration = lock(&shared.iteration);
                        // A successor may have started while we waited for the lock
                        if !shared.is_current(generation) {
                            break;
                        }
                        shared.metrics.enter_iteration();
                        let outcome = shared.poll_message();
                        shared.metrics.exit_iteration();
                        outcome
                    };

                    match outcome {
                        Ok(Some(message)) => match message.reading() {
                            Some(reading) => {
                                shared
                                    .metrics
                                    .readings_delivered
                                    .fetch_add(1, Ordering::Relaxed);
                                on_data(reading);
                            }
                            None => {
                                debug!(fields = ?message.fields(), "Record without temp/humidity")
                            }
                        },
                        Ok(None) => shared.pause(generation, poll_interval),
                        Err(e) => {
                            shared.metrics.io_errors.fetch_add(1, Ordering::Relaxed);
                            observability::record_device_io_error();
                            error!(port = %shared.port, error = %e, "Reader error, backing off");
                            shared.pause(generation, error_backoff);
                        }
                    }
                }

                debug!(port = %shared.port, generation, "Reader thread stopped");
            });

        match spawned {
            Ok(handle) => {
                *lock(&self.reader) = Some(handle);
                info!(port = %self.config.port, "Continuous read started");
                true
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                error!(error = %e, "Failed to spawn reader thread");
                false
            }
        }
    }

    /// Request the reader to stop and wait for it, at most `join_timeout`
    ///
    /// Best effort: a reader still blocked after the window is detached. It
    /// exits at its next iteration check and never overlaps a new reader.
    pub fn stop_continuous_read(&self) {
        self.shared.running.store(false, Ordering::SeqCst);

        let Some(handle) = lock(&self.reader).take() else {
            return;
        };

        let deadline = Instant::now() + self.config.join_timeout;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }

        if handle.is_finished() {
            if handle.join().is_err() {
                error!(port = %self.config.port, "Reader thread panicked");
            }
            info!(port = %self.config.port, "Continuous read stopped");
        } else {
            warn!(
                port = %self.config.port,
                timeout = ?self.config.join_timeout,
                "Reader did not stop in time, detaching"
            );
        }
    }
}

impl Drop for DeviceLink {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }
}
