//! Notifier trait - notification sink interface
//!
//! Sinks are best-effort: every method reports success as a bool and logs
//! its own failures. Nothing here is allowed to propagate an error into the
//! acquisition loop.

use crate::Reading;

/// Notification sink
#[trait_variant::make(Notifier: Send)]
pub trait LocalNotifier {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Announce one reading
    async fn send_sensor_data(&self, reading: &Reading) -> bool;

    /// Announce that acquisition started
    async fn send_startup_message(&self) -> bool;

    /// Announce that acquisition stopped
    async fn send_shutdown_message(&self) -> bool;

    /// Send a warning for every violated threshold
    ///
    /// Returns true if at least one warning went out.
    async fn check_and_send_warning(&self, temperature: f64, humidity: f64) -> bool;
}
