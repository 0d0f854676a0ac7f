//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the monitor.
//! Business crates depend on this crate only; reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Every `Reading` carries the wall-clock instant (UTC) at which it was accepted
//! - Throttling and scheduling use monotonic instants owned by the acquisition loop

mod blueprint;
mod error;
mod notifier;
mod reading;
mod store;

pub use blueprint::*;
pub use error::*;
pub use notifier::{LocalNotifier, Notifier};
pub use reading::{round_tenth, Reading, ReadingSource};
pub use store::{LocalReadingStore, ReadingStore};
