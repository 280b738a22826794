//! # Dispatcher
//!
//! Heartbeat fan-out module.
//!
//! Responsibilities:
//! - Consume complete tick rounds from the reducer's snapshot queue
//! - Compute the per-channel minimum and broadcast one heartbeat each
//! - Surface stalls through a liveness watchdog without ever failing

pub mod dispatcher;
pub mod watchdog;

pub use contracts::TickSnapshot;
pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use watchdog::Watchdog;
