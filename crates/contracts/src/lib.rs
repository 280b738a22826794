//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-crate data structures
//! and traits for the time-tick synchronization core. All business crates
//! can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Timestamps are 64-bit hybrid logical clock values
//! - `0` means "unset"; `u64::MAX` is reserved as "no barrier"
//! - Only the per-channel minimum across sources is meaningful

mod broadcaster;
mod channel_name;
mod config;
mod error;
mod ids;
mod msg;
mod tick;
mod time;

pub use broadcaster::*;
pub use channel_name::ChannelName;
pub use config::*;
pub use error::*;
pub use ids::ProxyId;
pub use msg::*;
pub use tick::*;
pub use time::*;
