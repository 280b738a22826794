//! # Tick Engine
//!
//! Time-tick fusion module.
//!
//! Responsibilities:
//! - Track per-proxy tick reports in the [`ProxyTickTable`]
//! - Hold outstanding DDL timestamps in the [`DdlBarrier`]
//! - Drain complete rounds into a bounded snapshot queue via [`TickSync`]
//!
//! The engine never publishes anything itself; the dispatcher consumes
//! the snapshot queue and performs the per-channel fan-out.

mod barrier;
mod sync;
mod table;

pub use barrier::DdlBarrier;
pub use contracts::TickOutcome;
pub use sync::TickSync;
pub use table::ProxyTickTable;
