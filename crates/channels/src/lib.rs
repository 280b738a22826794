//! # Channels
//!
//! Physical channel management module.
//!
//! Responsibilities:
//! - Track the in-use channel set per family (DML and delta)
//! - Publish message packs to named channels via a [`TickBroadcaster`]
//! - Derive delta channel names from their DML siblings

pub mod broadcast;
pub mod name;
pub mod registry;

pub use broadcast::{LogBroadcaster, MemoryBroadcaster};
pub use contracts::{ChannelName, MsgPack, TickBroadcaster};
pub use name::{convert_channel_name, derive_delta_names, family_channel_names};
pub use registry::ChannelRegistry;
