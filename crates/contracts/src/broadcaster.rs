//! TickBroadcaster trait - message-stream output interface
//!
//! Defines the abstract interface to the underlying message stream.

use crate::{ChannelName, ContractError, MsgPack};

/// Message-stream publisher.
///
/// One implementation backs a whole channel family; sends to distinct
/// channels may run concurrently, so implementations take `&self` and
/// synchronize internally. Ordering within a single channel is the
/// implementation's responsibility.
#[trait_variant::make(TickBroadcaster: Send)]
pub trait LocalTickBroadcaster {
    /// Broadcaster name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Publish a message pack on one channel.
    ///
    /// # Errors
    /// Returns a send error (should include channel context)
    async fn send(&self, channel: &ChannelName, pack: &MsgPack) -> Result<(), ContractError>;
}
