//! LogBroadcaster - logs published packs via tracing

use contracts::{ChannelName, ContractError, MsgPack, TickBroadcaster};
use tracing::{info, instrument};

/// Broadcaster that logs pack summaries instead of touching a real stream.
///
/// Useful for local runs and demos where no message-stream backend exists.
pub struct LogBroadcaster {
    name: String,
}

impl LogBroadcaster {
    /// Create a new LogBroadcaster with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl TickBroadcaster for LogBroadcaster {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_broadcaster_send",
        skip(self, pack),
        fields(broadcaster = %self.name, channel = %channel)
    )]
    async fn send(&self, channel: &ChannelName, pack: &MsgPack) -> Result<(), ContractError> {
        info!(
            broadcaster = %self.name,
            channel = %channel,
            msgs = pack.msgs.len(),
            safe_ts = ?pack.heartbeat_ts(),
            "pack published"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ProxyId, TimeTickMsg};

    #[tokio::test]
    async fn test_log_broadcaster_send() {
        let broadcaster = LogBroadcaster::new("log");
        let pack = MsgPack::single(TimeTickMsg::heartbeat(ProxyId::new(1), 5));

        let result = broadcaster.send(&"dml_0".into(), &pack).await;
        assert!(result.is_ok());
        assert_eq!(broadcaster.name(), "log");
    }
}
