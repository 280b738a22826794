//! MemoryBroadcaster - records published packs for inspection
//!
//! The in-memory double used by tests and the simulated pipeline.

use std::collections::HashMap;
use std::sync::Mutex;

use contracts::{ChannelName, ContractError, MsgPack, TickBroadcaster, Timestamp};

/// Broadcaster that appends every pack to an in-memory log, preserving
/// per-channel publish order.
///
/// Channels listed in `fail_channels` reject sends, which lets tests
/// exercise the per-channel failure path without a real stream.
pub struct MemoryBroadcaster {
    name: String,
    sent: Mutex<Vec<(ChannelName, MsgPack)>>,
    fail_channels: Mutex<Vec<ChannelName>>,
}

impl MemoryBroadcaster {
    /// Create a new MemoryBroadcaster with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sent: Mutex::new(Vec::new()),
            fail_channels: Mutex::new(Vec::new()),
        }
    }

    /// Make future sends to `channel` fail.
    pub fn fail_channel(&self, channel: ChannelName) {
        self.fail_channels
            .lock()
            .expect("fail set lock poisoned")
            .push(channel);
    }

    /// Everything published so far, in send order.
    pub fn sent(&self) -> Vec<(ChannelName, MsgPack)> {
        self.sent.lock().expect("sent log lock poisoned").clone()
    }

    /// Number of packs published so far.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sent log lock poisoned").len()
    }

    /// Heartbeat timestamps published on `channel`, in publish order.
    pub fn timestamps_for(&self, channel: &ChannelName) -> Vec<Timestamp> {
        self.sent
            .lock()
            .expect("sent log lock poisoned")
            .iter()
            .filter(|(name, _)| name == channel)
            .filter_map(|(_, pack)| pack.heartbeat_ts())
            .collect()
    }

    /// Per-channel heartbeat timestamp sequences.
    pub fn timestamps_by_channel(&self) -> HashMap<ChannelName, Vec<Timestamp>> {
        let mut map: HashMap<ChannelName, Vec<Timestamp>> = HashMap::new();
        for (name, pack) in self.sent.lock().expect("sent log lock poisoned").iter() {
            if let Some(ts) = pack.heartbeat_ts() {
                map.entry(name.clone()).or_default().push(ts);
            }
        }
        map
    }

    /// Discard the recorded log.
    pub fn clear(&self) {
        self.sent.lock().expect("sent log lock poisoned").clear();
    }
}

impl TickBroadcaster for MemoryBroadcaster {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&self, channel: &ChannelName, pack: &MsgPack) -> Result<(), ContractError> {
        let failing = self
            .fail_channels
            .lock()
            .expect("fail set lock poisoned")
            .iter()
            .any(|c| c == channel);
        if failing {
            return Err(ContractError::broadcast_failed(
                channel.as_str(),
                "injected failure",
            ));
        }

        self.sent
            .lock()
            .expect("sent log lock poisoned")
            .push((channel.clone(), pack.clone()));
        Ok(())
    }
}
