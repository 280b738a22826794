//! Heartbeat messages - Dispatcher output
//!
//! The broadcast shape consumed by downstream channel readers.

use serde::{Deserialize, Serialize};

use crate::{ProxyId, Timestamp};

/// Kind tag carried by every broadcast message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgType {
    /// Safe-time heartbeat
    TimeTick,
}

/// A single safe-time heartbeat.
///
/// Downstream readers treat the carried timestamp as "the channel is
/// complete up to here": every producer has dispatched at least this far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTickMsg {
    /// Message kind (always `TimeTick` for heartbeats)
    pub msg_type: MsgType,

    /// Message id; heartbeats carry 0
    pub msg_id: u64,

    /// The safe time being published
    pub timestamp: Timestamp,

    /// Identity of the publishing coordinator
    pub source_id: ProxyId,

    /// Begin of the covered range (equals `timestamp` for heartbeats)
    pub begin_ts: Timestamp,

    /// End of the covered range (equals `timestamp` for heartbeats)
    pub end_ts: Timestamp,

    /// Hash routing hints; heartbeats route to slot 0
    pub hash_values: Vec<u32>,
}

impl TimeTickMsg {
    /// Build a heartbeat carrying `ts` as the safe time.
    pub fn heartbeat(source_id: ProxyId, ts: Timestamp) -> Self {
        Self {
            msg_type: MsgType::TimeTick,
            msg_id: 0,
            timestamp: ts,
            source_id,
            begin_ts: ts,
            end_ts: ts,
            hash_values: vec![0],
        }
    }
}

/// A batch of messages published atomically to one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MsgPack {
    pub msgs: Vec<TimeTickMsg>,
}

impl MsgPack {
    /// Pack containing exactly one message.
    pub fn single(msg: TimeTickMsg) -> Self {
        Self { msgs: vec![msg] }
    }

    /// Safe time carried by a single-heartbeat pack, if it is one.
    pub fn heartbeat_ts(&self) -> Option<Timestamp> {
        match self.msgs.as_slice() {
            [msg] if msg.msg_type == MsgType::TimeTick => Some(msg.timestamp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_shape() {
        let msg = TimeTickMsg::heartbeat(ProxyId::new(7), 1234);

        assert_eq!(msg.msg_type, MsgType::TimeTick);
        assert_eq!(msg.msg_id, 0);
        assert_eq!(msg.timestamp, 1234);
        assert_eq!(msg.begin_ts, 1234);
        assert_eq!(msg.end_ts, 1234);
        assert_eq!(msg.hash_values, vec![0]);
        assert_eq!(msg.source_id, ProxyId::new(7));
    }

    #[test]
    fn test_pack_heartbeat_ts() {
        let pack = MsgPack::single(TimeTickMsg::heartbeat(ProxyId::new(1), 99));
        assert_eq!(pack.heartbeat_ts(), Some(99));
        assert_eq!(MsgPack::default().heartbeat_ts(), None);
    }
}
