//! Tick reports - ProxyTickTable input and Reducer output
//!
//! Wire-facing report shape plus the installed table entry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ChannelName, ProxyId, Timestamp};

/// Per-proxy time-tick report as received from the RPC surface.
///
/// `channel_names` and `timestamps` are parallel vectors; channels absent
/// from the report fall back to `default_ts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelTimeTickMsg {
    /// Reporting node identity
    pub source_id: ProxyId,

    /// Channels explicitly covered by this report
    pub channel_names: Vec<ChannelName>,

    /// Timestamp per named channel (parallel to `channel_names`)
    pub timestamps: Vec<Timestamp>,

    /// Fallback timestamp for channels not named in this report
    pub default_ts: Timestamp,
}

impl ChannelTimeTickMsg {
    /// Build a report covering the named channels plus a fallback.
    pub fn new(
        source_id: ProxyId,
        channel_names: Vec<ChannelName>,
        timestamps: Vec<Timestamp>,
        default_ts: Timestamp,
    ) -> Self {
        Self {
            source_id,
            channel_names,
            timestamps,
            default_ts,
        }
    }

    /// Build a report carrying only a fallback timestamp.
    pub fn default_only(source_id: ProxyId, default_ts: Timestamp) -> Self {
        Self {
            source_id,
            channel_names: Vec::new(),
            timestamps: Vec::new(),
            default_ts,
        }
    }
}

/// Installed tick-table entry for one proxy.
///
/// `cnt` counts how many reports this proxy has contributed since its
/// entry was last drained; it restarts at 1 on the first fresh report.
#[derive(Debug, Clone)]
pub struct ChanTs {
    /// Channel -> highest dispatched timestamp
    pub chan_ts: HashMap<ChannelName, Timestamp>,

    /// Fallback for channels absent from `chan_ts`
    pub default_ts: Timestamp,

    /// Reports contributed since the entry became current
    pub cnt: u64,
}

impl ChanTs {
    /// Build an entry from a wire report. Caller supplies the counter
    /// value (previous count + 1, or 1 for a fresh entry).
    pub fn from_msg(msg: &ChannelTimeTickMsg, cnt: u64) -> Self {
        let chan_ts = msg
            .channel_names
            .iter()
            .cloned()
            .zip(msg.timestamps.iter().copied())
            .collect();
        Self {
            chan_ts,
            default_ts: msg.default_ts,
            cnt,
        }
    }

    /// Timestamp this proxy reported for `channel`, falling back to
    /// `default_ts` when the channel was not named.
    pub fn ts_for(&self, channel: &ChannelName) -> Timestamp {
        self.chan_ts
            .get(channel.as_str())
            .copied()
            .unwrap_or(self.default_ts)
    }
}

/// One complete drained round: every registered proxy's current report.
pub type TickSnapshot = HashMap<ProxyId, ChanTs>;

/// Result of admitting one tick report.
///
/// Shape and membership violations are surfaced as errors instead; the
/// variants here are the silent, expected-under-contention outcomes plus
/// acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Report installed. `round_ready` is true iff every registered proxy
    /// now has a fresh entry.
    Accepted { round_ready: bool },

    /// Report's default timestamp passed the DDL barrier; discarded.
    Blocked,

    /// Coordinator report did not advance its own timestamp; discarded.
    Regressed,
}

impl TickOutcome {
    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TickOutcome::Accepted { .. } => "accepted",
            TickOutcome::Blocked => "blocked",
            TickOutcome::Regressed => "regressed",
        }
    }
}
