//! ChannelRegistry - in-use channel set plus broadcast fan-out

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use metrics::gauge;
use tracing::{debug, instrument, warn};

use contracts::{ChannelName, ContractError, MsgPack, TickBroadcaster};

/// Mutable set of in-use channels for one family, bound to a broadcaster.
///
/// The set is read-mostly: mutations take the internal write lock, which
/// is independent of the tick and DDL locks held elsewhere in the core.
pub struct ChannelRegistry<B> {
    family: String,
    broadcaster: Arc<B>,
    in_use: RwLock<HashSet<ChannelName>>,
}

impl<B> ChannelRegistry<B> {
    /// Create an empty registry for `family`.
    pub fn new(family: impl Into<String>, broadcaster: Arc<B>) -> Self {
        Self {
            family: family.into(),
            broadcaster,
            in_use: RwLock::new(HashSet::new()),
        }
    }

    /// Family label ("dml" or "delta" in a standard deployment).
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Register channels; already-registered names are ignored.
    pub fn add_channels(&self, names: &[ChannelName]) {
        let mut set = self.in_use.write().expect("channel set lock poisoned");
        for name in names {
            set.insert(name.clone());
        }
        let count = set.len();
        drop(set);
        debug!(family = %self.family, added = names.len(), in_use = count, "channels added");
        gauge!("ticksync_channels_in_use", "family" => self.family.clone()).set(count as f64);
    }

    /// Drop channels; absent names are ignored.
    pub fn remove_channels(&self, names: &[ChannelName]) {
        let mut set = self.in_use.write().expect("channel set lock poisoned");
        for name in names {
            set.remove(name.as_str());
        }
        let count = set.len();
        drop(set);
        debug!(family = %self.family, removed = names.len(), in_use = count, "channels removed");
        gauge!("ticksync_channels_in_use", "family" => self.family.clone()).set(count as f64);
    }

    /// Ordered snapshot of the in-use set.
    pub fn list_channels(&self) -> Vec<ChannelName> {
        let set = self.in_use.read().expect("channel set lock poisoned");
        let mut names: Vec<ChannelName> = set.iter().cloned().collect();
        names.sort();
        names
    }

    /// Number of in-use channels.
    pub fn channel_count(&self) -> usize {
        self.in_use
            .read()
            .expect("channel set lock poisoned")
            .len()
    }

    /// Whether `name` is currently registered.
    pub fn has_channel(&self, name: &ChannelName) -> bool {
        self.in_use
            .read()
            .expect("channel set lock poisoned")
            .contains(name.as_str())
    }

    /// Any currently-registered channel name.
    ///
    /// # Errors
    /// `NoChannels` when the family is empty.
    pub fn pick_one(&self) -> Result<ChannelName, ContractError> {
        self.in_use
            .read()
            .expect("channel set lock poisoned")
            .iter()
            .min()
            .cloned()
            .ok_or_else(|| ContractError::NoChannels {
                family: self.family.clone(),
            })
    }
}

impl<B: TickBroadcaster + Sync> ChannelRegistry<B> {
    /// Publish `pack` on every channel in `names`.
    ///
    /// All names are checked against the registered set before the first
    /// send; a failing send aborts the broadcast. The underlying stream
    /// may have accepted earlier sends - ordered retry is its concern.
    ///
    /// # Errors
    /// `ChannelNotRegistered` for an unknown name, `BroadcastFailed` when
    /// a single-channel send fails.
    #[instrument(
        name = "registry_broadcast",
        skip(self, names, pack),
        fields(family = %self.family, channels = names.len())
    )]
    pub async fn broadcast(
        &self,
        names: &[ChannelName],
        pack: &MsgPack,
    ) -> Result<(), ContractError> {
        {
            let set = self.in_use.read().expect("channel set lock poisoned");
            for name in names {
                if !set.contains(name.as_str()) {
                    return Err(ContractError::ChannelNotRegistered {
                        channel: name.to_string(),
                        family: self.family.clone(),
                    });
                }
            }
        }

        for name in names {
            if let Err(e) = self.broadcaster.send(name, pack).await {
                warn!(family = %self.family, channel = %name, error = %e, "channel send failed");
                return Err(ContractError::broadcast_failed(name.as_str(), e.to_string()));
            }
        }
        Ok(())
    }
}
