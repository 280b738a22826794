//! ProxyTickTable - per-proxy last-known tick reports

use std::collections::HashMap;

use tracing::debug;

use contracts::{
    ChanTs, ChannelTimeTickMsg, ContractError, ProxyId, TickOutcome, TickSnapshot, Timestamp,
    TS_UNSET,
};

/// Table of the latest report per registered proxy.
///
/// An entry is `None` from proxy join until its first report, and again
/// after every drain; "every entry is `Some`" is the round-complete
/// signal. A `None` entry says nothing about liveness.
#[derive(Debug)]
pub struct ProxyTickTable {
    coordinator_id: ProxyId,
    entries: HashMap<ProxyId, Option<ChanTs>>,
    /// Highest default timestamp the coordinator has contributed.
    /// Survives drains so the coordinator's stream cannot regress
    /// between rounds.
    coord_high_water: Timestamp,
}

impl ProxyTickTable {
    /// Create a table with the coordinator pre-registered.
    ///
    /// The coordinator participates as an ordinary proxy; its report
    /// supplies the authoritative channel list for each round.
    pub fn new(coordinator_id: ProxyId) -> Self {
        let mut entries = HashMap::new();
        entries.insert(coordinator_id, None);
        Self {
            coordinator_id,
            entries,
            coord_high_water: TS_UNSET,
        }
    }

    /// Identity of the coordinator.
    pub fn coordinator_id(&self) -> ProxyId {
        self.coordinator_id
    }

    /// Register a proxy with an empty entry. Re-adding is a no-op.
    pub fn add_proxy(&mut self, id: ProxyId) {
        if self.entries.contains_key(&id) {
            return;
        }
        self.entries.insert(id, None);
        debug!(proxy_id = %id, proxies = self.entries.len(), "proxy added to tick table");
    }

    /// Drop a proxy. Returns whether a drain should be attempted: true
    /// iff the proxy was present and the removal leaves every remaining
    /// entry fresh.
    pub fn remove_proxy(&mut self, id: ProxyId) -> bool {
        if self.entries.remove(&id).is_none() {
            return false;
        }
        debug!(proxy_id = %id, proxies = self.entries.len(), "proxy removed from tick table");
        self.round_ready()
    }

    /// Mark the listed proxies stale by resetting their entries.
    /// Unknown ids are ignored.
    pub fn reset_many(&mut self, ids: &[ProxyId]) {
        for id in ids {
            if let Some(entry) = self.entries.get_mut(id) {
                *entry = None;
            }
        }
    }

    /// Number of registered proxies.
    pub fn proxy_count(&self) -> usize {
        self.entries.len()
    }

    /// Whether `id` is registered.
    pub fn is_registered(&self, id: ProxyId) -> bool {
        self.entries.contains_key(&id)
    }

    /// True iff the table is non-empty and every entry is fresh.
    pub fn round_ready(&self) -> bool {
        !self.entries.is_empty() && self.entries.values().all(|e| e.is_some())
    }

    /// Proxies that have not reported in the current round.
    pub fn idle_proxies(&self) -> Vec<ProxyId> {
        let mut idle: Vec<ProxyId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_none())
            .map(|(id, _)| *id)
            .collect();
        idle.sort();
        idle
    }

    /// Largest report counter among fresh entries.
    pub fn max_cnt(&self) -> u64 {
        self.entries
            .values()
            .flatten()
            .map(|entry| entry.cnt)
            .max()
            .unwrap_or(0)
    }

    /// Admit one report.
    ///
    /// `ddl_min` is the barrier minimum read before the table lock was
    /// taken; reports whose default timestamp exceeds it are blocked.
    ///
    /// # Errors
    /// `MalformedTick` on shape violations, `UnknownProxy` when the
    /// source is not registered. Neither mutates the table.
    pub fn submit(
        &mut self,
        msg: &ChannelTimeTickMsg,
        ddl_min: Timestamp,
    ) -> Result<TickOutcome, ContractError> {
        if msg.channel_names.len() != msg.timestamps.len() {
            return Err(ContractError::malformed_tick(format!(
                "{} channel names but {} timestamps",
                msg.channel_names.len(),
                msg.timestamps.len()
            )));
        }
        if msg.channel_names.is_empty() && msg.default_ts == TS_UNSET {
            return Err(ContractError::malformed_tick(
                "empty report with unset default timestamp",
            ));
        }

        let Some(prev) = self.entries.get(&msg.source_id) else {
            return Err(ContractError::UnknownProxy {
                proxy_id: msg.source_id,
            });
        };

        if msg.default_ts > ddl_min {
            debug!(
                source_id = %msg.source_id,
                default_ts = msg.default_ts,
                ddl_min,
                "ddl not finished, tick blocked"
            );
            return Ok(TickOutcome::Blocked);
        }

        if msg.source_id == self.coordinator_id
            && self.coord_high_water != TS_UNSET
            && msg.default_ts <= self.coord_high_water
        {
            debug!(
                source_id = %msg.source_id,
                default_ts = msg.default_ts,
                high_water = self.coord_high_water,
                "coordinator timestamp went backwards, tick discarded"
            );
            return Ok(TickOutcome::Regressed);
        }

        let cnt = prev.as_ref().map_or(1, |entry| entry.cnt + 1);
        self.entries
            .insert(msg.source_id, Some(ChanTs::from_msg(msg, cnt)));
        if msg.source_id == self.coordinator_id {
            self.coord_high_water = msg.default_ts;
        }

        Ok(TickOutcome::Accepted {
            round_ready: self.round_ready(),
        })
    }

    /// Move every fresh entry into a snapshot, leaving `None` in place.
    ///
    /// Callers must have established `round_ready()` under the same lock;
    /// entries that are still `None` are simply skipped.
    pub fn take_round(&mut self) -> TickSnapshot {
        let mut snapshot = TickSnapshot::with_capacity(self.entries.len());
        for (id, entry) in self.entries.iter_mut() {
            if let Some(report) = entry.take() {
                snapshot.insert(*id, report);
            }
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::NO_BARRIER;

    const COORD: ProxyId = ProxyId::new(1);

    fn tick(src: u64, default_ts: Timestamp) -> ChannelTimeTickMsg {
        ChannelTimeTickMsg::new(
            ProxyId::new(src),
            vec!["dml_0".into()],
            vec![default_ts],
            default_ts,
        )
    }

    #[test]
    fn test_coordinator_preregistered() {
        let table = ProxyTickTable::new(COORD);
        assert!(table.is_registered(COORD));
        assert_eq!(table.proxy_count(), 1);
        assert!(!table.round_ready());
    }

    #[test]
    fn test_add_proxy_idempotent() {
        let mut table = ProxyTickTable::new(COORD);
        table.add_proxy(ProxyId::new(2));
        table
            .submit(&tick(2, 100), NO_BARRIER)
            .unwrap();

        // Re-adding must not wipe the fresh entry.
        table.add_proxy(ProxyId::new(2));
        assert_eq!(table.idle_proxies(), vec![COORD]);
        assert_eq!(table.proxy_count(), 2);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut table = ProxyTickTable::new(COORD);
        assert!(!table.remove_proxy(ProxyId::new(9)));
        assert_eq!(table.proxy_count(), 1);
    }

    #[test]
    fn test_remove_last_idle_signals_drain() {
        let mut table = ProxyTickTable::new(COORD);
        table.add_proxy(ProxyId::new(2));
        table.submit(&tick(1, 100), NO_BARRIER).unwrap();

        // Proxy 2 never reported; removing it completes the round.
        assert!(table.remove_proxy(ProxyId::new(2)));
    }

    #[test]
    fn test_malformed_shapes() {
        let mut table = ProxyTickTable::new(COORD);

        let uneven = ChannelTimeTickMsg::new(COORD, vec!["dml_0".into()], vec![], 10);
        assert!(matches!(
            table.submit(&uneven, NO_BARRIER),
            Err(ContractError::MalformedTick { .. })
        ));

        let empty = ChannelTimeTickMsg::default_only(COORD, TS_UNSET);
        assert!(matches!(
            table.submit(&empty, NO_BARRIER),
            Err(ContractError::MalformedTick { .. })
        ));
        assert!(!table.round_ready());
    }

    #[test]
    fn test_unknown_proxy_rejected() {
        let mut table = ProxyTickTable::new(COORD);
        let err = table.submit(&tick(42, 100), NO_BARRIER).unwrap_err();
        assert!(matches!(err, ContractError::UnknownProxy { .. }));
    }

    #[test]
    fn test_barrier_blocks_report() {
        let mut table = ProxyTickTable::new(COORD);
        assert_eq!(table.submit(&tick(1, 600), 500).unwrap(), TickOutcome::Blocked);
        assert!(!table.round_ready());
    }

    #[test]
    fn test_coordinator_regression_discarded() {
        let mut table = ProxyTickTable::new(COORD);
        table.submit(&tick(1, 300), NO_BARRIER).unwrap();
        table.take_round();

        // The high-water mark survives the drain.
        assert_eq!(
            table.submit(&tick(1, 250), NO_BARRIER).unwrap(),
            TickOutcome::Regressed
        );
        assert_eq!(
            table.submit(&tick(1, 300), NO_BARRIER).unwrap(),
            TickOutcome::Regressed
        );
        assert!(matches!(
            table.submit(&tick(1, 301), NO_BARRIER).unwrap(),
            TickOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn test_other_proxies_may_regress() {
        let mut table = ProxyTickTable::new(COORD);
        table.add_proxy(ProxyId::new(2));
        table.submit(&tick(2, 300), NO_BARRIER).unwrap();
        assert!(matches!(
            table.submit(&tick(2, 200), NO_BARRIER).unwrap(),
            TickOutcome::Accepted { .. }
        ));
    }

    #[test]
    fn test_cnt_increments_and_resets() {
        let mut table = ProxyTickTable::new(COORD);
        table.submit(&tick(1, 100), NO_BARRIER).unwrap();
        table.submit(&tick(1, 200), NO_BARRIER).unwrap();
        assert_eq!(table.max_cnt(), 2);

        table.take_round();
        assert_eq!(table.max_cnt(), 0);

        table.submit(&tick(1, 300), NO_BARRIER).unwrap();
        assert_eq!(table.max_cnt(), 1);
    }

    #[test]
    fn test_round_ready_and_take_round() {
        let mut table = ProxyTickTable::new(COORD);
        table.add_proxy(ProxyId::new(2));

        let outcome = table.submit(&tick(1, 100), NO_BARRIER).unwrap();
        assert_eq!(outcome, TickOutcome::Accepted { round_ready: false });

        let outcome = table.submit(&tick(2, 150), NO_BARRIER).unwrap();
        assert_eq!(outcome, TickOutcome::Accepted { round_ready: true });

        let snapshot = table.take_round();
        assert_eq!(snapshot.len(), 2);
        assert!(!table.round_ready());
        assert_eq!(table.idle_proxies().len(), 2);
    }

    #[test]
    fn test_reset_many_marks_stale() {
        let mut table = ProxyTickTable::new(COORD);
        table.add_proxy(ProxyId::new(2));
        table.submit(&tick(1, 100), NO_BARRIER).unwrap();
        table.submit(&tick(2, 100), NO_BARRIER).unwrap();

        table.reset_many(&[ProxyId::new(2), ProxyId::new(99)]);
        assert_eq!(table.idle_proxies(), vec![ProxyId::new(2)]);
    }
}
