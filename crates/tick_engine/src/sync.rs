//! TickSync - reducer facade tying table, barrier, and snapshot queue

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use metrics::counter;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info, instrument, warn};

use contracts::{ChannelTimeTickMsg, ContractError, ProxyId, TickOutcome, TickSnapshot, Timestamp};

use crate::barrier::DdlBarrier;
use crate::table::ProxyTickTable;

/// One idle warning per this many blocked rounds, independent of tick rate.
const IDLE_WARN_EVERY: u64 = 10;

/// Entry point of the fusion core.
///
/// Owns the tick table and the DDL barrier behind two independent locks
/// and feeds complete rounds into a bounded snapshot queue. The barrier
/// is always read before the table lock is taken and the two are never
/// held together; this ordering is fixed to prevent deadlock.
pub struct TickSync {
    tick_interval: Duration,
    table: Mutex<ProxyTickTable>,
    barrier: DdlBarrier,
    snapshot_tx: mpsc::Sender<TickSnapshot>,
    idle_warnings: AtomicU64,
    dropped_snapshots: AtomicU64,
}

impl TickSync {
    /// Create the facade and the receiving half of its snapshot queue.
    ///
    /// `tick_interval` is the expected proxy report cadence, used only to
    /// estimate idle durations in warnings. The queue holds at most
    /// `queue_capacity` undelivered rounds; older rounds are never
    /// displaced - an overflowing round is dropped instead.
    pub fn new(
        coordinator_id: ProxyId,
        tick_interval: Duration,
        queue_capacity: usize,
    ) -> (Arc<Self>, mpsc::Receiver<TickSnapshot>) {
        let (snapshot_tx, snapshot_rx) = mpsc::channel(queue_capacity);
        let sync = Arc::new(Self {
            tick_interval,
            table: Mutex::new(ProxyTickTable::new(coordinator_id)),
            barrier: DdlBarrier::new(),
            snapshot_tx,
            idle_warnings: AtomicU64::new(0),
            dropped_snapshots: AtomicU64::new(0),
        });
        (sync, snapshot_rx)
    }

    /// Admit one proxy report, draining the table if it completes a round.
    ///
    /// # Errors
    /// `MalformedTick` and `UnknownProxy` surface to the caller; blocked
    /// and regressed reports are silently discarded (`Ok` with the
    /// corresponding outcome) since they are expected under contention.
    #[instrument(
        name = "tick_sync_submit",
        level = "trace",
        skip(self, msg),
        fields(source_id = %msg.source_id, default_ts = msg.default_ts)
    )]
    pub fn submit_tick(&self, msg: &ChannelTimeTickMsg) -> Result<TickOutcome, ContractError> {
        // Barrier read happens on its own lock, released before the
        // table lock is taken.
        let ddl_min = self.barrier.min();

        let mut table = self.table.lock().expect("tick table lock poisoned");
        let outcome = table.submit(msg, ddl_min)?;

        counter!("ticksync_ticks_total", "outcome" => outcome.label()).increment(1);
        if matches!(outcome, TickOutcome::Accepted { .. }) {
            self.try_drain(&mut table);
        }
        Ok(outcome)
    }

    /// Register a proxy; re-adding is a no-op.
    pub fn add_proxy(&self, id: ProxyId) {
        self.table
            .lock()
            .expect("tick table lock poisoned")
            .add_proxy(id);
    }

    /// Drop a proxy. If the removal completes the current round the
    /// drain runs immediately, so a departed straggler cannot stall the
    /// remaining proxies.
    pub fn remove_proxy(&self, id: ProxyId) {
        let mut table = self.table.lock().expect("tick table lock poisoned");
        if table.remove_proxy(id) {
            self.try_drain(&mut table);
        }
    }

    /// Mark several proxies stale (entries reset to empty).
    pub fn reset_proxies(&self, ids: &[ProxyId]) {
        self.table
            .lock()
            .expect("tick table lock poisoned")
            .reset_many(ids);
    }

    /// Number of registered proxies.
    pub fn proxy_count(&self) -> usize {
        self.table
            .lock()
            .expect("tick table lock poisoned")
            .proxy_count()
    }

    /// Record an in-flight DDL timestamp.
    pub fn add_ddl(&self, ts: Timestamp, reason: &str) {
        self.barrier.add(ts, reason);
    }

    /// Clear a completed DDL timestamp.
    pub fn remove_ddl(&self, ts: Timestamp, reason: &str) {
        self.barrier.remove(ts, reason);
    }

    /// Smallest outstanding DDL timestamp.
    pub fn ddl_min(&self) -> Timestamp {
        self.barrier.min()
    }

    /// Idle-proxy warnings fired so far.
    pub fn idle_warnings(&self) -> u64 {
        self.idle_warnings.load(Ordering::Relaxed)
    }

    /// Complete rounds dropped because the snapshot queue was full.
    pub fn dropped_snapshots(&self) -> u64 {
        self.dropped_snapshots.load(Ordering::Relaxed)
    }

    /// Drain the table if the round is complete; caller holds the lock.
    ///
    /// An incomplete round aborts the drain, warning about the idle set
    /// once every [`IDLE_WARN_EVERY`] contributions so warning volume
    /// stays independent of the tick rate.
    fn try_drain(&self, table: &mut ProxyTickTable) {
        if table.proxy_count() == 0 {
            return;
        }

        let idle = table.idle_proxies();
        if !idle.is_empty() {
            let max_cnt = table.max_cnt();
            if max_cnt > 0 && max_cnt % IDLE_WARN_EVERY == 0 {
                self.idle_warnings.fetch_add(1, Ordering::Relaxed);
                warn!(
                    idle_proxies = ?idle,
                    idle_ms = self.tick_interval.as_millis() as u64 * max_cnt,
                    "proxy idle for a long time, round not complete"
                );
            }
            return;
        }

        // Entries are nulled here regardless of queue state: a dropped
        // snapshot is superseded by the next complete round.
        let snapshot = table.take_round();
        match self.snapshot_tx.try_send(snapshot) {
            Ok(()) => {
                counter!("ticksync_rounds_total", "status" => "queued").increment(1);
            }
            Err(TrySendError::Full(_)) => {
                self.dropped_snapshots.fetch_add(1, Ordering::Relaxed);
                counter!("ticksync_rounds_total", "status" => "dropped").increment(1);
                info!("snapshot queue full, round dropped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("snapshot queue closed, dispatcher stopped");
            }
        }
    }
}
