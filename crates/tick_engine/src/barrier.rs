//! DdlBarrier - outstanding DDL timestamps with a cached minimum

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::debug;

use contracts::{Timestamp, NO_BARRIER};

/// Set of in-flight DDL timestamps.
///
/// A DDL executor adds its timestamp before any externally visible effect
/// and removes it once the effect is durable. While any timestamp is
/// outstanding, tick reports beyond [`DdlBarrier::min`] are refused, so no
/// heartbeat can advance past an uncommitted schema change.
///
/// Invariant: `min()` equals the smallest outstanding timestamp, or
/// [`NO_BARRIER`] iff the set is empty.
#[derive(Debug)]
pub struct DdlBarrier {
    inner: Mutex<BarrierInner>,
}

#[derive(Debug)]
struct BarrierInner {
    pending: HashSet<Timestamp>,
    min_ts: Timestamp,
}

impl DdlBarrier {
    /// Create an empty barrier.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BarrierInner {
                pending: HashSet::new(),
                min_ts: NO_BARRIER,
            }),
        }
    }

    /// Insert `ts` into the outstanding set.
    ///
    /// `reason` is a free-form label retained only for diagnostics.
    pub fn add(&self, ts: Timestamp, reason: &str) {
        let mut inner = self.inner.lock().expect("ddl barrier lock poisoned");
        if ts < inner.min_ts {
            inner.min_ts = ts;
        }
        inner.pending.insert(ts);
        debug!(
            ts,
            min_ts = inner.min_ts,
            pending = inner.pending.len(),
            reason,
            "ddl timestamp added"
        );
    }

    /// Remove `ts` from the outstanding set.
    ///
    /// When the removed value was the cached minimum the remainder is
    /// rescanned; an emptied set resets the minimum to [`NO_BARRIER`].
    pub fn remove(&self, ts: Timestamp, reason: &str) {
        let mut inner = self.inner.lock().expect("ddl barrier lock poisoned");
        inner.pending.remove(&ts);
        debug!(ts, pending = inner.pending.len(), reason, "ddl timestamp removed");

        if inner.pending.is_empty() {
            inner.min_ts = NO_BARRIER;
        } else if inner.min_ts == ts {
            let recomputed = inner.pending.iter().copied().min().unwrap_or(NO_BARRIER);
            inner.min_ts = recomputed;
            debug!(min_ts = inner.min_ts, "ddl minimum recomputed");
        }
    }

    /// Smallest outstanding DDL timestamp, [`NO_BARRIER`] when none.
    pub fn min(&self) -> Timestamp {
        self.inner.lock().expect("ddl barrier lock poisoned").min_ts
    }

    /// Number of outstanding DDL timestamps.
    pub fn pending_count(&self) -> usize {
        self.inner
            .lock()
            .expect("ddl barrier lock poisoned")
            .pending
            .len()
    }
}

impl Default for DdlBarrier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_min_is_no_barrier() {
        let barrier = DdlBarrier::new();
        assert_eq!(barrier.min(), NO_BARRIER);
        assert_eq!(barrier.pending_count(), 0);
    }

    #[test]
    fn test_min_tracks_smallest() {
        let barrier = DdlBarrier::new();
        barrier.add(500, "create collection");
        barrier.add(300, "drop partition");
        barrier.add(700, "create index");
        assert_eq!(barrier.min(), 300);
    }

    #[test]
    fn test_remove_recomputes_min() {
        let barrier = DdlBarrier::new();
        barrier.add(300, "a");
        barrier.add(500, "b");

        barrier.remove(300, "a");
        assert_eq!(barrier.min(), 500);

        barrier.remove(500, "b");
        assert_eq!(barrier.min(), NO_BARRIER);
    }

    #[test]
    fn test_remove_non_min_keeps_cache() {
        let barrier = DdlBarrier::new();
        barrier.add(300, "a");
        barrier.add(500, "b");

        barrier.remove(500, "b");
        assert_eq!(barrier.min(), 300);
    }

    #[test]
    fn test_add_remove_round_trip() {
        let barrier = DdlBarrier::new();
        barrier.add(400, "outer");

        barrier.add(250, "inner");
        assert_eq!(barrier.min(), 250);
        barrier.remove(250, "inner");

        assert_eq!(barrier.min(), 400);
        assert_eq!(barrier.pending_count(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let barrier = DdlBarrier::new();
        barrier.add(100, "a");
        barrier.remove(999, "never added");
        assert_eq!(barrier.min(), 100);
    }
}
