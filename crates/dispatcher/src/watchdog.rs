//! Liveness watchdog - warns when heartbeat publishing goes silent

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Long-term silence checker.
///
/// The dispatcher pokes the watchdog after every completed iteration; a
/// separate periodic task compares the last poke against the configured
/// interval and warns operators when the gap grows too large. The
/// watchdog only observes - it never stops or fails the dispatcher.
pub struct Watchdog {
    name: String,
    anchor: Instant,
    last_poke_ms: Arc<AtomicU64>,
    stale_warnings: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

impl Watchdog {
    /// Start the checker task. The construction instant counts as the
    /// first poke.
    pub fn start(name: impl Into<String>, interval: Duration) -> Self {
        let name = name.into();
        let anchor = Instant::now();
        let last_poke_ms = Arc::new(AtomicU64::new(0));
        let stale_warnings = Arc::new(AtomicU64::new(0));

        let handle = tokio::spawn(check_loop(
            name.clone(),
            interval,
            anchor,
            Arc::clone(&last_poke_ms),
            Arc::clone(&stale_warnings),
        ));

        Self {
            name,
            anchor,
            last_poke_ms,
            stale_warnings,
            handle,
        }
    }

    /// Record activity now.
    pub fn poke(&self) {
        self.last_poke_ms
            .store(self.anchor.elapsed().as_millis() as u64, Ordering::Relaxed);
    }

    /// Warnings emitted so far.
    pub fn stale_warnings(&self) -> u64 {
        self.stale_warnings.load(Ordering::Relaxed)
    }

    /// Stop the checker task.
    pub fn stop(self) {
        self.handle.abort();
        debug!(checker = %self.name, "watchdog stopped");
    }
}

async fn check_loop(
    name: String,
    interval: Duration,
    anchor: Instant,
    last_poke_ms: Arc<AtomicU64>,
    stale_warnings: Arc<AtomicU64>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first interval tick completes immediately.
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let now_ms = anchor.elapsed().as_millis() as u64;
        let silent_ms = now_ms.saturating_sub(last_poke_ms.load(Ordering::Relaxed));
        if silent_ms >= interval.as_millis() as u64 {
            stale_warnings.fetch_add(1, Ordering::Relaxed);
            warn!(
                checker = %name,
                silent_ms,
                "no time tick synchronized within the check interval"
            );
        }
    }
}
