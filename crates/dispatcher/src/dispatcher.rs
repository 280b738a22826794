//! Dispatcher - background loop publishing per-channel safe times

use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics::{gauge, histogram};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use channels::ChannelRegistry;
use contracts::{
    physical_millis, ChannelName, MsgPack, ProxyId, TickBroadcaster, TickSnapshot, TimeTickMsg,
    Timestamp, WatchdogConfig,
};

use crate::watchdog::Watchdog;

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Coordinator identity stamped into every heartbeat
    pub source_id: ProxyId,

    /// Expected tick cadence; iterations slower than this warn
    pub tick_interval: Duration,

    /// Liveness watchdog settings
    pub watchdog: WatchdogConfig,
}

/// Loop state; leaving `Running` is terminal for an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatcherState {
    Running,
    Stopped,
}

/// Background consumer of the reducer's snapshot queue.
///
/// Each complete round is fanned out as one heartbeat per channel named
/// in the coordinator's own report, carrying the snapshot-wide minimum
/// timestamp for that channel. Broadcast failures are logged and healed
/// by the next round; nothing here is fatal.
pub struct Dispatcher<B> {
    config: DispatcherConfig,
    dml_channels: Arc<ChannelRegistry<B>>,
    input_rx: mpsc::Receiver<TickSnapshot>,
    cancel: CancellationToken,
    watchdog: Option<Watchdog>,
    state: DispatcherState,
}

impl<B: TickBroadcaster + Send + Sync + 'static> Dispatcher<B> {
    /// Create a dispatcher consuming `input_rx`. Starts the watchdog task
    /// immediately when enabled in `config`.
    pub fn new(
        config: DispatcherConfig,
        dml_channels: Arc<ChannelRegistry<B>>,
        input_rx: mpsc::Receiver<TickSnapshot>,
        cancel: CancellationToken,
    ) -> Self {
        let watchdog = config
            .watchdog
            .enabled
            .then(|| Watchdog::start("time_tick_sync", config.watchdog.interval()));

        Self {
            config,
            dml_channels,
            input_rx,
            cancel,
            watchdog,
            state: DispatcherState::Running,
        }
    }

    /// Run the dispatcher main loop.
    ///
    /// Returns when the snapshot queue closes or cancellation is
    /// observed. A snapshot being processed finishes its per-channel
    /// workers before the loop re-checks cancellation.
    #[instrument(name = "dispatcher_run", skip(self))]
    pub async fn run(mut self) {
        info!(source_id = %self.config.source_id, "dispatcher started");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    debug!("cancellation observed");
                    break;
                }
                maybe = self.input_rx.recv() => {
                    match maybe {
                        Some(snapshot) => self.process_snapshot(snapshot).await,
                        None => {
                            debug!("snapshot queue closed");
                            break;
                        }
                    }
                }
            }
        }

        self.input_rx.close();
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.stop();
        }
        self.transition(DispatcherState::Stopped);
        info!("dispatcher stopped");
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    fn transition(&mut self, next: DispatcherState) {
        debug!(from = ?self.state, to = ?next, "dispatcher state transition");
        self.state = next;
    }

    /// Fan one complete round out to its channels.
    #[instrument(
        name = "dispatcher_process_snapshot",
        level = "debug",
        skip(self, snapshot),
        fields(proxies = snapshot.len())
    )]
    async fn process_snapshot(&self, snapshot: TickSnapshot) {
        // The coordinator's own report carries the authoritative channel
        // list for this round.
        let Some(local) = snapshot.get(&self.config.source_id) else {
            debug!(source_id = %self.config.source_id, "coordinator report missing, skipping round");
            return;
        };
        if local.chan_ts.is_empty() {
            debug!("coordinator report names no channels, skipping round");
            return;
        }

        let started = Instant::now();
        let channels: Vec<(ChannelName, Timestamp)> = local
            .chan_ts
            .iter()
            .map(|(name, ts)| (name.clone(), *ts))
            .collect();
        let channel_count = channels.len();
        let snapshot = Arc::new(snapshot);

        let mut workers = Vec::with_capacity(channel_count);
        for (channel, ts) in channels {
            workers.push(self.spawn_channel_worker(channel, ts, Arc::clone(&snapshot)));
        }
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = ?e, "channel worker panicked");
            }
        }

        let span = started.elapsed();
        histogram!("ticksync_fanout_span_ms").record(span.as_millis() as f64);
        if span > self.config.tick_interval {
            warn!(
                channels = channel_count,
                span_ms = span.as_millis() as u64,
                "time tick fan-out too slow"
            );
        }

        if let Some(watchdog) = &self.watchdog {
            watchdog.poke();
        }
    }

    /// One worker per channel: reduce to the snapshot minimum, publish.
    fn spawn_channel_worker(
        &self,
        channel: ChannelName,
        local_ts: Timestamp,
        snapshot: Arc<TickSnapshot>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(&self.dml_channels);
        let source_id = self.config.source_id;

        tokio::spawn(async move {
            let min_ts = snapshot
                .values()
                .fold(local_ts, |min, report| min.min(report.ts_for(&channel)));

            let pack = MsgPack::single(TimeTickMsg::heartbeat(source_id, min_ts));
            match registry.broadcast(std::slice::from_ref(&channel), &pack).await {
                Ok(()) => {
                    gauge!(
                        "ticksync_channel_time_tick",
                        "channel" => channel.to_string()
                    )
                    .set(physical_millis(min_ts) as f64);
                }
                Err(e) => {
                    warn!(channel = %channel, error = %e, "time tick broadcast failed");
                }
            }
        })
    }
}
