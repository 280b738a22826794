//! Pipeline orchestrator - coordinates all components.
//!
//! Wires the channel families, tick engine, and dispatcher together and
//! drives them with a fleet of simulated proxy reporters.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use channels::{derive_delta_names, family_channel_names, ChannelRegistry, LogBroadcaster};
use contracts::{
    ChannelName, ChannelTimeTickMsg, CoordinatorConfig, ProxyId, TickOutcome, Timestamp,
};
use dispatcher::{Dispatcher, DispatcherConfig};
use observability::{record_proxy_count, record_submit_outcome, TickStatsAggregator};
use tick_engine::TickSync;

use super::{HlcClock, PipelineStats};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Coordinator core configuration
    pub config: CoordinatorConfig,

    /// Coordinator identity in the proxy id space
    pub coordinator_id: u64,

    /// Simulated proxies besides the coordinator
    pub proxy_count: usize,

    /// Stop after this many completed rounds (None = unlimited)
    pub max_rounds: Option<u64>,

    /// Run timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let coord_cfg = self.config.config.clone();

        // Initialize Metrics (optional)
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let coordinator_id = ProxyId::new(self.config.coordinator_id);

        // Seed both channel families
        info!("Seeding channel families...");
        let broadcaster = Arc::new(LogBroadcaster::new("msgstream"));

        let dml_channels = Arc::new(ChannelRegistry::new("dml", Arc::clone(&broadcaster)));
        let dml_names =
            family_channel_names(&coord_cfg.dml_channel_prefix, coord_cfg.channel_count);
        dml_channels.add_channels(&dml_names);

        let delta_channels = Arc::new(ChannelRegistry::new("delta", Arc::clone(&broadcaster)));
        let delta_names = derive_delta_names(
            &dml_names,
            &coord_cfg.dml_channel_prefix,
            &coord_cfg.delta_channel_prefix,
        )
        .context("Failed to derive delta channel names")?;
        delta_channels.add_channels(&delta_names);

        info!(
            dml = dml_channels.channel_count(),
            delta = delta_channels.channel_count(),
            "Channel families seeded"
        );

        // Engine + dispatcher
        let (tick_sync, snapshot_rx) = TickSync::new(
            coordinator_id,
            coord_cfg.tick_interval(),
            coord_cfg.queue_capacity,
        );
        let cancel = CancellationToken::new();

        let dispatcher = Dispatcher::new(
            DispatcherConfig {
                source_id: coordinator_id,
                tick_interval: coord_cfg.tick_interval(),
                watchdog: coord_cfg.watchdog.clone(),
            },
            Arc::clone(&dml_channels),
            snapshot_rx,
            cancel.clone(),
        );
        let dispatcher_handle = dispatcher.spawn();

        info!("Dispatcher started");

        // Register simulated proxies
        let mut proxy_ids = Vec::with_capacity(self.config.proxy_count);
        for i in 0..self.config.proxy_count {
            let id = ProxyId::new(self.config.coordinator_id + 1 + i as u64);
            tick_sync.add_proxy(id);
            proxy_ids.push(id);
        }
        record_proxy_count(tick_sync.proxy_count());

        info!(
            proxies = proxy_ids.len(),
            coordinator = %coordinator_id,
            "Proxy fleet registered"
        );

        // Start reporters; the coordinator carries the full channel list.
        let stats = Arc::new(Mutex::new(TickStatsAggregator::new()));
        let mut reporters = Vec::with_capacity(proxy_ids.len() + 1);
        reporters.push(spawn_reporter(
            Arc::clone(&tick_sync),
            coordinator_id,
            Some(dml_names.clone()),
            coord_cfg.tick_interval(),
            Arc::clone(&stats),
            cancel.clone(),
        ));
        for id in &proxy_ids {
            reporters.push(spawn_reporter(
                Arc::clone(&tick_sync),
                *id,
                None,
                coord_cfg.tick_interval(),
                Arc::clone(&stats),
                cancel.clone(),
            ));
        }

        // Wait for a stop condition
        let deadline = self.config.timeout.map(|t| start_time + t);
        loop {
            sleep(Duration::from_millis(50)).await;

            let rounds = stats
                .lock()
                .expect("stats lock poisoned")
                .rounds_completed;
            if let Some(max) = self.config.max_rounds {
                if rounds >= max {
                    info!(rounds, "Reached max rounds limit");
                    break;
                }
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    info!("Run timeout reached");
                    break;
                }
            }
        }

        // Shutdown
        info!("Shutting down pipeline...");
        cancel.cancel();
        for reporter in reporters {
            let _ = reporter.await;
        }
        let _ = tokio::time::timeout(Duration::from_secs(5), dispatcher_handle).await;

        let tick_summary = stats.lock().expect("stats lock poisoned").summary();
        let stats = PipelineStats {
            duration: start_time.elapsed(),
            proxies: self.config.proxy_count + 1,
            channels: coord_cfg.channel_count,
            rounds_completed: tick_summary.rounds_completed,
            dropped_snapshots: tick_sync.dropped_snapshots(),
            idle_warnings: tick_sync.idle_warnings(),
            tick_summary,
        };

        info!(
            duration_secs = stats.duration.as_secs_f64(),
            rounds_per_sec = format!("{:.2}", stats.rounds_per_sec()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// One simulated reporter: submits an HLC-stamped tick every interval.
///
/// The coordinator's reporter names every channel explicitly; ordinary
/// proxies cover the channels through their default timestamp.
fn spawn_reporter(
    tick_sync: Arc<TickSync>,
    source_id: ProxyId,
    channels: Option<Vec<ChannelName>>,
    interval: Duration,
    stats: Arc<Mutex<TickStatsAggregator>>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut clock = HlcClock::new();
        let mut ticker = tokio::time::interval(interval);
        let mut last_accepted: Option<Timestamp> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let ts = clock.tick();
            let msg = match &channels {
                Some(names) => ChannelTimeTickMsg::new(
                    source_id,
                    names.clone(),
                    vec![ts; names.len()],
                    ts,
                ),
                None => ChannelTimeTickMsg::default_only(source_id, ts),
            };

            match tick_sync.submit_tick(&msg) {
                Ok(outcome) => {
                    record_submit_outcome(source_id, &outcome);
                    let mut stats = stats.lock().expect("stats lock poisoned");
                    stats.update(source_id, &outcome);

                    if channels.is_some() && matches!(outcome, TickOutcome::Accepted { .. }) {
                        if let Some(prev) = last_accepted {
                            stats.coord_advance.push(
                                contracts::physical_millis(ts) as f64
                                    - contracts::physical_millis(prev) as f64,
                            );
                        }
                        last_accepted = Some(ts);
                    }
                }
                Err(e) => {
                    debug!(source_id = %source_id, error = %e, "tick rejected");
                    stats
                        .lock()
                        .expect("stats lock poisoned")
                        .update_rejected(source_id);
                }
            }
        }
        debug!(source_id = %source_id, "reporter stopped");
    })
}
