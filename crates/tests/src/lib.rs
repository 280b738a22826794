//! # Integration Tests
//!
//! End-to-end tests over the real wiring: tick engine -> snapshot queue
//! -> dispatcher -> channel registry -> in-memory broadcaster.
//!
//! Responsibilities:
//! - Heartbeat scenarios (single proxy, convergence, DDL barriers)
//! - Degradation scenarios (idle proxies, queue overflow)
//! - Ordering properties under concurrent producers

#[cfg(test)]
mod harness {
    use std::sync::Arc;
    use std::time::Duration;

    use channels::{ChannelRegistry, MemoryBroadcaster};
    use contracts::{
        ChannelName, ChannelTimeTickMsg, ProxyId, TickSnapshot, Timestamp, WatchdogConfig,
    };
    use dispatcher::{Dispatcher, DispatcherConfig};
    use tick_engine::TickSync;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;
    use tokio::time::sleep;
    use tokio_util::sync::CancellationToken;

    pub const TICK_INTERVAL: Duration = Duration::from_millis(200);

    pub struct Core {
        pub broadcaster: Arc<MemoryBroadcaster>,
        pub tick_sync: Arc<TickSync>,
        pub cancel: CancellationToken,
        pub dispatcher_handle: JoinHandle<()>,
    }

    impl Core {
        /// Stop the dispatcher and wait for it to exit.
        pub async fn shutdown(self) {
            self.cancel.cancel();
            let _ = tokio::time::timeout(Duration::from_secs(2), self.dispatcher_handle).await;
        }
    }

    /// Registry + engine + running dispatcher over an in-memory stream.
    pub fn start_core(coordinator: u64, channel_names: &[&str], queue_capacity: usize) -> Core {
        let (tick_sync, snapshot_rx) =
            TickSync::new(ProxyId::new(coordinator), TICK_INTERVAL, queue_capacity);
        let (broadcaster, registry) = seed_registry(channel_names);
        let (cancel, dispatcher_handle) = start_dispatcher(coordinator, registry, snapshot_rx);

        Core {
            broadcaster,
            tick_sync,
            cancel,
            dispatcher_handle,
        }
    }

    pub fn seed_registry(
        channel_names: &[&str],
    ) -> (Arc<MemoryBroadcaster>, Arc<ChannelRegistry<MemoryBroadcaster>>) {
        let broadcaster = Arc::new(MemoryBroadcaster::new("mem"));
        let registry = Arc::new(ChannelRegistry::new("dml", Arc::clone(&broadcaster)));
        let names: Vec<ChannelName> = channel_names.iter().map(|n| ChannelName::from(*n)).collect();
        registry.add_channels(&names);
        (broadcaster, registry)
    }

    pub fn start_dispatcher(
        coordinator: u64,
        registry: Arc<ChannelRegistry<MemoryBroadcaster>>,
        snapshot_rx: mpsc::Receiver<TickSnapshot>,
    ) -> (CancellationToken, JoinHandle<()>) {
        let cancel = CancellationToken::new();
        let dispatcher = Dispatcher::new(
            DispatcherConfig {
                source_id: ProxyId::new(coordinator),
                tick_interval: TICK_INTERVAL,
                watchdog: WatchdogConfig {
                    enabled: false,
                    interval_secs: 120,
                },
            },
            registry,
            snapshot_rx,
            cancel.clone(),
        );
        let handle = dispatcher.spawn();
        (cancel, handle)
    }

    pub fn tick(
        src: u64,
        names: &[&str],
        timestamps: &[Timestamp],
        default_ts: Timestamp,
    ) -> ChannelTimeTickMsg {
        ChannelTimeTickMsg::new(
            ProxyId::new(src),
            names.iter().map(|n| ChannelName::from(*n)).collect(),
            timestamps.to_vec(),
            default_ts,
        )
    }

    /// Poll until the broadcaster has published `count` packs.
    pub async fn wait_for_sends(broadcaster: &MemoryBroadcaster, count: usize) {
        for _ in 0..100 {
            if broadcaster.sent_count() >= count {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "timed out waiting for {} sends, got {}",
            count,
            broadcaster.sent_count()
        );
    }
}

#[cfg(test)]
mod heartbeat_scenarios {
    use crate::harness::*;
    use contracts::ContractError;
    use tick_engine::TickOutcome;

    /// Single proxy, single channel: one complete round publishes the
    /// reported timestamp.
    #[tokio::test]
    async fn test_single_proxy_single_channel() {
        let core = start_core(1, &["c0"], 16);

        let outcome = core
            .tick_sync
            .submit_tick(&tick(1, &["c0"], &[100], 100))
            .unwrap();
        assert_eq!(outcome, TickOutcome::Accepted { round_ready: true });

        wait_for_sends(&core.broadcaster, 1).await;
        assert_eq!(core.broadcaster.timestamps_for(&"c0".into()), vec![100]);

        core.shutdown().await;
    }

    /// Two proxies: the published safe time is the cross-proxy minimum.
    #[tokio::test]
    async fn test_two_proxies_converge_to_minimum() {
        let core = start_core(1, &["c0"], 16);
        core.tick_sync.add_proxy(2.into());

        core.tick_sync
            .submit_tick(&tick(1, &["c0"], &[200], 200))
            .unwrap();
        core.tick_sync
            .submit_tick(&tick(2, &["c0"], &[150], 150))
            .unwrap();

        wait_for_sends(&core.broadcaster, 1).await;
        assert_eq!(core.broadcaster.timestamps_for(&"c0".into()), vec![150]);

        core.shutdown().await;
    }

    /// A channel absent from a proxy's report contributes its default
    /// timestamp to the minimum.
    #[tokio::test]
    async fn test_default_ts_fills_missing_channels() {
        let core = start_core(1, &["c0", "c1"], 16);
        core.tick_sync.add_proxy(2.into());

        core.tick_sync
            .submit_tick(&tick(1, &["c0", "c1"], &[500, 500], 500))
            .unwrap();
        // Proxy 2 only names c0; c1 falls back to its default 300.
        core.tick_sync
            .submit_tick(&tick(2, &["c0"], &[400], 300))
            .unwrap();

        wait_for_sends(&core.broadcaster, 2).await;
        assert_eq!(core.broadcaster.timestamps_for(&"c0".into()), vec![400]);
        assert_eq!(core.broadcaster.timestamps_for(&"c1".into()), vec![300]);

        core.shutdown().await;
    }

    /// An outstanding DDL blocks reports past it; removing the barrier
    /// lets the identical report through.
    #[tokio::test]
    async fn test_ddl_barrier_blocks_and_releases() {
        let core = start_core(1, &["c0"], 16);

        core.tick_sync.add_ddl(500, "create collection");
        let outcome = core
            .tick_sync
            .submit_tick(&tick(1, &["c0"], &[600], 600))
            .unwrap();
        assert_eq!(outcome, TickOutcome::Blocked);

        core.tick_sync.remove_ddl(500, "create collection");
        let outcome = core
            .tick_sync
            .submit_tick(&tick(1, &["c0"], &[600], 600))
            .unwrap();
        assert_eq!(outcome, TickOutcome::Accepted { round_ready: true });

        wait_for_sends(&core.broadcaster, 1).await;
        assert_eq!(core.broadcaster.timestamps_for(&"c0".into()), vec![600]);

        core.shutdown().await;
    }

    /// A regressing coordinator report is discarded without state change.
    #[tokio::test]
    async fn test_coordinator_regression_silently_dropped() {
        let core = start_core(1, &["c0"], 16);

        core.tick_sync
            .submit_tick(&tick(1, &["c0"], &[300], 300))
            .unwrap();
        wait_for_sends(&core.broadcaster, 1).await;

        let outcome = core
            .tick_sync
            .submit_tick(&tick(1, &["c0"], &[250], 250))
            .unwrap();
        assert_eq!(outcome, TickOutcome::Regressed);

        // No new broadcast and no fresh entry in the table.
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(core.broadcaster.timestamps_for(&"c0".into()), vec![300]);

        core.shutdown().await;
    }

    /// Malformed and unknown-proxy reports surface as errors.
    #[tokio::test]
    async fn test_rejections_surface_to_caller() {
        let core = start_core(1, &["c0"], 16);

        let err = core
            .tick_sync
            .submit_tick(&tick(1, &["c0"], &[], 100))
            .unwrap_err();
        assert!(matches!(err, ContractError::MalformedTick { .. }));

        let err = core
            .tick_sync
            .submit_tick(&tick(99, &["c0"], &[100], 100))
            .unwrap_err();
        assert!(matches!(err, ContractError::UnknownProxy { .. }));

        core.shutdown().await;
    }
}

#[cfg(test)]
mod degradation_scenarios {
    use crate::harness::*;
    use contracts::ProxyId;
    use tick_engine::TickSync;

    /// One idle proxy stalls rounds; the warning fires once per ten
    /// contributions from the active proxy.
    #[tokio::test]
    async fn test_idle_proxy_throttled_warning() {
        let core = start_core(1, &["c0"], 16);
        core.tick_sync.add_proxy(2.into());

        for i in 1..=30u64 {
            core.tick_sync
                .submit_tick(&tick(1, &["c0"], &[100 * i], 100 * i))
                .unwrap();
        }

        assert_eq!(core.tick_sync.idle_warnings(), 3);

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(core.broadcaster.sent_count(), 0);

        core.shutdown().await;
    }

    /// With the dispatcher paused, 20 complete rounds fit 16 queue slots;
    /// the remainder is dropped and the published sequence stays
    /// non-decreasing after resume.
    #[tokio::test]
    async fn test_queue_overflow_drops_then_resumes_monotonic() {
        let (tick_sync, snapshot_rx) = TickSync::new(ProxyId::new(1), TICK_INTERVAL, 16);

        for i in 1..=20u64 {
            tick_sync
                .submit_tick(&tick(1, &["c0"], &[100 * i], 100 * i))
                .unwrap();
        }
        assert_eq!(tick_sync.dropped_snapshots(), 4);

        // Resume: start the dispatcher on the backlog.
        let (broadcaster, registry) = seed_registry(&["c0"]);
        let (cancel, handle) = start_dispatcher(1, registry, snapshot_rx);

        wait_for_sends(&broadcaster, 16).await;
        let published = broadcaster.timestamps_for(&"c0".into());
        assert_eq!(published.len(), 16);
        assert!(published.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(published[0], 100);
        assert_eq!(*published.last().unwrap(), 1600);

        cancel.cancel();
        let _ = tokio::time::timeout(std::time::Duration::from_secs(2), handle).await;
    }

    /// Removing a never-reporting proxy completes the round for the rest.
    #[tokio::test]
    async fn test_proxy_departure_unblocks_round() {
        let core = start_core(1, &["c0"], 16);
        core.tick_sync.add_proxy(2.into());

        core.tick_sync
            .submit_tick(&tick(1, &["c0"], &[100], 100))
            .unwrap();
        core.tick_sync.remove_proxy(2.into());

        wait_for_sends(&core.broadcaster, 1).await;
        assert_eq!(core.broadcaster.timestamps_for(&"c0".into()), vec![100]);

        core.shutdown().await;
    }
}

#[cfg(test)]
mod ordering_properties {
    use crate::harness::*;
    use std::sync::Arc;

    /// Per-channel monotonicity: with every proxy's stream non-decreasing,
    /// the published sequence per channel is non-decreasing.
    #[tokio::test]
    async fn test_per_channel_monotonicity_across_rounds() {
        let core = start_core(1, &["c0", "c1"], 64);
        core.tick_sync.add_proxy(2.into());
        core.tick_sync.add_proxy(3.into());

        // Proxy streams advance at different rates; per-proxy order holds.
        for round in 1..=10u64 {
            let base = round * 100;
            core.tick_sync
                .submit_tick(&tick(1, &["c0", "c1"], &[base + 9, base + 5], base))
                .unwrap();
            core.tick_sync
                .submit_tick(&tick(2, &["c0"], &[base + 3], base + 1))
                .unwrap();
            core.tick_sync
                .submit_tick(&tick(3, &[], &[], base + 7))
                .unwrap();
        }

        wait_for_sends(&core.broadcaster, 20).await;
        for channel in ["c0", "c1"] {
            let published = core.broadcaster.timestamps_for(&channel.into());
            assert_eq!(published.len(), 10, "channel {channel}");
            assert!(
                published.windows(2).all(|w| w[0] <= w[1]),
                "channel {channel} regressed: {published:?}"
            );
        }

        core.shutdown().await;
    }

    /// DDL safety: while a barrier at T is outstanding, nothing above T
    /// is ever published.
    #[tokio::test]
    async fn test_no_heartbeat_past_outstanding_ddl() {
        let core = start_core(1, &["c0"], 64);
        core.tick_sync.add_ddl(1000, "alter collection");

        for i in 1..=10u64 {
            // Below the barrier: accepted. Above: blocked.
            core.tick_sync
                .submit_tick(&tick(1, &["c0"], &[i * 150], i * 150))
                .unwrap();
        }

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        let published = core.broadcaster.timestamps_for(&"c0".into());
        assert!(!published.is_empty());
        assert!(
            published.iter().all(|&ts| ts <= 1000),
            "heartbeat passed outstanding ddl: {published:?}"
        );

        core.shutdown().await;
    }

    /// Concurrent producers: parallel submitters never break per-channel
    /// ordering.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submitters_keep_order() {
        let core = start_core(1, &["c0"], 256);
        for id in 2..=4u64 {
            core.tick_sync.add_proxy(id.into());
        }

        let mut producers = Vec::new();
        for id in 1..=4u64 {
            let tick_sync = Arc::clone(&core.tick_sync);
            producers.push(tokio::spawn(async move {
                for round in 1..=50u64 {
                    let ts = round * 1000 + id;
                    let msg = tick(id, &["c0"], &[ts], ts);
                    tick_sync.submit_tick(&msg).unwrap();
                    tokio::task::yield_now().await;
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }

        // Let the dispatcher drain whatever rounds completed.
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        let published = core.broadcaster.timestamps_for(&"c0".into());
        assert!(
            published.windows(2).all(|w| w[0] <= w[1]),
            "published sequence regressed: {published:?}"
        );

        core.shutdown().await;
    }
}
