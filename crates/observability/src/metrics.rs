//! Tick metrics collection.
//!
//! Prometheus recording helpers plus an in-memory aggregator used for
//! end-of-run summaries.

use std::collections::HashMap;

use metrics::{counter, gauge};

use contracts::{ProxyId, TickOutcome};

/// Record the outcome of one submitted report.
pub fn record_submit_outcome(source_id: ProxyId, outcome: &TickOutcome) {
    counter!(
        "ticksync_submits_total",
        "source_id" => source_id.to_string(),
        "outcome" => outcome.label()
    )
    .increment(1);
}

/// Record the current number of registered proxies.
pub fn record_proxy_count(count: usize) {
    gauge!("ticksync_proxies").set(count as f64);
}

/// In-memory tick statistics aggregator.
///
/// Aggregates per-run statistics for the end-of-run summary; the
/// Prometheus recorder gets the same events through the record functions.
#[derive(Debug, Clone, Default)]
pub struct TickStatsAggregator {
    /// Reports accepted into the table
    pub accepted: u64,

    /// Reports discarded by the DDL barrier
    pub blocked: u64,

    /// Coordinator reports discarded for regressing
    pub regressed: u64,

    /// Reports rejected with an error (malformed / unknown proxy)
    pub rejected: u64,

    /// Accepted reports that completed a round
    pub rounds_completed: u64,

    /// Reports contributed per proxy
    pub per_proxy: HashMap<u64, u64>,

    /// Default-timestamp advance per accepted coordinator report
    pub coord_advance: RunningStats,
}

impl TickStatsAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the outcome of one submitted report.
    pub fn update(&mut self, source_id: ProxyId, outcome: &TickOutcome) {
        *self.per_proxy.entry(source_id.as_u64()).or_insert(0) += 1;
        match outcome {
            TickOutcome::Accepted { round_ready } => {
                self.accepted += 1;
                if *round_ready {
                    self.rounds_completed += 1;
                }
            }
            TickOutcome::Blocked => self.blocked += 1,
            TickOutcome::Regressed => self.regressed += 1,
        }
    }

    /// Fold in a rejected report.
    pub fn update_rejected(&mut self, source_id: ProxyId) {
        *self.per_proxy.entry(source_id.as_u64()).or_insert(0) += 1;
        self.rejected += 1;
    }

    /// Produce a summary report.
    pub fn summary(&self) -> TickSummary {
        let total = self.accepted + self.blocked + self.regressed + self.rejected;
        TickSummary {
            total_reports: total,
            accepted: self.accepted,
            blocked: self.blocked,
            regressed: self.regressed,
            rejected: self.rejected,
            rounds_completed: self.rounds_completed,
            accept_rate: if total > 0 {
                self.accepted as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            per_proxy: self.per_proxy.clone(),
            coord_advance: StatsSummary::from(&self.coord_advance),
        }
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Summary of one run
#[derive(Debug, Clone, Default)]
pub struct TickSummary {
    pub total_reports: u64,
    pub accepted: u64,
    pub blocked: u64,
    pub regressed: u64,
    pub rejected: u64,
    pub rounds_completed: u64,
    pub accept_rate: f64,
    pub per_proxy: HashMap<u64, u64>,
    pub coord_advance: StatsSummary,
}

impl std::fmt::Display for TickSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Tick Sync Summary ===")?;
        writeln!(f, "Total reports: {}", self.total_reports)?;
        writeln!(f, "Accepted: {} ({:.2}%)", self.accepted, self.accept_rate)?;
        writeln!(f, "Blocked by DDL barrier: {}", self.blocked)?;
        writeln!(f, "Coordinator regressions: {}", self.regressed)?;
        writeln!(f, "Rejected: {}", self.rejected)?;
        writeln!(f, "Rounds completed: {}", self.rounds_completed)?;
        writeln!(f, "Coordinator ts advance: {}", self.coord_advance)?;

        if !self.per_proxy.is_empty() {
            writeln!(f, "Reports per proxy:")?;
            let mut proxies: Vec<_> = self.per_proxy.iter().collect();
            proxies.sort();
            for (proxy, count) in proxies {
                writeln!(f, "  {}: {}", proxy, count)?;
            }
        }

        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics calculator (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// Sample count
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Mean value
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// Minimum value
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Maximum value
    pub fn max(&self) -> f64 {
        self.max
    }
}
