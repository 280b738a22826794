//! Pipeline run statistics.

use std::time::Duration;

use observability::TickSummary;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Participants in the tick table (simulated proxies + coordinator)
    pub proxies: usize,

    /// Channels per family
    pub channels: usize,

    /// Complete rounds drained to the dispatcher
    pub rounds_completed: u64,

    /// Complete rounds dropped on snapshot-queue overflow
    pub dropped_snapshots: u64,

    /// Idle-proxy warnings fired by the reducer
    pub idle_warnings: u64,

    /// Per-outcome tick statistics
    pub tick_summary: TickSummary,
}

impl PipelineStats {
    /// Completed rounds per second
    pub fn rounds_per_sec(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.rounds_completed as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Participants: {}", self.proxies);
        println!("Channels per family: {}", self.channels);
        println!(
            "Rounds completed: {} ({:.2}/s)",
            self.rounds_completed,
            self.rounds_per_sec()
        );
        println!("Snapshots dropped: {}", self.dropped_snapshots);
        println!("Idle warnings: {}", self.idle_warnings);
        println!();
        println!("{}", self.tick_summary);
    }
}
