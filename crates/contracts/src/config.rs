//! Coordinator configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Time-tick coordinator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// Shared prefix for DML channel names
    #[serde(default = "default_dml_prefix")]
    pub dml_channel_prefix: String,

    /// Shared prefix for delta channel names
    #[serde(default = "default_delta_prefix")]
    pub delta_channel_prefix: String,

    /// Total physical channels per family
    #[serde(default = "default_channel_count")]
    pub channel_count: usize,

    /// Expected interval between proxy reports, in milliseconds.
    /// Also the threshold for the dispatcher's "too slow" warning.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Capacity of the reducer -> dispatcher snapshot queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Liveness watchdog configuration
    #[serde(default)]
    pub watchdog: WatchdogConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            dml_channel_prefix: default_dml_prefix(),
            delta_channel_prefix: default_delta_prefix(),
            channel_count: default_channel_count(),
            tick_interval_ms: default_tick_interval_ms(),
            queue_capacity: default_queue_capacity(),
            watchdog: WatchdogConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// Expected interval between proxy reports.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Liveness watchdog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Whether the watchdog task runs at all
    pub enabled: bool,

    /// Silence threshold in seconds before a warning fires
    pub interval_secs: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 120,
        }
    }
}

impl WatchdogConfig {
    /// Silence threshold as a duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_dml_prefix() -> String {
    "rootcoord-dml".to_string()
}

fn default_delta_prefix() -> String {
    "rootcoord-delta".to_string()
}

fn default_channel_count() -> usize {
    16
}

fn default_tick_interval_ms() -> u64 {
    200
}

fn default_queue_capacity() -> usize {
    16
}
