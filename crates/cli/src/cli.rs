//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// ticksyncd - time-tick synchronization coordinator
#[derive(Parser, Debug)]
#[command(
    name = "ticksyncd",
    author,
    version,
    about = "Time-tick synchronization coordinator core",
    long_about = "Fuses per-proxy time-tick reports into a monotonically advancing\n\
                  safe time per physical channel and publishes it as heartbeats,\n\
                  honoring in-flight DDL barriers.\n\n\
                  The `run` command drives the core with a simulated proxy fleet."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "TICKSYNCD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "TICKSYNCD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the coordinator core with simulated proxies
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "ticksyncd.toml", env = "TICKSYNCD_CONFIG")]
    pub config: PathBuf,

    /// Coordinator identity in the proxy id space
    #[arg(long, default_value = "1", env = "TICKSYNCD_COORDINATOR_ID")]
    pub coordinator_id: u64,

    /// Number of simulated proxies besides the coordinator
    #[arg(long, default_value = "2", env = "TICKSYNCD_PROXIES")]
    pub proxies: usize,

    /// Override channel count from configuration (0 = keep config value)
    #[arg(long, default_value = "0")]
    pub channels: usize,

    /// Stop after this many completed rounds (0 = unlimited)
    #[arg(long, default_value = "0", env = "TICKSYNCD_MAX_ROUNDS")]
    pub max_rounds: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "TICKSYNCD_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "TICKSYNCD_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "ticksyncd.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
