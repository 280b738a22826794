//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(args.config.display().to_string()).into());
    }

    // Load and parse configuration
    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if args.channels > 0 {
        info!(channels = args.channels, "Overriding channel count from CLI");
        config.channel_count = args.channels;
    }

    info!(
        dml_prefix = %config.dml_channel_prefix,
        delta_prefix = %config.delta_channel_prefix,
        channels = config.channel_count,
        tick_interval_ms = config.tick_interval_ms,
        queue_capacity = config.queue_capacity,
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&config);
        return Ok(());
    }

    // Build pipeline configuration
    let pipeline_config = PipelineConfig {
        config,
        coordinator_id: args.coordinator_id,
        proxy_count: args.proxies,
        max_rounds: if args.max_rounds == 0 {
            None
        } else {
            Some(args.max_rounds)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
    };

    let pipeline = Pipeline::new(pipeline_config);

    // Setup graceful shutdown handler
    let shutdown_signal = setup_shutdown_signal();

    info!("Starting pipeline...");

    tokio::select! {
        result = pipeline.run() => {
            match result {
                Ok(stats) => {
                    info!(
                        rounds = stats.rounds_completed,
                        dropped_snapshots = stats.dropped_snapshots,
                        duration_secs = stats.duration.as_secs_f64(),
                        "Pipeline completed successfully"
                    );

                    stats.print_summary();
                }
                Err(e) => {
                    return Err(e).context("Pipeline execution failed");
                }
            }
        }
        _ = shutdown_signal => {
            warn!("Received shutdown signal, stopping pipeline...");
        }
    }

    info!("ticksyncd finished");
    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(config: &contracts::CoordinatorConfig) {
    println!("\n=== Configuration Summary ===\n");
    println!("Channels:");
    println!("  DML prefix: {}", config.dml_channel_prefix);
    println!("  Delta prefix: {}", config.delta_channel_prefix);
    println!("  Count per family: {}", config.channel_count);
    println!("\nTiming:");
    println!("  Tick interval: {}ms", config.tick_interval_ms);
    println!("  Snapshot queue capacity: {}", config.queue_capacity);
    println!("\nWatchdog:");
    println!("  Enabled: {}", config.watchdog.enabled);
    println!("  Interval: {}s", config.watchdog.interval_secs);
    println!();
}
