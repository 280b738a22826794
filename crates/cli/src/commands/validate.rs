//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    dml_channel_prefix: String,
    delta_channel_prefix: String,
    channel_count: usize,
    tick_interval_ms: u64,
    queue_capacity: usize,
    watchdog_enabled: bool,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    dml_channel_prefix: config.dml_channel_prefix.clone(),
                    delta_channel_prefix: config.delta_channel_prefix.clone(),
                    channel_count: config.channel_count,
                    tick_interval_ms: config.tick_interval_ms,
                    queue_capacity: config.queue_capacity,
                    watchdog_enabled: config.watchdog.enabled,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::CoordinatorConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if !config.watchdog.enabled {
        warnings.push("Watchdog disabled - heartbeat stalls will not be reported".to_string());
    }

    if config.queue_capacity < 4 {
        warnings.push(format!(
            "queue_capacity {} is very small - complete rounds will be dropped under light backpressure",
            config.queue_capacity
        ));
    }

    if config.tick_interval_ms < 10 {
        warnings.push(format!(
            "tick_interval_ms {} is aggressive - expect 'too slow' warnings",
            config.tick_interval_ms
        ));
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  DML prefix: {}", summary.dml_channel_prefix);
            println!("  Delta prefix: {}", summary.delta_channel_prefix);
            println!("  Channels per family: {}", summary.channel_count);
            println!("  Tick interval: {}ms", summary.tick_interval_ms);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Watchdog: {}", summary.watchdog_enabled);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
