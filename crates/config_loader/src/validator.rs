//! Configuration validation.
//!
//! Rules:
//! - channel prefixes non-empty and distinct
//! - channel_count > 0
//! - tick_interval_ms > 0
//! - queue_capacity > 0
//! - watchdog interval > 0 when enabled

use contracts::{ContractError, CoordinatorConfig};

/// Validate a CoordinatorConfig.
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(config: &CoordinatorConfig) -> Result<(), ContractError> {
    validate_prefixes(config)?;
    validate_counts(config)?;
    validate_intervals(config)?;
    Ok(())
}

/// Channel name prefixes must be usable for the name transform.
fn validate_prefixes(config: &CoordinatorConfig) -> Result<(), ContractError> {
    if config.dml_channel_prefix.is_empty() {
        return Err(ContractError::config_validation(
            "dml_channel_prefix",
            "prefix cannot be empty",
        ));
    }
    if config.delta_channel_prefix.is_empty() {
        return Err(ContractError::config_validation(
            "delta_channel_prefix",
            "prefix cannot be empty",
        ));
    }
    if config.dml_channel_prefix == config.delta_channel_prefix {
        return Err(ContractError::config_validation(
            "delta_channel_prefix",
            "dml and delta prefixes must be distinct",
        ));
    }
    Ok(())
}

/// Structural counts must be positive.
fn validate_counts(config: &CoordinatorConfig) -> Result<(), ContractError> {
    if config.channel_count == 0 {
        return Err(ContractError::config_validation(
            "channel_count",
            "must be > 0",
        ));
    }
    if config.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "queue_capacity",
            "must be > 0",
        ));
    }
    Ok(())
}

/// Timing parameters must be positive.
fn validate_intervals(config: &CoordinatorConfig) -> Result<(), ContractError> {
    if config.tick_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "tick_interval_ms",
            "must be > 0",
        ));
    }
    if config.watchdog.enabled && config.watchdog.interval_secs == 0 {
        return Err(ContractError::config_validation(
            "watchdog.interval_secs",
            "must be > 0 when the watchdog is enabled",
        ));
    }
    Ok(())
}
