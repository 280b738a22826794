//! Channel name derivation.
//!
//! Each DML channel has a deterministic delta sibling produced by a pure
//! prefix swap. Names that do not carry the expected prefix are rejected.

use contracts::{ChannelName, ContractError};

/// Swap `from_prefix` for `to_prefix` on a channel name.
///
/// # Errors
/// `InvalidChannelName` when `name` does not start with `from_prefix`.
pub fn convert_channel_name(
    name: &ChannelName,
    from_prefix: &str,
    to_prefix: &str,
) -> Result<ChannelName, ContractError> {
    match name.strip_prefix(from_prefix) {
        Some(suffix) => Ok(ChannelName::from(format!("{to_prefix}{suffix}"))),
        None => Err(ContractError::invalid_channel_name(
            name.as_str(),
            format!("expected prefix '{from_prefix}'"),
        )),
    }
}

/// Derive the delta sibling for every DML channel in `dml_names`.
///
/// Used when seeding both families from recovered membership; the first
/// invalid name aborts the whole derivation.
pub fn derive_delta_names(
    dml_names: &[ChannelName],
    dml_prefix: &str,
    delta_prefix: &str,
) -> Result<Vec<ChannelName>, ContractError> {
    dml_names
        .iter()
        .map(|name| convert_channel_name(name, dml_prefix, delta_prefix))
        .collect()
}

/// Generate the full name universe of one family: `{prefix}_{0..count}`.
pub fn family_channel_names(prefix: &str, count: usize) -> Vec<ChannelName> {
    (0..count)
        .map(|i| ChannelName::from(format!("{prefix}_{i}")))
        .collect()
}
