//! Error taxonomy, layered by source: config / membership / tick / channel

use thiserror::Error;

use crate::ProxyId;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Membership =====
    /// Tick report from a proxy the table does not know
    #[error("time tick from un-recognized proxy node {proxy_id}")]
    UnknownProxy { proxy_id: ProxyId },

    // ===== Tick reports =====
    /// Report failed shape validation
    #[error("malformed time tick: {message}")]
    MalformedTick { message: String },

    // ===== Channels =====
    /// Registry has no channels to pick from
    #[error("no channels registered in family '{family}'")]
    NoChannels { family: String },

    /// Broadcast named a channel outside the registered set
    #[error("channel '{channel}' is not registered in family '{family}'")]
    ChannelNotRegistered { channel: String, family: String },

    /// A single-channel send failed during a broadcast
    #[error("broadcast to channel '{channel}' failed: {message}")]
    BroadcastFailed { channel: String, message: String },

    /// Channel name does not match the expected prefix shape
    #[error("invalid channel name '{name}': {message}")]
    InvalidChannelName { name: String, message: String },

    // ===== Generic =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create a configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a malformed-tick error
    pub fn malformed_tick(message: impl Into<String>) -> Self {
        Self::MalformedTick {
            message: message.into(),
        }
    }

    /// Create a broadcast failure error
    pub fn broadcast_failed(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BroadcastFailed {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create an invalid-channel-name error
    pub fn invalid_channel_name(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidChannelName {
            name: name.into(),
            message: message.into(),
        }
    }
}
