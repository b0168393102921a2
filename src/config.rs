//! Alarm configuration parameters
//!
//! All tunable parameters for the motion-alert controller.  Defaults match
//! the shipped hardware; a partial JSON document can override any subset at
//! build time (`MOTIONALERT_CONFIG`).

use core::fmt;

use serde::{Deserialize, Serialize};

/// Longest accepted window.  Anything beyond this is almost certainly a
/// seconds/milliseconds mix-up.
pub const MAX_WINDOW_MS: u32 = 60_000;
/// Advertised name is `<prefix>-xxyyzz`; the prefix must leave room for
/// the suffix in a legacy advertising packet.
pub const MAX_NAME_PREFIX_LEN: usize = 16;

/// Core alarm configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    // --- Windows ---
    /// How long a single-side detection waits for confirmation (ms)
    pub pending_window_ms: u32,
    /// How long a confirmed alert stays latched (ms)
    pub alert_window_ms: u32,

    // --- Radio ---
    /// Prefix of the advertised BLE device name
    pub device_name_prefix: heapless::String<MAX_NAME_PREFIX_LEN>,

    // --- Inputs ---
    /// Sample the motion lines from the main loop instead of edge ISRs
    pub poll_inputs: bool,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        let mut device_name_prefix = heapless::String::new();
        let _ = device_name_prefix.push_str("motionalert");
        Self {
            pending_window_ms: 2_500,
            alert_window_ms: 4_000,
            device_name_prefix,
            poll_inputs: false,
        }
    }
}

impl AlarmConfig {
    /// Parse a (possibly partial) JSON override and validate the result.
    /// Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::InvalidJson)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pending_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("pending_window_ms must be > 0"));
        }
        if self.pending_window_ms > MAX_WINDOW_MS {
            return Err(ConfigError::ValidationFailed(
                "pending_window_ms must be <= 60000",
            ));
        }
        if self.alert_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("alert_window_ms must be > 0"));
        }
        if self.alert_window_ms > MAX_WINDOW_MS {
            return Err(ConfigError::ValidationFailed("alert_window_ms must be <= 60000"));
        }
        if self.device_name_prefix.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "device_name_prefix must not be empty",
            ));
        }
        if !self
            .device_name_prefix
            .bytes()
            .all(|b| b.is_ascii_graphic())
        {
            return Err(ConfigError::ValidationFailed(
                "device_name_prefix must be printable ASCII without spaces",
            ));
        }
        Ok(())
    }
}

/// Why a configuration override was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Not valid JSON, wrong field types, or a string too long for its buffer.
    InvalidJson,
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "invalid config JSON"),
            Self::ValidationFailed(msg) => write!(f, "config validation failed: {msg}"),
        }
    }
}
