//! Configuration for a message port instance.

use serde::{Deserialize, Serialize};

/// Recommended upper bound for a payload, in bytes.
pub const DEFAULT_RECOMMENDED_PAYLOAD_BYTES: usize = 4096;

/// Tunables for the registry, router and gateway.
///
/// Every field has a default, so a partial (or empty) TOML file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagePortConfig {
    /// Sends above this size log a warning. The transport enforces the hard limit.
    pub recommended_payload_bytes: usize,
    /// Surface transport codes without a translation as `Unrecognized`
    /// instead of failing closed to `IoError`.
    pub passthrough_unmapped_codes: bool,
    /// Include payload key names in delivery debug logs.
    pub log_payload_keys: bool,
}

impl Default for MessagePortConfig {
    fn default() -> Self {
        Self {
            recommended_payload_bytes: DEFAULT_RECOMMENDED_PAYLOAD_BYTES,
            passthrough_unmapped_codes: false,
            log_payload_keys: false,
        }
    }
}

impl MessagePortConfig {
    /// Parse a config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}
