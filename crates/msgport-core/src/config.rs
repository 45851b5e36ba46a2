//! Configuration loading from `~/.msgport/config.toml` with defaults.

use msgport_types::MessagePortConfig;
use std::path::{Path, PathBuf};
use tracing::info;

/// Load configuration from a TOML file, falling back to defaults.
///
/// A missing file is not an error. A file that cannot be read or parsed is
/// logged and ignored.
pub fn load_config(path: Option<&Path>) -> MessagePortConfig {
    let config_path = path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        info!(
            path = %config_path.display(),
            "Config file not found, using defaults"
        );
        return MessagePortConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(contents) => match MessagePortConfig::from_toml_str(&contents) {
            Ok(config) => {
                info!(path = %config_path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %config_path.display(),
                    "Failed to parse config, using defaults"
                );
                MessagePortConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %config_path.display(),
                "Failed to read config file, using defaults"
            );
            MessagePortConfig::default()
        }
    }
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    msgport_home().join("config.toml")
}

/// Get the default msgport home directory.
pub fn msgport_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".msgport")
}
