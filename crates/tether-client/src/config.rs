//! Session configuration.
//!
//! Configuration can be loaded from:
//! - TOML configuration file
//! - Built-in defaults

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use tether_transport::LinkConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file could not be parsed.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum accepted inbound frame size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,

    /// Capacity of the inbound frame buffer.
    #[serde(default = "default_inbound_buffer")]
    pub inbound_buffer: usize,

    /// Capacity of the outbound command buffer.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

// Default value functions
fn default_max_message_size() -> usize {
    64 * 1024 // 64 KB
}

fn default_inbound_buffer() -> usize {
    256
}

fn default_outbound_buffer() -> usize {
    32
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
            inbound_buffer: default_inbound_buffer(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from the first config file found, or defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        let config_paths = [
            "tether.toml",
            "/etc/tether/tether.toml",
            "~/.config/tether/tether.toml",
        ];

        for path in &config_paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::from_file(expanded.as_ref());
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Derive the transport link settings.
    #[must_use]
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            max_message_size: self.max_message_size,
            inbound_buffer: self.inbound_buffer,
            outbound_buffer: self.outbound_buffer,
        }
    }
}
