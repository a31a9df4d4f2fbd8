//! Bridge and client settings

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use civ_link::{LinkConfig, SerialConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Server-side settings: where to listen and how to reach the radio
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BridgeSettings {
    /// Address to bind
    pub host: String,
    /// UDP port to bind
    pub port: u16,
    /// Serial port parameters
    #[serde(flatten)]
    pub serial: SerialConfig,
    /// Addressing and timing
    #[serde(flatten)]
    pub link: LinkConfig,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 6435,
            serial: SerialConfig::default(),
            link: LinkConfig::default(),
        }
    }
}

impl BridgeSettings {
    const FILE_NAME: &'static str = "server.json";

    /// Load from `path`, or from the config directory when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        load_json(path, Self::FILE_NAME)
    }

    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Client-side settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClientSettings {
    /// Bridge server host
    pub server_host: String,
    /// Bridge server port
    pub server_port: u16,
    /// How long to wait for a reply, in milliseconds
    pub timeout_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 6435,
            timeout_ms: 5000,
        }
    }
}

impl ClientSettings {
    const FILE_NAME: &'static str = "client.json";

    /// Load from `path`, or from the config directory when `None`
    pub fn load(path: Option<&Path>) -> Result<Self> {
        load_json(path, Self::FILE_NAME)
    }

    /// `host:port` of the server
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Get the XDG config directory for civ-bridge
/// Uses $XDG_CONFIG_HOME/civ-bridge, falls back to ~/.config/civ-bridge
fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        let path = PathBuf::from(xdg_config);
        if path.is_absolute() {
            return Some(path.join("civ-bridge"));
        }
    }

    dirs::home_dir().map(|h| h.join(".config").join("civ-bridge"))
}

/// Read settings from an explicit file, or from `file_name` in the config
/// directory
///
/// An explicit file must exist and parse. The default file is optional and
/// falls back to defaults when missing or unreadable.
fn load_json<T>(path: Option<&Path>, file_name: &str) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    if let Some(path) = path {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()));
    }

    let Some(path) = config_dir().map(|dir| dir.join(file_name)) else {
        return Ok(T::default());
    };

    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Ignoring {}: {}", path.display(), e);
            T::default()
        })),
        Err(_) => {
            debug!("No settings at {}, using defaults", path.display());
            Ok(T::default())
        }
    }
}
