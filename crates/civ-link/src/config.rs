//! Link configuration

use std::time::Duration;

use civ_protocol::frame::{CONTROLLER_ADDR, RADIO_ADDR};
use civ_protocol::PowerEncoding;
use serde::{Deserialize, Serialize};

/// Addressing and timing for one controller/radio session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// CI-V address of the radio
    pub radio_address: u8,
    /// CI-V address used by this controller
    pub controller_address: u8,
    /// How the radio packs power levels
    pub power_encoding: PowerEncoding,
    /// Longest wait for one frame, in milliseconds
    pub read_timeout_ms: u64,
    /// Longest wait for the matching reply, in milliseconds
    pub response_timeout_ms: u64,
    /// Pause after writing a frame, in milliseconds
    pub write_settle_ms: u64,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            radio_address: RADIO_ADDR,
            controller_address: CONTROLLER_ADDR,
            power_encoding: PowerEncoding::PackedBcd,
            read_timeout_ms: 1000,
            response_timeout_ms: 2000,
            write_settle_ms: 50,
        }
    }
}

impl LinkConfig {
    /// Per-read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Correlation window for one request
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Delay after each write
    pub fn write_settle(&self) -> Duration {
        Duration::from_millis(self.write_settle_ms)
    }
}

/// Serial port parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port name, e.g. `/dev/ttyUSB0` or `COM4`
    pub serial_port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// DTR line state after opening
    pub dtr: bool,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            serial_port: default_port().to_string(),
            baud_rate: 115_200,
            dtr: false,
        }
    }
}

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM4"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyUSB0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_config_default() {
        let config = LinkConfig::default();
        assert_eq!(config.radio_address, 0x94);
        assert_eq!(config.controller_address, 0xCE);
        assert_eq!(config.read_timeout(), Duration::from_secs(1));
        assert_eq!(config.response_timeout(), Duration::from_secs(2));
        assert_eq!(config.write_settle(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: LinkConfig =
            serde_json::from_str(r#"{"radio_address": 164, "power_encoding": "big_endian"}"#)
                .unwrap();
        assert_eq!(config.radio_address, 0xA4);
        assert_eq!(config.power_encoding, PowerEncoding::BigEndian);
        assert_eq!(config.response_timeout_ms, 2000);
    }

    #[test]
    fn test_serial_config_default() {
        let config = SerialConfig::default();
        assert_eq!(config.baud_rate, 115_200);
        assert!(!config.dtr);
    }
}
