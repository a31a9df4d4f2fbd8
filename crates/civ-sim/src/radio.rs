//! Virtual radio simulation
//!
//! Provides a simulated CI-V radio that answers frames written to it the
//! way a transceiver on the bus would: it echoes what it hears, replies to
//! reads with data frames and to writes with OK/NG status frames.

use std::collections::VecDeque;
use std::io;
use std::thread;
use std::time::Duration;

use civ_protocol::bcd::{bcd_be_to_u64, bcd_le_to_u64, u64_to_bcd_be, u64_to_bcd_le};
use civ_protocol::frame::{
    build_frame, frame_addresses, RADIO_ADDR, STATUS_NG, STATUS_OK,
};
use civ_protocol::value::{FREQUENCY_LEN, POWER_LEN, POWER_RAW_MAX};
use civ_protocol::{CivCommand, CivMode, FrameBuffer, ModeReading, PowerEncoding, Transport};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Highest QSK setting the radio accepts
const QSK_MAX: u8 = 2;
/// Highest filter index the radio accepts
const FILTER_INDEX_MAX: u64 = 31;

/// A simulated radio on the CI-V bus
#[derive(Debug)]
pub struct VirtualRadio {
    /// Unique identifier for this virtual radio
    id: String,
    /// CI-V address of this radio
    address: u8,
    /// How power levels are packed
    power_encoding: PowerEncoding,
    /// Current frequency in Hz
    frequency_hz: u64,
    /// Current mode byte
    mode: u8,
    /// Current filter index
    filter_index: u64,
    /// Current raw power level (0-255)
    power_raw: u64,
    /// Current QSK setting
    qsk: u8,
    /// Number of tune cycles started
    tune_count: u32,
    /// Reflect every received frame back onto the bus
    echo: bool,
    /// Ignore requests entirely
    silent: bool,
    /// Bytes other stations put on the bus ahead of each reply
    bus_noise: Vec<u8>,
    /// Partial frames written by the controller
    incoming: FrameBuffer,
    /// Bytes waiting to be read by the controller
    output: VecDeque<u8>,
    /// Every frame written by the controller
    received: Vec<Vec<u8>>,
}

/// Configuration for creating a virtual radio
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtualRadioConfig {
    /// Display name/identifier
    pub id: String,
    /// CI-V address of the radio
    pub civ_address: u8,
    /// Power level packing
    pub power_encoding: PowerEncoding,
    /// Initial frequency in Hz
    pub initial_frequency_hz: u64,
    /// Initial operating mode
    pub initial_mode: CivMode,
    /// Initial filter index
    pub initial_filter_index: u64,
    /// Initial raw power level (0-255)
    pub initial_power_raw: u64,
    /// Echo received frames like a real CI-V bus
    pub echo: bool,
}

impl Default for VirtualRadioConfig {
    fn default() -> Self {
        Self {
            id: "Virtual IC-7300".to_string(),
            civ_address: RADIO_ADDR,
            power_encoding: PowerEncoding::PackedBcd,
            initial_frequency_hz: 14_250_000, // 20m
            initial_mode: CivMode::Usb,
            initial_filter_index: 12,
            initial_power_raw: POWER_RAW_MAX,
            echo: true,
        }
    }
}

impl VirtualRadio {
    /// Create a new virtual radio with default settings
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_config(VirtualRadioConfig {
            id: id.into(),
            ..Default::default()
        })
    }

    /// Create a virtual radio from configuration
    pub fn from_config(config: VirtualRadioConfig) -> Self {
        Self {
            id: config.id,
            address: config.civ_address,
            power_encoding: config.power_encoding,
            frequency_hz: config.initial_frequency_hz,
            mode: config.initial_mode.code(),
            filter_index: config.initial_filter_index,
            power_raw: config.initial_power_raw.min(POWER_RAW_MAX),
            qsk: 0,
            tune_count: 0,
            echo: config.echo,
            silent: false,
            bus_noise: Vec::new(),
            incoming: FrameBuffer::new(),
            output: VecDeque::new(),
            received: Vec::new(),
        }
    }

    /// Get the radio's unique identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the CI-V address
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Get the current frequency in Hz
    pub fn frequency_hz(&self) -> u64 {
        self.frequency_hz
    }

    /// Set the frequency from the front panel
    pub fn set_frequency(&mut self, hz: u64) {
        self.frequency_hz = hz;
    }

    /// Get the current operating mode
    pub fn mode(&self) -> ModeReading {
        self.mode.into()
    }

    /// Set the mode byte directly, including values outside the mode table
    pub fn set_mode_code(&mut self, code: u8) {
        self.mode = code;
    }

    /// Get the current filter index
    pub fn filter_index(&self) -> u64 {
        self.filter_index
    }

    /// Get the raw power level (0-255)
    pub fn power_raw(&self) -> u64 {
        self.power_raw
    }

    /// Get the QSK setting
    pub fn qsk(&self) -> u8 {
        self.qsk
    }

    /// Number of tune cycles started
    pub fn tune_count(&self) -> u32 {
        self.tune_count
    }

    /// Enable or disable bus echo
    pub fn set_echo(&mut self, echo: bool) {
        self.echo = echo;
    }

    /// Stop answering requests (echo continues)
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    /// Queue raw bytes for the controller to read right now
    pub fn inject(&mut self, bytes: &[u8]) {
        self.output.extend(bytes.iter().copied());
    }

    /// Emit `bytes` between the echo and every reply, as another station would
    pub fn set_bus_noise(&mut self, bytes: &[u8]) {
        self.bus_noise = bytes.to_vec();
    }

    /// Frames written by the controller, oldest first
    pub fn received_frames(&self) -> &[Vec<u8>] {
        &self.received
    }

    /// Check if there is pending output
    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }

    /// Handle one complete frame from the controller
    fn handle_frame(&mut self, frame: Vec<u8>) {
        trace!("{} heard {:02X?}", self.id, frame);

        if self.echo {
            self.output.extend(frame.iter().copied());
        }

        let request = frame_addresses(&frame)
            .map(|(to, from)| (to, from, frame[4..frame.len() - 1].to_vec()));
        self.received.push(frame);

        let Some((to, from, body)) = request else {
            return;
        };
        if self.silent || to != self.address {
            return;
        }
        self.output.extend(self.bus_noise.iter().copied());

        let reply = match body.as_slice() {
            [code, subcode, data @ ..] => match CivCommand::lookup(*code, *subcode) {
                Some(command) => self.respond(command, data),
                None => vec![STATUS_NG],
            },
            _ => vec![STATUS_NG],
        };

        self.send(from, &reply);
    }

    /// Build the reply body for a command
    fn respond(&mut self, command: CivCommand, data: &[u8]) -> Vec<u8> {
        if data.is_empty() && !command.is_trigger() {
            let mut reply = vec![command.code(), command.subcode()];
            reply.extend(self.read_value(command));
            return reply;
        }

        let accepted = self.write_value(command, data);
        debug!(
            "{} {} {:02X?}: {}",
            self.id,
            command,
            data,
            if accepted { "OK" } else { "NG" }
        );
        if accepted {
            vec![STATUS_OK]
        } else {
            vec![STATUS_NG]
        }
    }

    fn read_value(&self, command: CivCommand) -> Vec<u8> {
        match command {
            CivCommand::Frequency => u64_to_bcd_le(self.frequency_hz, FREQUENCY_LEN),
            CivCommand::FilterWidth => u64_to_bcd_le(self.filter_index, 1),
            CivCommand::PowerOutput => match self.power_encoding {
                PowerEncoding::PackedBcd => u64_to_bcd_be(self.power_raw, POWER_LEN),
                PowerEncoding::BigEndian => (self.power_raw as u16).to_be_bytes().to_vec(),
            },
            CivCommand::Mode => vec![self.mode],
            CivCommand::Qsk => vec![self.qsk],
            CivCommand::Tune => Vec::new(),
        }
    }

    /// Apply a write; returns false when the radio would answer NG
    fn write_value(&mut self, command: CivCommand, data: &[u8]) -> bool {
        match command {
            CivCommand::Frequency => match bcd_le_to_u64(data) {
                Ok(hz) if data.len() == FREQUENCY_LEN => {
                    self.frequency_hz = hz;
                    true
                }
                _ => false,
            },
            CivCommand::FilterWidth => match bcd_le_to_u64(data) {
                Ok(index) if data.len() == 1 && index <= FILTER_INDEX_MAX => {
                    self.filter_index = index;
                    true
                }
                _ => false,
            },
            CivCommand::PowerOutput => {
                let raw = match (self.power_encoding, data) {
                    (PowerEncoding::PackedBcd, [_, _]) => bcd_be_to_u64(data).ok(),
                    (PowerEncoding::BigEndian, &[high, low]) => {
                        Some(u64::from(u16::from_be_bytes([high, low])))
                    }
                    _ => None,
                };
                match raw {
                    Some(raw) if raw <= POWER_RAW_MAX => {
                        self.power_raw = raw;
                        true
                    }
                    _ => false,
                }
            }
            CivCommand::Mode => match data {
                [code] if CivMode::from_code(*code).is_some() => {
                    self.mode = *code;
                    true
                }
                _ => false,
            },
            CivCommand::Qsk => match data {
                [level] if *level <= QSK_MAX => {
                    self.qsk = *level;
                    true
                }
                _ => false,
            },
            CivCommand::Tune => {
                self.tune_count += 1;
                true
            }
        }
    }

    /// Queue a frame from this radio to `to`
    fn send(&mut self, to: u8, body: &[u8]) {
        match build_frame(to, self.address, body) {
            Ok(frame) => {
                trace!("{} says {:02X?}", self.id, frame);
                self.output.extend(frame);
            }
            Err(e) => debug!("{} cannot frame reply: {}", self.id, e),
        }
    }

    fn take_through(&mut self, terminator: u8) -> Option<Vec<u8>> {
        let pos = self.output.iter().position(|&b| b == terminator)?;
        Some(self.output.drain(..=pos).collect())
    }
}

impl Default for VirtualRadio {
    fn default() -> Self {
        Self::from_config(VirtualRadioConfig::default())
    }
}

impl Transport for VirtualRadio {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.incoming.push_bytes(bytes);
        while let Some(frame) = self.incoming.next_frame() {
            self.handle_frame(frame);
        }
        Ok(())
    }

    fn read_until(&mut self, terminator: u8, timeout: Duration) -> io::Result<Vec<u8>> {
        if let Some(frame) = self.take_through(terminator) {
            return Ok(frame);
        }

        // An idle line: nothing terminated arrives within the window
        thread::sleep(timeout);
        self.output.clear();
        Ok(Vec::new())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.output.clear();
        Ok(())
    }
}
