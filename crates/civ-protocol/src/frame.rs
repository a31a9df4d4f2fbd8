//! CI-V frame codec
//!
//! # Frame Format
//! ```text
//! FE FE [to] [from] [cmd] [subcmd] [data...] FD
//! ```
//!
//! - `FE FE`: Preamble (two bytes)
//! - `to`: Destination address
//! - `from`: Source address
//! - `cmd`/`subcmd`: Command and sub-command bytes
//! - `data`: Variable length payload (BCD or enumerated bytes)
//! - `FD`: Terminator
//!
//! No byte stuffing exists on the wire, so a payload can never contain the
//! terminator. [`build_frame`] refuses such payloads.
//!
//! CI-V runs on a shared bus: every byte the controller sends comes straight
//! back as an echo before the radio answers. [`classify_frame`] tells the
//! two apart by their address pair.

use std::time::Duration;

use tracing::trace;

use crate::error::EncodeError;
use crate::transport::Transport;

/// CI-V frame preamble byte
pub const PREAMBLE: u8 = 0xFE;
/// CI-V frame terminator byte
pub const TERMINATOR: u8 = 0xFD;
/// Default controller address
pub const CONTROLLER_ADDR: u8 = 0xCE;
/// Default radio address (IC-7300)
pub const RADIO_ADDR: u8 = 0x94;
/// OK status byte from the radio
pub const STATUS_OK: u8 = 0xFB;
/// NG (rejected) status byte from the radio
pub const STATUS_NG: u8 = 0xFA;

/// Smallest well-formed frame: FE FE to from cmd FD
pub const MIN_FRAME_LEN: usize = 6;

/// Maximum frame length (reasonable limit)
const MAX_FRAME_LEN: usize = 64;

/// What a received frame means to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameClass {
    /// Our own transmission reflected by the bus
    Echo,
    /// Radio reply; carries the data after command and subcommand
    Response(Vec<u8>),
    /// Radio reply carrying a single status byte (OK/NG)
    StatusOnly(u8),
    /// Traffic between other bus addresses
    Foreign { to: u8, from: u8 },
    /// Too short, or missing preamble or terminator
    Malformed,
}

/// Build a frame addressed to `to` from `from`
///
/// `payload` is everything between the addresses and the terminator, i.e.
/// command, subcommand and data.
///
/// ```
/// use civ_protocol::frame::build_frame;
///
/// let frame = build_frame(0x94, 0xCE, &[0x25, 0x00]).unwrap();
/// assert_eq!(frame, vec![0xFE, 0xFE, 0x94, 0xCE, 0x25, 0x00, 0xFD]);
/// ```
pub fn build_frame(to: u8, from: u8, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
    if payload.contains(&TERMINATOR) {
        return Err(EncodeError::TerminatorInPayload);
    }

    let mut frame = Vec::with_capacity(payload.len() + 5);
    frame.extend_from_slice(&[PREAMBLE, PREAMBLE, to, from]);
    frame.extend_from_slice(payload);
    frame.push(TERMINATOR);
    Ok(frame)
}

/// Read one terminated frame from the transport
///
/// Returns `None` when nothing terminated arrived within `timeout`.
pub fn read_frame<T>(transport: &mut T, timeout: Duration) -> std::io::Result<Option<Vec<u8>>>
where
    T: Transport + ?Sized,
{
    let bytes = transport.read_until(TERMINATOR, timeout)?;

    match bytes.last() {
        Some(&TERMINATOR) => {
            trace!("CI-V frame in: {:02X?}", bytes);
            Ok(Some(bytes))
        }
        Some(_) => {
            trace!("Dropping unterminated bytes: {:02X?}", bytes);
            Ok(None)
        }
        None => Ok(None),
    }
}

/// Classify a received frame relative to our address pair
pub fn classify_frame(frame: &[u8], radio_addr: u8, controller_addr: u8) -> FrameClass {
    let Some((to, from)) = frame_addresses(frame) else {
        return FrameClass::Malformed;
    };

    if to == radio_addr && from == controller_addr {
        return FrameClass::Echo;
    }

    if to != controller_addr || from != radio_addr {
        return FrameClass::Foreign { to, from };
    }

    let body = &frame[4..frame.len() - 1];
    match body {
        [status] => FrameClass::StatusOnly(*status),
        [_, _, data @ ..] => FrameClass::Response(data.to_vec()),
        // Unreachable for frames of at least MIN_FRAME_LEN bytes
        [] => FrameClass::Response(Vec::new()),
    }
}

/// Check if a response looks like a valid CI-V frame
pub fn is_valid_frame(data: &[u8]) -> bool {
    data.len() >= MIN_FRAME_LEN
        && data[0] == PREAMBLE
        && data[1] == PREAMBLE
        && data[data.len() - 1] == TERMINATOR
}

/// Destination and source address of a well-formed frame, in that order
pub fn frame_addresses(frame: &[u8]) -> Option<(u8, u8)> {
    is_valid_frame(frame).then(|| (frame[2], frame[3]))
}

/// Accumulates raw serial bytes and hands out terminated frames
///
/// Bytes that arrive after a terminator stay buffered for the next frame.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buffer: Vec<u8>,
}

impl FrameBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(MAX_FRAME_LEN),
        }
    }

    /// Push raw bytes into the buffer
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);

        // Prevent buffer overflow
        if self.buffer.len() > MAX_FRAME_LEN * 4 && !self.buffer.contains(&TERMINATOR) {
            let start = self.buffer.len() - MAX_FRAME_LEN;
            trace!("Discarding {} unterminated bytes", start);
            self.buffer.drain(..start);
        }
    }

    /// Take the next terminated frame, if one is complete
    ///
    /// Noise in front of a preamble is dropped. A terminated run without a
    /// preamble is returned as is so the caller can treat it as malformed.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.next_frame_until(TERMINATOR)
    }

    /// [`next_frame`](Self::next_frame) with an explicit end byte
    pub fn next_frame_until(&mut self, terminator: u8) -> Option<Vec<u8>> {
        let term_pos = self.buffer.iter().position(|&b| b == terminator)?;

        let start = self.buffer[..term_pos]
            .windows(2)
            .position(|w| w[0] == PREAMBLE && w[1] == PREAMBLE)
            .unwrap_or(0);
        if start > 0 {
            trace!("Skipping noise before preamble: {:02X?}", &self.buffer[..start]);
            self.buffer.drain(..start);
        }

        Some(self.buffer.drain(..=term_pos - start).collect())
    }

    /// Number of bytes waiting for a terminator
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the internal buffer
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
