//! Error types for CI-V parsing and encoding

use thiserror::Error;

/// Errors that can occur while parsing protocol data or bridge requests
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Command name is not in the registry
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Invalid BCD encoding
    #[error("invalid BCD digit: 0x{0:02X}")]
    InvalidBcd(u8),

    /// Request line does not have the `NAME [ARGUMENT]` shape
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Errors that can occur while turning a user value into payload bytes
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A label was given to a command that only takes numbers
    #[error("{command} expects a number, got {input:?}")]
    NotNumeric {
        command: &'static str,
        input: String,
    },

    /// Numeric value cannot be represented by the command
    #[error("{command} value {value} is out of range")]
    OutOfRange { command: &'static str, value: i64 },

    /// Mode label not present in the mode table
    #[error("unknown mode {0:?}")]
    UnknownMode(String),

    /// Payload would carry the frame terminator
    #[error("payload contains the frame terminator 0xFD")]
    TerminatorInPayload,
}
