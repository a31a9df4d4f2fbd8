//! Error types for the CI-V link

use civ_protocol::{EncodeError, ParseError};
use thiserror::Error;

/// Errors that can occur while executing a request against the radio
#[derive(Debug, Error)]
pub enum LinkError {
    /// Command name not in the registry
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// Request line is not `NAME [ARGUMENT]`
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Argument cannot be encoded; nothing was sent
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// No reply from the radio within the correlation window
    #[error("no response from radio after {0}ms")]
    Timeout(u64),

    /// Reply payload could not be decoded
    #[error("decode error: {0}")]
    Decode(ParseError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port error
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl From<ParseError> for LinkError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::UnknownCommand(name) => LinkError::UnknownCommand(name),
            ParseError::InvalidRequest(reason) => LinkError::InvalidRequest(reason),
            other => LinkError::Decode(other),
        }
    }
}

impl LinkError {
    /// Text sent back over the bridge for this failure
    ///
    /// Malformed request lines answer `Invalid`; everything else `Error`.
    pub fn reply_text(&self) -> &'static str {
        match self {
            LinkError::InvalidRequest(_) => "Invalid",
            _ => "Error",
        }
    }
}
