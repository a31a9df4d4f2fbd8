//! Bridge requests and replies
//!
//! A request line has the shape `NAME` or `NAME ARGUMENT`. It is parsed once
//! into a typed [`Request`]; the result of running it is a [`Reply`].

use std::fmt;
use std::str::FromStr;

use crate::command::CivCommand;
use crate::error::ParseError;
use crate::frame::{STATUS_NG, STATUS_OK};
use crate::value::{Argument, DecodedValue};

/// A parsed request line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Request {
    /// Command to run
    pub command: CivCommand,
    /// Value to write; `None` reads
    pub argument: Option<Argument>,
}

impl Request {
    /// Create a read request
    pub fn read(command: CivCommand) -> Self {
        Self {
            command,
            argument: None,
        }
    }

    /// Create a write request
    pub fn write(command: CivCommand, argument: Argument) -> Self {
        Self {
            command,
            argument: Some(argument),
        }
    }

    /// Parse a `NAME [ARGUMENT]` line
    ///
    /// ```
    /// use civ_protocol::{Argument, CivCommand, Request};
    ///
    /// let req = Request::parse("power_output 75").unwrap();
    /// assert_eq!(req, Request::write(CivCommand::PowerOutput, Argument::Number(75)));
    /// ```
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let line = line.trim().to_ascii_uppercase();
        let tokens: Vec<&str> = line.split_whitespace().collect();

        match tokens.as_slice() {
            [name] => Ok(Self::read(name.parse()?)),
            [name, argument] => Ok(Self::write(name.parse()?, Argument::from(*argument))),
            [] => Err(ParseError::InvalidRequest("empty request".into())),
            _ => Err(ParseError::InvalidRequest(format!(
                "expected NAME [ARGUMENT], got {} tokens",
                tokens.len()
            ))),
        }
    }
}

impl FromStr for Request {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.argument {
            Some(argument) => write!(f, "{} {}", self.command, argument),
            None => write!(f, "{}", self.command),
        }
    }
}

/// Single status byte returned by the radio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusCode(pub u8);

impl StatusCode {
    /// Radio accepted the command
    pub fn is_ok(&self) -> bool {
        self.0 == STATUS_OK
    }

    /// Radio rejected the command
    pub fn is_ng(&self) -> bool {
        self.0 == STATUS_NG
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}", self.0)
    }
}

/// Outcome of a request that reached the radio
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reply {
    /// Decoded response data
    Value(DecodedValue),
    /// Status-only reply, passed through undecoded
    Status(StatusCode),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Value(value) => write!(f, "{}", value),
            Reply::Status(code) => write!(f, "{}", code),
        }
    }
}
