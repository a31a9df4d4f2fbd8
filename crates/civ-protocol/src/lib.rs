//! CI-V Protocol Library
//!
//! This crate provides the protocol engine for driving an Icom transceiver
//! over CI-V from a plain text command channel:
//!
//! - **Frames**: building, reading and classifying `FE FE .. FD` frames
//! - **Commands**: the fixed registry of supported command/subcommand pairs
//! - **Values**: packed BCD and enumerated-byte encodings for each command
//! - **Requests**: the `NAME [ARGUMENT]` text form and the replies it yields
//!
//! # Architecture
//!
//! The crate does no I/O of its own. Bytes move through the [`Transport`]
//! trait, implemented by the serial link in `civ-link` and by the simulated
//! radio in `civ-sim`.
//!
//! # Example
//!
//! ```rust
//! use civ_protocol::{frame, CivCommand, DecodedValue, FrameClass, ValueCodec};
//!
//! // Read request for the operating frequency
//! let cmd = CivCommand::Frequency;
//! let out = frame::build_frame(0x94, 0xCE, &[cmd.code(), cmd.subcode()]).unwrap();
//! assert_eq!(out, vec![0xFE, 0xFE, 0x94, 0xCE, 0x25, 0x00, 0xFD]);
//!
//! // Radio answers with 14.250.000 Hz
//! let reply = [0xFE, 0xFE, 0xCE, 0x94, 0x25, 0x00, 0x00, 0x00, 0x25, 0x14, 0x00, 0xFD];
//! if let FrameClass::Response(data) = frame::classify_frame(&reply, 0x94, 0xCE) {
//!     let value = ValueCodec::new().decode(cmd, &data).unwrap();
//!     assert_eq!(value, DecodedValue::Hz(14_250_000));
//! }
//! ```

pub mod bcd;
pub mod command;
pub mod error;
pub mod frame;
pub mod request;
pub mod transport;
pub mod value;

pub use command::{Access, CivCommand, CommandDescriptor};
pub use error::{EncodeError, ParseError};
pub use frame::{build_frame, classify_frame, read_frame, FrameBuffer, FrameClass};
pub use request::{Reply, Request, StatusCode};
pub use transport::Transport;
pub use value::{Argument, CivMode, DecodedValue, ModeReading, PowerEncoding, ValueCodec};
