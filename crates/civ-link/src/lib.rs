//! CI-V Link Library
//!
//! This crate connects the CI-V protocol engine to a radio:
//!
//! - **SerialTransport**: the radio's serial port, via `serialport`
//! - **Dispatcher**: request/response correlation over any [`Transport`]
//!
//! # Example
//!
//! ```rust,no_run
//! use civ_link::{Dispatcher, LinkConfig, SerialConfig, SerialTransport};
//!
//! let transport = SerialTransport::open(&SerialConfig::default()).unwrap();
//! let dispatcher = Dispatcher::new(transport, LinkConfig::default());
//!
//! let reply = dispatcher.execute_line("FREQUENCY").unwrap();
//! println!("Frequency: {} Hz", reply);
//! ```
//!
//! [`Transport`]: civ_protocol::Transport

pub mod config;
pub mod dispatch;
pub mod error;
pub mod serial;

pub use config::{LinkConfig, SerialConfig};
pub use dispatch::{reply_text, Dispatcher};
pub use error::LinkError;
pub use serial::{PortIo, SerialTransport};
