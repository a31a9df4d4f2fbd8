//! CI-V Radio Simulation Library
//!
//! A stand-in for a transceiver on the CI-V bus, used to exercise the
//! dispatcher and the bridge without hardware. [`VirtualRadio`] implements
//! [`civ_protocol::Transport`], so anything that drives a serial port can
//! drive it instead.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use civ_protocol::{build_frame, Transport};
//! use civ_sim::VirtualRadio;
//!
//! let mut radio = VirtualRadio::new("IC-7300");
//! radio.set_echo(false);
//! radio.set_frequency(7_074_000);
//!
//! let request = build_frame(0x94, 0xCE, &[0x25, 0x00]).unwrap();
//! radio.write_all(&request).unwrap();
//!
//! let reply = radio.read_until(0xFD, Duration::from_millis(10)).unwrap();
//! assert_eq!(&reply[6..11], &[0x00, 0x40, 0x07, 0x07, 0x00]);
//! ```

pub mod radio;

pub use radio::{VirtualRadio, VirtualRadioConfig};
