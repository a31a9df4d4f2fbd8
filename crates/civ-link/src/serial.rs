//! Serial port transport

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use civ_protocol::{FrameBuffer, Transport};
use serialport::{ClearBuffer, SerialPort};
use tracing::{debug, info, trace};

use crate::config::SerialConfig;
use crate::error::LinkError;

/// Timeout used for the initial open; reads set their own
const OPEN_TIMEOUT: Duration = Duration::from_millis(100);

/// The port operations the transport needs beyond plain reads and writes
pub trait PortIo: Read + Write + Send {
    /// Bound the next read
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;

    /// Drop whatever the driver has buffered on the receive side
    fn clear_input(&mut self) -> io::Result<()>;
}

impl PortIo for Box<dyn SerialPort> {
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.set_timeout(timeout)?;
        Ok(())
    }

    fn clear_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input)?;
        Ok(())
    }
}

/// CI-V over a local serial port
///
/// The port is closed when the transport is dropped.
pub struct SerialTransport<P: PortIo = Box<dyn SerialPort>> {
    /// Port name, for logging
    name: String,
    /// Serial port
    port: P,
    /// Bytes received past the last terminator
    frames: FrameBuffer,
    /// Read buffer
    buffer: Vec<u8>,
}

impl SerialTransport {
    /// Open the configured port
    pub fn open(config: &SerialConfig) -> Result<Self, LinkError> {
        debug!(
            "Opening {} at {} baud",
            config.serial_port, config.baud_rate
        );

        let mut port = serialport::new(&config.serial_port, config.baud_rate)
            .timeout(OPEN_TIMEOUT)
            .open()?;
        port.write_data_terminal_ready(config.dtr)?;

        info!(
            "Opened serial port {} at {} baud (DTR {})",
            config.serial_port,
            config.baud_rate,
            if config.dtr { "high" } else { "low" }
        );

        Ok(Self::with_port(config.serial_port.clone(), port))
    }
}

impl<P: PortIo> SerialTransport<P> {
    /// Wrap an already open port
    pub fn with_port(name: impl Into<String>, port: P) -> Self {
        Self {
            name: name.into(),
            port,
            frames: FrameBuffer::new(),
            buffer: vec![0; 256],
        }
    }

    /// Port name
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<P: PortIo> Transport for SerialTransport<P> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        trace!("{} out: {:02X?}", self.name, bytes);
        self.port.write_all(bytes)?;
        self.port.flush()
    }

    fn read_until(&mut self, terminator: u8, timeout: Duration) -> io::Result<Vec<u8>> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(frame) = self.frames.next_frame_until(terminator) {
                return Ok(frame);
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }

            self.port.set_read_timeout(deadline - now)?;
            match self.port.read(&mut self.buffer) {
                Ok(n) => self.frames.push_bytes(&self.buffer[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e),
            }
        }

        if self.frames.pending() > 0 {
            trace!(
                "{}: dropping {} bytes without terminator",
                self.name,
                self.frames.pending()
            );
            self.frames.clear();
        }

        Ok(Vec::new())
    }

    fn discard_input(&mut self) -> io::Result<()> {
        if self.frames.pending() > 0 {
            debug!(
                "{}: discarding {} stale bytes",
                self.name,
                self.frames.pending()
            );
            self.frames.clear();
        }
        self.port.clear_input()
    }
}

impl<P: PortIo> Drop for SerialTransport<P> {
    fn drop(&mut self) {
        info!("Closing serial port {}", self.name);
    }
}
