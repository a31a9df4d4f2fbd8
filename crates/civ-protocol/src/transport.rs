//! Byte-stream boundary between the protocol engine and the serial link

use std::io;
use std::time::Duration;

/// Duplex byte stream carrying CI-V frames
///
/// Implemented by the serial port transport and by the simulated radio.
pub trait Transport: Send {
    /// Write every byte to the link
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Read bytes up to and including `terminator`
    ///
    /// Waits at most `timeout`. Returns an empty vector when no terminator
    /// arrived in the window.
    fn read_until(&mut self, terminator: u8, timeout: Duration) -> io::Result<Vec<u8>>;

    /// Drop any received bytes not yet read
    ///
    /// Called before each request so a late reply to an earlier, timed-out
    /// request cannot be taken for the new one.
    fn discard_input(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        (**self).write_all(bytes)
    }

    fn read_until(&mut self, terminator: u8, timeout: Duration) -> io::Result<Vec<u8>> {
        (**self).read_until(terminator, timeout)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        (**self).discard_input()
    }
}
