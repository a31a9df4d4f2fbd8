//! Request dispatcher
//!
//! Runs one request at a time against the radio: encode the argument, send
//! the frame, wait for the matching reply, decode it.
//!
//! CI-V has no transaction ids, so a reply is matched by position: the
//! first frame addressed from the radio to us after our request is its
//! answer. The whole send-then-await cycle holds the transport lock so that
//! concurrent callers cannot interleave.

use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use civ_protocol::frame::{build_frame, classify_frame, read_frame};
use civ_protocol::{
    Argument, CivCommand, FrameClass, Reply, Request, StatusCode, Transport, ValueCodec,
};
use tracing::{debug, trace, warn};

use crate::config::LinkConfig;
use crate::error::LinkError;

/// Executes requests over an exclusively owned transport
pub struct Dispatcher<T: Transport> {
    config: LinkConfig,
    codec: ValueCodec,
    transport: Mutex<T>,
}

impl<T: Transport> Dispatcher<T> {
    /// Create a dispatcher owning `transport`
    pub fn new(transport: T, config: LinkConfig) -> Self {
        Self {
            codec: ValueCodec::with_power_encoding(config.power_encoding),
            config,
            transport: Mutex::new(transport),
        }
    }

    /// Parse a `NAME [ARGUMENT]` line and execute it
    pub fn execute_line(&self, line: &str) -> Result<Reply, LinkError> {
        let request = Request::parse(line)?;
        self.execute_request(&request)
    }

    /// Execute a parsed request
    pub fn execute_request(&self, request: &Request) -> Result<Reply, LinkError> {
        self.execute(request.command, request.argument.as_ref())
    }

    /// Execute one command
    ///
    /// Without an argument this reads the current value; with one it writes
    /// it. Status-only replies come back as [`Reply::Status`] without being
    /// decoded.
    pub fn execute(
        &self,
        command: CivCommand,
        argument: Option<&Argument>,
    ) -> Result<Reply, LinkError> {
        let payload = self.codec.encode(command, argument)?;
        let is_write = !payload.is_empty();

        let mut body = Vec::with_capacity(payload.len() + 2);
        body.push(command.code());
        body.push(command.subcode());
        body.extend_from_slice(&payload);
        let frame = build_frame(
            self.config.radio_address,
            self.config.controller_address,
            &body,
        )?;

        debug!(
            "{} {} -> {:02X?}",
            if is_write { "Write" } else { "Read" },
            command,
            frame
        );

        let mut transport = self.lock_transport();
        transport.discard_input()?;
        transport.write_all(&frame)?;

        let settle = self.config.write_settle();
        if !settle.is_zero() {
            thread::sleep(settle);
        }

        match self.await_reply(&mut *transport)? {
            ReplyFrame::Status(code) => {
                debug!("{} status reply {}", command, code);
                if code.is_ng() {
                    warn!("Radio rejected {} (NG)", command);
                }
                Ok(Reply::Status(code))
            }
            ReplyFrame::Data(data) => {
                let value = self
                    .codec
                    .decode(command, &data)
                    .map_err(LinkError::Decode)?;
                debug!("{} reply {:02X?} = {}", command, data, value);
                Ok(Reply::Value(value))
            }
        }
    }

    /// Read frames until the radio answers or the correlation window closes
    fn await_reply(&self, transport: &mut T) -> Result<ReplyFrame, LinkError> {
        let window = self.config.response_timeout();
        let deadline = Instant::now() + window;

        loop {
            let now = Instant::now();
            if now >= deadline {
                debug!("No reply within {}ms", window.as_millis());
                return Err(LinkError::Timeout(window.as_millis() as u64));
            }

            let wait = self.config.read_timeout().min(deadline - now);
            let Some(frame) = read_frame(transport, wait)? else {
                continue;
            };

            match classify_frame(
                &frame,
                self.config.radio_address,
                self.config.controller_address,
            ) {
                FrameClass::Response(data) => return Ok(ReplyFrame::Data(data)),
                FrameClass::StatusOnly(code) => return Ok(ReplyFrame::Status(StatusCode(code))),
                FrameClass::Echo => trace!("Skipping echo"),
                FrameClass::Foreign { to, from } => {
                    trace!("Skipping frame 0x{:02X} -> 0x{:02X}", from, to)
                }
                FrameClass::Malformed => trace!("Skipping malformed frame {:02X?}", frame),
            }
        }
    }

    fn lock_transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(|poisoned| {
            warn!("Transport lock was poisoned; continuing");
            poisoned.into_inner()
        })
    }

    /// Consume the dispatcher and return the transport
    pub fn into_transport(self) -> T {
        self.transport
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// A reply frame addressed to us
enum ReplyFrame {
    Data(Vec<u8>),
    Status(StatusCode),
}

/// Render the outcome of a request as bridge reply text
pub fn reply_text(result: &Result<Reply, LinkError>) -> String {
    match result {
        Ok(reply) => reply.to_string(),
        Err(e) => e.reply_text().to_string(),
    }
}
