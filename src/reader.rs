//! Carriage-return delimited response framing.
//!
//! XBee responses are ASCII terminated by CR (0x0D). [`LineAssembler`] turns a
//! byte stream into lines; [`LineReader`] drives it from a [`PortSession`],
//! waiting on readiness between bytes and enforcing the length limit and the
//! overall deadline.

use crate::port::{PortError, PortSession, MAX_BUFFER_SIZE};
use crate::readiness::Handle;
use std::fmt;
use std::io;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;

/// Response delimiter.
pub const CR: u8 = b'\r';

/// Errors raised while waiting for a response line.
#[derive(Debug, Error)]
pub enum ReadError {
    /// Readiness was reported but the byte read failed or hit end-of-file.
    #[error("serial port disconnected while waiting for a response")]
    Disconnected,

    /// No carriage return arrived before the deadline.
    #[error("no complete response within {0:?}")]
    Timeout(Duration),

    /// The line reached its length limit before a carriage return.
    #[error("response exceeded {limit} bytes without a carriage return")]
    Overflow { limit: usize },

    /// The readiness wait itself failed.
    #[error("readiness poll failed: {0}")]
    Poll(#[source] io::Error),
}

impl ReadError {
    /// Numeric result code reported to the presentation layer.
    pub fn code(&self) -> i32 {
        -2
    }
}

/// One complete response, CR stripped.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct ResponseLine {
    bytes: Vec<u8>,
}

impl ResponseLine {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.bytes.starts_with(prefix)
    }

    /// The line as text, replacing invalid UTF-8.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

impl AsRef<[u8]> for ResponseLine {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

impl fmt::Debug for ResponseLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResponseLine(\"{}\")", self.bytes.escape_ascii())
    }
}

/// Incremental CR framing over a bounded, reusable buffer.
#[derive(Debug)]
pub struct LineAssembler {
    buffer: Vec<u8>,
    max_len: usize,
}

impl LineAssembler {
    pub fn new(max_len: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(max_len),
            max_len,
        }
    }

    /// Feed one byte. Returns the finished line when `byte` is CR.
    ///
    /// On overflow the partial line is discarded.
    pub fn push(&mut self, byte: u8) -> Result<Option<ResponseLine>, ReadError> {
        if byte == CR {
            let line = ResponseLine::new(self.buffer.as_slice());
            self.buffer.clear();
            return Ok(Some(line));
        }
        if self.buffer.len() >= self.max_len {
            self.buffer.clear();
            return Err(ReadError::Overflow {
                limit: self.max_len,
            });
        }
        self.buffer.push(byte);
        Ok(None)
    }

    /// Bytes accumulated toward the current line.
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

/// Reads CR-terminated lines from a session.
#[derive(Debug)]
pub struct LineReader {
    assembler: LineAssembler,
    deadline: Option<Duration>,
}

impl LineReader {
    /// `deadline` bounds a whole line read; `None` waits indefinitely.
    pub fn new(max_len: usize, deadline: Option<Duration>) -> Self {
        Self {
            assembler: LineAssembler::new(max_len),
            deadline,
        }
    }

    pub fn from_config(config: &crate::port::PortConfig) -> Self {
        Self::new(config.max_line_len, config.response_deadline)
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Read one line from `session`, waiting on `handles` between bytes.
    ///
    /// `handles` normally holds only the session's handle. A readiness report
    /// with no byte available (another handle in the set, or a spurious
    /// wakeup) is not an error.
    pub fn read_line(
        &mut self,
        session: &mut PortSession,
        handles: &[Handle],
    ) -> Result<ResponseLine, ReadError> {
        self.assembler.reset();
        let started = Instant::now();
        // Set once the line overflowed; its tail is skipped through the next CR.
        let mut overflow: Option<ReadError> = None;

        loop {
            if let Some(limit) = self.deadline {
                if started.elapsed() >= limit {
                    self.assembler.reset();
                    return Err(overflow.unwrap_or(ReadError::Timeout(limit)));
                }
            }

            let ready = session.wait_ready(handles).map_err(ReadError::Poll)?;
            if ready == 0 {
                continue;
            }

            match session.read_one_byte() {
                Ok(Some(byte)) if overflow.is_some() => {
                    if byte == CR {
                        if let Some(err) = overflow.take() {
                            debug!(port = session.name(), "discarded oversized line");
                            return Err(err);
                        }
                    }
                }
                Ok(Some(byte)) => match self.assembler.push(byte) {
                    Ok(Some(line)) => {
                        debug!(port = session.name(), line = ?line, "received line");
                        return Ok(line);
                    }
                    Ok(None) => {}
                    Err(err) => overflow = Some(err),
                },
                Ok(None) => {}
                Err(err) => {
                    debug!(port = session.name(), error = %err, "read failed after readiness");
                    self.assembler.reset();
                    return Err(ReadError::Disconnected);
                }
            }
        }
    }

    /// Read one line, waiting only on the session's own handle.
    pub fn read_response(&mut self, session: &mut PortSession) -> Result<ResponseLine, ReadError> {
        let handle = session.handle().ok_or_else(|| {
            debug!(error = %PortError::Closed, "cannot read from session");
            ReadError::Disconnected
        })?;
        self.read_line(session, &[handle])
    }
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new(MAX_BUFFER_SIZE, Some(crate::port::DEFAULT_RESPONSE_DEADLINE))
    }
}
