//! The AT command-mode state machine.
//!
//! `Idle --enter--> CommandMode --exit--> Idle`. Every operation borrows the
//! session mutably, so one session is driven by one caller at a time.

use super::at::{AtCommand, GUARD_SEQUENCE, OK_TOKEN};
use super::error::ProtocolError;
use crate::port::{PortConfig, PortSession};
use crate::reader::{LineReader, ResponseLine};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

const GUARD_LABEL: &str = "+++";

/// Where the module is believed to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolState {
    Idle,
    CommandMode,
}

/// Drives the guard-sequence handshake and AT exchanges over a session.
#[derive(Debug)]
pub struct CommandMode {
    state: ProtocolState,
    reader: LineReader,
    guard_silence: Duration,
}

impl CommandMode {
    pub fn new(config: &PortConfig) -> Self {
        Self {
            state: ProtocolState::Idle,
            reader: LineReader::from_config(config),
            guard_silence: config.guard_silence,
        }
    }

    /// Protocol driver using the session's own configuration.
    pub fn for_session(session: &PortSession) -> Self {
        Self::new(session.config())
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    /// Send the guard sequence and wait for `OK`.
    pub fn enter_command_mode(&mut self, session: &mut PortSession) -> Result<(), ProtocolError> {
        if !self.guard_silence.is_zero() {
            debug!(silence = ?self.guard_silence, "observing guard time");
            std::thread::sleep(self.guard_silence);
        }

        let reply = self.exchange(session, GUARD_LABEL, GUARD_SEQUENCE)?;
        expect_ok(GUARD_LABEL, &reply)?;

        self.state = ProtocolState::CommandMode;
        info!(port = session.name(), "entered command mode");
        Ok(())
    }

    /// Send `atcn` and wait for `OK`.
    pub fn exit_command_mode(&mut self, session: &mut PortSession) -> Result<(), ProtocolError> {
        let command = AtCommand::exit();
        let reply = self.exchange(session, command.as_str(), &command.to_frame())?;
        expect_ok(command.as_str(), &reply)?;

        self.state = ProtocolState::Idle;
        info!(port = session.name(), "exited command mode");
        Ok(())
    }

    /// Enter command mode, run `command`, capture its reply, exit command mode.
    ///
    /// If entering fails nothing else is sent. If the command exchange fails
    /// after entry, exiting is still attempted before the original error is
    /// returned.
    pub fn query(
        &mut self,
        session: &mut PortSession,
        command: &AtCommand,
    ) -> Result<ResponseLine, ProtocolError> {
        self.enter_command_mode(session)?;

        let payload = match self.exchange(session, command.as_str(), &command.to_frame()) {
            Ok(payload) => payload,
            Err(err) => {
                if let Err(cleanup) = self.exit_command_mode(session) {
                    warn!(error = %cleanup, "could not leave command mode after failed query");
                }
                return Err(err);
            }
        };

        self.exit_command_mode(session)?;
        Ok(payload)
    }

    /// Query the module's network address (`ATMY`).
    pub fn network_address(&mut self, session: &mut PortSession) -> Result<ResponseLine, ProtocolError> {
        self.query(session, &AtCommand::address())
    }

    fn exchange(
        &mut self,
        session: &mut PortSession,
        label: &str,
        frame: &[u8],
    ) -> Result<ResponseLine, ProtocolError> {
        session
            .write(frame)
            .map_err(|source| ProtocolError::WriteFailed {
                command: label.to_string(),
                source,
            })?;

        self.reader
            .read_response(session)
            .map_err(|source| ProtocolError::Read {
                command: label.to_string(),
                source,
            })
    }
}

fn expect_ok(command: &str, reply: &ResponseLine) -> Result<(), ProtocolError> {
    if reply.starts_with(OK_TOKEN) {
        return Ok(());
    }
    Err(ProtocolError::UnexpectedResponse {
        command: command.to_string(),
        response: reply.to_text(),
    })
}
