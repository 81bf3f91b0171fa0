//! Numbered interactive menu.
//!
//! Reads choices line by line, runs the matching engine operation and prints
//! the outcome. Failures are reported and the loop continues.

use super::render;
use crate::error::AppError;
use crate::port::{PortError, PortSession};
use crate::protocol::{CommandMode, CommandModeResult};
use std::io::{self, BufRead, Write};
use tracing::debug;

const MENU: &str = "\nProgram choices:\n\
                    \x20  1. Open a port\n\
                    \x20  2. Enter Command Mode\n\
                    \x20  3. Exit Command Mode\n\
                    \x20  4. Get IP Address\n\
                    \x20  0. Exit program\n\
                    \nSelect a number:";

/// Interactive menu over an optional open session.
///
/// `opener` opens a session for a device path; tests pass one that returns mock sessions.
pub struct Menu<F>
where
    F: FnMut(&str) -> Result<PortSession, PortError>,
{
    session: Option<(PortSession, CommandMode)>,
    opener: F,
    json: bool,
}

impl<F> Menu<F>
where
    F: FnMut(&str) -> Result<PortSession, PortError>,
{
    pub fn new(opener: F, json: bool) -> Self {
        Self {
            session: None,
            opener,
            json,
        }
    }

    /// Start with an already opened session.
    pub fn with_session(mut self, session: PortSession) -> Self {
        let protocol = CommandMode::for_session(&session);
        self.session = Some((session, protocol));
        self
    }

    /// Open `path` before the loop starts and print the outcome. A failure
    /// leaves the menu without a session.
    pub fn open_device<W: Write>(&mut self, path: &str, output: &mut W) -> io::Result<()> {
        let result = self.open(path);
        self.report(output, &result)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Run until `0` or end of input.
    pub fn run<R: BufRead, W: Write>(&mut self, mut input: R, output: &mut W) -> io::Result<()> {
        writeln!(output, "\nXBee command-mode test program")?;

        loop {
            write!(output, "{MENU}")?;
            output.flush()?;

            let Some(line) = next_line(&mut input)? else {
                break;
            };

            match line.trim().parse::<u32>() {
                Ok(0) => {
                    writeln!(output, "\nGoodbye\n")?;
                    break;
                }
                Ok(1) => {
                    write!(output, "\nEnter port name:")?;
                    output.flush()?;
                    let path = next_line(&mut input)?.unwrap_or_default();
                    let result = self.open(path.trim());
                    self.report(output, &result)?;
                }
                Ok(2) => {
                    let result = self.with_protocol("enter", |protocol, session| {
                        protocol.enter_command_mode(session).map(|()| None)
                    });
                    self.report_or(output, &result, "Successfully entered command mode.")?;
                }
                Ok(3) => {
                    let result = self.with_protocol("exit", |protocol, session| {
                        protocol.exit_command_mode(session).map(|()| None)
                    });
                    self.report_or(output, &result, "Successfully exited command mode.")?;
                }
                Ok(4) => {
                    let result = self.with_protocol("address", |protocol, session| {
                        protocol.network_address(session).map(|line| Some(line.to_text()))
                    });
                    match (&result.response, self.json) {
                        (Some(address), false) => writeln!(output, "\nIP Address: {address}")?,
                        _ => self.report(output, &result)?,
                    }
                }
                _ => writeln!(output, "\nInvalid Choice. Please try again.")?,
            }
        }

        Ok(())
    }

    fn open(&mut self, path: &str) -> CommandModeResult {
        // Release the previous port before opening the next one.
        self.session = None;
        match (self.opener)(path) {
            Ok(session) => {
                let name = session.name().to_string();
                let protocol = CommandMode::for_session(&session);
                self.session = Some((session, protocol));
                CommandModeResult::success("open", Some(name))
            }
            Err(err) => CommandModeResult::failure("open", err.code(), &err),
        }
    }

    fn with_protocol<Op>(&mut self, operation: &str, op: Op) -> CommandModeResult
    where
        Op: FnOnce(
            &mut CommandMode,
            &mut PortSession,
        ) -> Result<Option<String>, crate::protocol::ProtocolError>,
    {
        let Some((session, protocol)) = self.session.as_mut() else {
            let err = AppError::PortNotOpen;
            return CommandModeResult::failure(operation, err.code(), &err);
        };
        match op(protocol, session) {
            Ok(response) => CommandModeResult::success(operation, response),
            Err(err) => {
                debug!(operation, error = %err, "menu operation failed");
                CommandModeResult::failure(operation, err.code(), &err)
            }
        }
    }

    fn report<W: Write>(&self, output: &mut W, result: &CommandModeResult) -> io::Result<()> {
        writeln!(output, "\n{}", render(result, self.json))
    }

    fn report_or<W: Write>(
        &self,
        output: &mut W,
        result: &CommandModeResult,
        success: &str,
    ) -> io::Result<()> {
        if result.success && !self.json {
            writeln!(output, "\n{success}")
        } else {
            self.report(output, result)
        }
    }
}

fn next_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}
