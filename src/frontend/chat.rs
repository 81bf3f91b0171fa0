//! Keyboard <-> module line relay.
//!
//! Standard input and the serial handle are watched through one readiness
//! wait. Keyboard lines go out CR-terminated (`+++` goes out bare), inbound
//! CR-terminated lines are printed. `get_ip` runs the address query and
//! `exit` quits.

use crate::error::AppResult;
use crate::port::{PortError, PortSession};
use crate::protocol::{CommandMode, GUARD_SEQUENCE};
use crate::readiness::STDIN_HANDLE;
use crate::reader::{LineAssembler, ReadError, CR};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, warn};

/// How long one relay iteration waits for either side.
const RELAY_POLL: Duration = Duration::from_millis(100);

/// Keyboard read size. Matches std's stdin buffer so reads bypass it and
/// nothing is held in user space where the readiness wait cannot see it.
const KEYBOARD_CHUNK: usize = 8 * 1024;

/// What to do with one keyboard line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardAction {
    Quit,
    Send(Vec<u8>),
    QueryAddress,
    Ignore,
}

/// Classify one keyboard line (without its trailing newline).
pub fn route_keyboard_line(line: &[u8]) -> KeyboardAction {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.is_empty() {
        KeyboardAction::Ignore
    } else if line.starts_with(b"exit") {
        KeyboardAction::Quit
    } else if line.starts_with(GUARD_SEQUENCE) {
        KeyboardAction::Send(GUARD_SEQUENCE.to_vec())
    } else if line.starts_with(b"get_ip") {
        KeyboardAction::QueryAddress
    } else {
        let mut frame = line.to_vec();
        frame.push(CR);
        KeyboardAction::Send(frame)
    }
}

/// Relay state over one session.
pub struct Chat<'a, W: Write> {
    session: &'a mut PortSession,
    protocol: CommandMode,
    inbound: LineAssembler,
    keyboard: Vec<u8>,
    show_timestamps: bool,
    out: W,
}

impl<'a, W: Write> Chat<'a, W> {
    pub fn new(session: &'a mut PortSession, out: W, show_timestamps: bool) -> Self {
        let protocol = CommandMode::for_session(session);
        let inbound = LineAssembler::new(session.config().max_line_len);
        Self {
            session,
            protocol,
            inbound,
            keyboard: Vec::new(),
            show_timestamps,
            out,
        }
    }

    /// Relay until `exit` or end of keyboard input.
    pub fn run(&mut self) -> AppResult<()> {
        let serial = self.session.handle().ok_or(PortError::Closed)?;
        writeln!(self.out, "Relaying {}; type 'exit' to quit.", self.session.name())?;

        let mut stdin = io::stdin();
        loop {
            let ready = self
                .session
                .wait_ready_set(&[serial, STDIN_HANDLE], RELAY_POLL)?;

            if ready.contains(&serial) {
                self.drain_serial()?;
            }
            if ready.contains(&STDIN_HANDLE) && !self.handle_keyboard_input(&mut stdin)? {
                break;
            }
        }

        writeln!(self.out, "\nExiting as ordered! Goodbye!")?;
        Ok(())
    }

    /// One read from the keyboard side. Returns `false` at end of input or on `exit`.
    pub fn handle_keyboard_input<R: Read>(&mut self, input: &mut R) -> AppResult<bool> {
        let mut chunk = vec![0u8; KEYBOARD_CHUNK];
        let n = input.read(&mut chunk)?;
        if n == 0 {
            return Ok(false);
        }
        self.handle_keyboard_bytes(&chunk[..n])
    }

    /// Feed keyboard bytes. Returns `false` once the user asked to quit.
    pub fn handle_keyboard_bytes(&mut self, bytes: &[u8]) -> AppResult<bool> {
        for &byte in bytes {
            if byte != b'\n' {
                self.keyboard.push(byte);
                continue;
            }
            let line = std::mem::take(&mut self.keyboard);
            match route_keyboard_line(&line) {
                KeyboardAction::Quit => return Ok(false),
                KeyboardAction::Ignore => {}
                KeyboardAction::Send(frame) => match self.session.write(&frame) {
                    Ok(_) => {
                        let shown = frame.strip_suffix(&[CR]).unwrap_or(&frame);
                        self.print("==>OUT", &String::from_utf8_lossy(shown))?;
                    }
                    Err(err) => {
                        warn!(error = %err, "keyboard line not sent");
                        self.print("ERROR", &format!("Result = {}: {err}", err.code()))?;
                    }
                },
                KeyboardAction::QueryAddress => match self.protocol.network_address(self.session) {
                    Ok(address) => self.print("IP Address", &address.to_text())?,
                    Err(err) => {
                        warn!(error = %err, "address query failed");
                        self.print("ERROR", &format!("Result = {}: {err}", err.code()))?;
                    }
                },
            }
        }
        Ok(true)
    }

    /// Read every byte currently available and print completed lines.
    pub fn drain_serial(&mut self) -> AppResult<()> {
        loop {
            let byte = match self.session.read_one_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => return Ok(()),
                Err(err) => {
                    debug!(error = %err, "serial side closed");
                    return Err(ReadError::Disconnected.into());
                }
            };
            match self.inbound.push(byte) {
                Ok(Some(line)) => self.print("<===IN", &line.to_text())?,
                Ok(None) => {}
                Err(err) => {
                    warn!(error = %err, "dropping oversized inbound line");
                }
            }
        }
    }

    fn print(&mut self, tag: &str, text: &str) -> io::Result<()> {
        if self.show_timestamps {
            let now = chrono::Local::now().format("%H:%M:%S");
            writeln!(self.out, "[{now}] {tag}:[{text}]")
        } else {
            writeln!(self.out, "{tag}:[{text}]")
        }
    }

    /// Consume the relay and return its output sink.
    pub fn into_output(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::{MockSerialPort, PortConfig};
    use pretty_assertions::assert_eq;

    fn fast_config() -> PortConfig {
        PortConfig {
            response_deadline: Some(Duration::from_millis(100)),
            ..PortConfig::default()
        }
    }

    #[test]
    fn test_route_keyboard_line() {
        assert_eq!(route_keyboard_line(b""), KeyboardAction::Ignore);
        assert_eq!(route_keyboard_line(b"exit"), KeyboardAction::Quit);
        assert_eq!(
            route_keyboard_line(b"+++"),
            KeyboardAction::Send(b"+++".to_vec())
        );
        assert_eq!(route_keyboard_line(b"get_ip"), KeyboardAction::QueryAddress);
        assert_eq!(
            route_keyboard_line(b"ATID"),
            KeyboardAction::Send(b"ATID\r".to_vec())
        );
        assert_eq!(
            route_keyboard_line(b"ATID\r"),
            KeyboardAction::Send(b"ATID\r".to_vec())
        );
    }

    #[test]
    fn test_keyboard_lines_are_framed() {
        let peer = MockSerialPort::new("MOCK0");
        let mut session = peer.session(fast_config());
        let mut chat = Chat::new(&mut session, Vec::new(), false);

        // Split across two chunks to exercise accumulation.
        assert!(chat.handle_keyboard_bytes(b"+++\nAT").unwrap());
        assert!(chat.handle_keyboard_bytes(b"ID\n").unwrap());
        assert!(!chat.handle_keyboard_bytes(b"exit\n").unwrap());

        assert_eq!(
            peer.get_write_log(),
            vec![b"+++".to_vec(), b"ATID\r".to_vec()]
        );
        let out = String::from_utf8(chat.into_output()).unwrap();
        assert_eq!(out, "==>OUT:[+++]\n==>OUT:[ATID]\n");
    }

    #[test]
    fn test_long_keyboard_burst_in_one_read() {
        let peer = MockSerialPort::new("MOCK0");
        let mut session = peer.session(fast_config());
        let mut chat = Chat::new(&mut session, Vec::new(), false);

        let mut input = String::new();
        for i in 0..100 {
            input.push_str(&format!("ATDL{i:02}\n"));
        }
        assert!(input.len() > 256);
        let mut reader = io::Cursor::new(input.into_bytes());

        assert!(chat.handle_keyboard_input(&mut reader).unwrap());
        assert_eq!(peer.get_write_log().len(), 100);
        assert_eq!(peer.get_write_log()[99], b"ATDL99\r".to_vec());

        // End of input stops the relay.
        assert!(!chat.handle_keyboard_input(&mut reader).unwrap());
    }

    #[test]
    fn test_inbound_lines_are_printed() {
        let mut peer = MockSerialPort::new("MOCK0");
        peer.enqueue_read(b"OK\r5F01\rpart");
        let mut session = peer.session(fast_config());
        let mut chat = Chat::new(&mut session, Vec::new(), false);

        chat.drain_serial().unwrap();
        let out = String::from_utf8(chat.into_output()).unwrap();
        assert_eq!(out, "<===IN:[OK]\n<===IN:[5F01]\n");
    }

    #[test]
    fn test_get_ip_runs_query() {
        let mut peer = MockSerialPort::new("MOCK0");
        peer.respond_to(b"+++", b"OK\r");
        peer.respond_to(b"ATMY\r", b"1A2B\r");
        peer.respond_to(b"atcn\r", b"OK\r");
        let mut session = peer.session(fast_config());
        let mut chat = Chat::new(&mut session, Vec::new(), false);

        assert!(chat.handle_keyboard_bytes(b"get_ip\n").unwrap());
        let out = String::from_utf8(chat.into_output()).unwrap();
        assert_eq!(out, "IP Address:[1A2B]\n");
    }

    #[test]
    fn test_disconnect_ends_relay() {
        let mut peer = MockSerialPort::new("MOCK0");
        peer.disconnect();
        let mut session = peer.session(fast_config());
        let mut chat = Chat::new(&mut session, Vec::new(), false);

        assert!(chat.drain_serial().is_err());
    }
}
