//! Readiness multiplexing.
//!
//! Waits, bounded by a short timeout, until one or more handles have input
//! available. The serial handle and (in the chat front end) standard input are
//! watched through the same primitive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::time::Duration;

/// A raw OS handle that can be watched for readability.
pub type Handle = i32;

/// Handle of standard input.
pub const STDIN_HANDLE: Handle = 0;

/// Bounded wait used by every readiness poll unless configured otherwise.
pub const DEFAULT_POLL_TIMEOUT: PollTimeout = PollTimeout {
    secs: 0,
    micros: 1000,
};

/// A poll timeout expressed as seconds plus microseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollTimeout {
    pub secs: u64,
    pub micros: u32,
}

impl PollTimeout {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs) + Duration::from_micros(u64::from(self.micros))
    }

    pub fn from_duration(duration: Duration) -> Self {
        Self {
            secs: duration.as_secs(),
            micros: duration.subsec_micros(),
        }
    }
}

impl Default for PollTimeout {
    fn default() -> Self {
        DEFAULT_POLL_TIMEOUT
    }
}

impl From<PollTimeout> for Duration {
    fn from(timeout: PollTimeout) -> Self {
        timeout.as_duration()
    }
}

/// Trait for waiting on handle readiness.
///
/// Implementations must report zero readiness for an empty handle set rather
/// than blocking or failing.
pub trait Multiplexer: Send + fmt::Debug {
    /// Wait up to `timeout` and return the subset of `handles` that became readable.
    fn wait_ready_set(&mut self, handles: &[Handle], timeout: Duration) -> io::Result<Vec<Handle>>;

    /// Wait up to `timeout` and return how many of `handles` became readable.
    ///
    /// Returns `Ok(0)` when the timeout elapsed with nothing ready.
    fn wait_ready(&mut self, handles: &[Handle], timeout: Duration) -> io::Result<usize> {
        self.wait_ready_set(handles, timeout).map(|ready| ready.len())
    }
}

/// `poll(2)`-backed multiplexer for real descriptors.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct PollMultiplexer;

#[cfg(unix)]
impl Multiplexer for PollMultiplexer {
    fn wait_ready_set(&mut self, handles: &[Handle], timeout: Duration) -> io::Result<Vec<Handle>> {
        if handles.is_empty() {
            return Ok(Vec::new());
        }

        let mut fds: Vec<libc::pollfd> = handles
            .iter()
            .map(|&fd| libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            })
            .collect();

        // SAFETY: `fds` is a live, correctly sized array of pollfd for the whole call.
        let rc = unsafe {
            libc::poll(
                fds.as_mut_ptr(),
                fds.len() as libc::nfds_t,
                timeout_millis(timeout),
            )
        };

        if rc < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(err);
        }

        // Hang-up and error conditions count as readable: the following read reports them.
        let mask = libc::POLLIN | libc::POLLHUP | libc::POLLERR | libc::POLLNVAL;
        Ok(fds
            .iter()
            .filter(|pfd| pfd.revents & mask != 0)
            .map(|pfd| pfd.fd)
            .collect())
    }
}

/// Convert a timeout to the millisecond argument of `poll(2)`, rounding up.
///
/// A non-zero timeout never becomes a zero-length spin.
pub fn timeout_millis(timeout: Duration) -> i32 {
    let micros = timeout.as_micros();
    let millis = micros.div_ceil(1000);
    i32::try_from(millis).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_poll_timeout() {
        let timeout = PollTimeout::default();
        assert_eq!(timeout.secs, 0);
        assert_eq!(timeout.micros, 1000);
        assert_eq!(timeout.as_duration(), Duration::from_millis(1));
    }

    #[test]
    fn test_poll_timeout_from_duration() {
        let timeout = PollTimeout::from_duration(Duration::from_micros(2_500_250));
        assert_eq!(timeout, PollTimeout { secs: 2, micros: 500_250 });
    }

    #[test]
    fn test_timeout_millis_rounds_up() {
        assert_eq!(timeout_millis(Duration::ZERO), 0);
        assert_eq!(timeout_millis(Duration::from_micros(1)), 1);
        assert_eq!(timeout_millis(Duration::from_micros(1000)), 1);
        assert_eq!(timeout_millis(Duration::from_micros(1001)), 2);
        assert_eq!(timeout_millis(Duration::from_secs(u64::MAX)), i32::MAX);
    }

    #[cfg(unix)]
    #[test]
    fn test_empty_handle_set_reports_zero() {
        let mut mux = PollMultiplexer;
        assert_eq!(mux.wait_ready(&[], Duration::from_secs(5)).unwrap(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_pipe_readiness() {
        let mut fds = [0 as libc::c_int; 2];
        assert_eq!(unsafe { libc::pipe(fds.as_mut_ptr()) }, 0);
        let (read_end, write_end) = (fds[0], fds[1]);

        let mut mux = PollMultiplexer;
        assert_eq!(mux.wait_ready(&[read_end], Duration::from_millis(1)).unwrap(), 0);

        let byte = [b'x'];
        assert_eq!(unsafe { libc::write(write_end, byte.as_ptr().cast(), 1) }, 1);
        assert_eq!(
            mux.wait_ready_set(&[read_end], Duration::from_millis(100)).unwrap(),
            vec![read_end]
        );

        unsafe {
            libc::close(read_end);
            libc::close(write_end);
        }
    }
}
