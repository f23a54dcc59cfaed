//! Named-pipe transport between the controller and the pipeline executable.
//!
//! Each session run creates fresh FIFOs in a pipe directory, waits for the
//! child to open them, and exchanges NUL-terminated single-byte messages.
//! The read endpoint carries telemetry from the child; the write endpoint
//! carries control messages to it.

mod codec;
mod pipe;


use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

pub use codec::{decode, encode_frame, strip_terminator, TERMINATOR, TERMINATOR_CHAR};
pub use pipe::{unblock_waiter, NamedPipe, PIPE_BUFFER_SIZE};

/// Name the child writes telemetry to; the controller's read endpoint.
pub const READ_PIPE_NAME: &str = "MlpXmlWrite";

/// Name the child reads control messages from; the controller's write endpoint.
pub const WRITE_PIPE_NAME: &str = "MlpXmlRead";

/// Data flow of an endpoint, seen from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Direction::Read => "r",
            Direction::Write => "w",
        }
    }

    /// Protocol-reserved pipe name for this direction.
    pub fn pipe_name(self) -> &'static str {
        match self {
            Direction::Read => READ_PIPE_NAME,
            Direction::Write => WRITE_PIPE_NAME,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => f.write_str("reading"),
            Direction::Write => f.write_str("writing"),
        }
    }
}

/// Failures raised by a pipe endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("failed to create pipe '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("pipe '{}' has no connected client", .path.display())]
    NotConnected { path: PathBuf },
    #[error("pipe '{}' is open for {direction}", .path.display())]
    WrongDirection { path: PathBuf, direction: Direction },
    #[error("read from pipe '{}' failed: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write to pipe '{}' failed: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Directory holding the pair of FIFOs for one session.
///
/// Sessions sharing a directory must not run at the same time, since the
/// pipe names are fixed by the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipeDir {
    dir: PathBuf,
}

impl PipeDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn as_path(&self) -> &Path {
        &self.dir
    }

    /// Full path of the endpoint used for `direction`.
    pub fn endpoint(&self, direction: Direction) -> PathBuf {
        self.dir.join(direction.pipe_name())
    }

    /// Create the endpoint for `direction` with the protocol buffer size.
    pub fn create(&self, direction: Direction) -> Result<NamedPipe, ChannelError> {
        NamedPipe::create(&self.dir, direction.pipe_name(), PIPE_BUFFER_SIZE, direction)
    }
}

impl Default for PipeDir {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}
