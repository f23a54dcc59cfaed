//! FIFO-backed named-pipe endpoint.

use super::codec::{self, FrameBuffer};
use super::{ChannelError, Direction};
use crate::{log_debug, log_debug_content};
use std::ffi::CString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

/// Bytes requested from the OS per read.
pub const PIPE_BUFFER_SIZE: usize = 4096;

pub(super) fn should_retry_read_error(err: &io::Error) -> bool {
    err.kind() == ErrorKind::Interrupted
}

/// One direction of the controller/child link.
///
/// The endpoint owns its FIFO node: it is created by [`NamedPipe::create`]
/// and unlinked again by [`NamedPipe::close`] (or on drop).
#[derive(Debug)]
pub struct NamedPipe {
    path: PathBuf,
    direction: Direction,
    buffer: Box<[u8]>,
    file: Option<File>,
    frames: FrameBuffer,
    owns_node: bool,
    disconnected: bool,
}

impl NamedPipe {
    /// Create a single-instance FIFO at `dir/name`, replacing a stale one left by a crash.
    pub fn create(
        dir: &Path,
        name: &str,
        buffer_size: usize,
        direction: Direction,
    ) -> Result<Self, ChannelError> {
        let path = dir.join(name);
        log_debug(&format!(
            "pipe create (mode={}, name={})",
            direction.label(),
            path.display()
        ));
        remove_stale_fifo(&path).map_err(|source| ChannelError::Create {
            path: path.clone(),
            source,
        })?;
        let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| ChannelError::Create {
            path: path.clone(),
            source: io::Error::new(ErrorKind::InvalidInput, "pipe path contains NUL byte"),
        })?;
        // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
        let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o600) };
        if rc != 0 {
            return Err(ChannelError::Create {
                path,
                source: io::Error::last_os_error(),
            });
        }
        Ok(Self {
            path,
            direction,
            buffer: vec![0u8; buffer_size.max(1)].into_boxed_slice(),
            file: None,
            frames: FrameBuffer::default(),
            owns_node: true,
            disconnected: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// True while a peer is attached and the handle has not been closed.
    pub fn is_connected(&self) -> bool {
        self.file.is_some()
    }

    /// Block until the peer opens the other end of the FIFO.
    ///
    /// Failure is logged and reported as `false`; the caller carries on and
    /// the next read or write on this endpoint fails instead.
    pub fn wait_for_client(&mut self) -> bool {
        log_debug(&format!(
            "pipe wait for client (mode={}, name={})",
            self.direction.label(),
            self.path.display()
        ));
        if self.file.is_some() {
            log_debug("pipe already has a client");
            return false;
        }
        if !self.owns_node {
            log_debug("pipe handle is closed; cannot wait for client");
            return false;
        }
        let mut options = OpenOptions::new();
        match self.direction {
            Direction::Read => options.read(true),
            Direction::Write => options.write(true),
        };
        match options.open(&self.path) {
            Ok(file) => {
                log_debug(&format!("pipe found client (name={})", self.path.display()));
                self.file = Some(file);
                true
            }
            Err(err) => {
                log_debug(&format!(
                    "pipe connect failed (name={}): {err}",
                    self.path.display()
                ));
                false
            }
        }
    }

    /// Read the next NUL-terminated message, terminator included.
    ///
    /// `Ok(None)` means the peer closed its end; no further reads are issued
    /// on this handle after that.
    pub fn read_message(&mut self) -> Result<Option<String>, ChannelError> {
        if self.direction != Direction::Read {
            return Err(ChannelError::WrongDirection {
                path: self.path.clone(),
                direction: self.direction,
            });
        }
        loop {
            if let Some(frame) = self.frames.next_frame() {
                let message = codec::decode(&frame);
                log_debug_content(&format!("pipe read {:?}", message));
                return Ok(Some(message));
            }
            if self.disconnected {
                return Ok(self.frames.take_remainder().map(|rest| codec::decode(&rest)));
            }
            let Some(file) = self.file.as_mut() else {
                return Err(ChannelError::NotConnected {
                    path: self.path.clone(),
                });
            };
            match file.read(&mut self.buffer) {
                Ok(0) => {
                    log_debug(&format!("pipe peer disconnected (name={})", self.path.display()));
                    self.disconnected = true;
                }
                Ok(n) => self.frames.push(&self.buffer[..n]),
                Err(err) if should_retry_read_error(&err) => continue,
                Err(source) => {
                    return Err(ChannelError::Read {
                        path: self.path.clone(),
                        source,
                    })
                }
            }
        }
    }

    /// Send `text` as one frame and flush it.
    pub fn write_message(&mut self, text: &str) -> Result<(), ChannelError> {
        if self.direction != Direction::Write {
            return Err(ChannelError::WrongDirection {
                path: self.path.clone(),
                direction: self.direction,
            });
        }
        let Some(file) = self.file.as_mut() else {
            return Err(ChannelError::NotConnected {
                path: self.path.clone(),
            });
        };
        let frame = codec::encode_frame(text);
        file.write_all(&frame)
            .and_then(|()| file.flush())
            .map_err(|source| ChannelError::Write {
                path: self.path.clone(),
                source,
            })?;
        log_debug_content(&format!("pipe sent {} bytes: {text:?}", frame.len()));
        Ok(())
    }

    /// Release the descriptor and remove the FIFO node. Safe to call repeatedly.
    pub fn close(&mut self) {
        if self.file.take().is_some() {
            log_debug(&format!("pipe close (name={})", self.path.display()));
        }
        if self.owns_node {
            self.owns_node = false;
            if let Err(err) = fs::remove_file(&self.path) {
                if err.kind() != ErrorKind::NotFound {
                    log_debug(&format!(
                        "pipe unlink failed (name={}): {err}",
                        self.path.display()
                    ));
                }
            }
        }
    }
}

impl Drop for NamedPipe {
    fn drop(&mut self) {
        self.close();
    }
}

/// Attach and immediately drop a throw-away peer so a thread blocked in
/// [`NamedPipe::wait_for_client`] on `path` returns.
///
/// For a read endpoint this fails with `ENXIO` until the waiter has actually
/// entered `open`; callers retry.
pub fn unblock_waiter(path: &Path, direction: Direction) -> io::Result<()> {
    let mut options = OpenOptions::new();
    match direction {
        Direction::Read => options.write(true),
        Direction::Write => options.read(true),
    };
    options
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
        .map(drop)
}

fn remove_stale_fifo(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => {
            log_debug(&format!("removing stale pipe {}", path.display()));
            fs::remove_file(path)
        }
        Ok(_) => Err(io::Error::new(
            ErrorKind::AlreadyExists,
            "path exists and is not a pipe",
        )),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err),
    }
}
