use super::args::split_arguments;
use super::LaunchError;
use crate::log_debug;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

/// What the child does with stdout/stderr.
///
/// Telemetry travels over the pipes, so the default leaves the child's
/// standard streams attached to ours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildStdio {
    #[default]
    Inherit,
    Null,
}

/// A spawned pipeline executable.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
    executable: PathBuf,
}

/// Start `executable` with `arguments`, without a shell.
pub fn spawn(
    executable: &Path,
    arguments: &str,
    stdio: ChildStdio,
) -> Result<ChildProcess, LaunchError> {
    let argv = split_arguments(arguments);
    let mut command = Command::new(executable);
    command.args(&argv);
    if stdio == ChildStdio::Null {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
    }
    let child = command.spawn().map_err(|source| LaunchError::Spawn {
        executable: executable.to_path_buf(),
        source,
    })?;
    log_debug(&format!(
        "spawned '{}' (pid {})",
        executable.display(),
        child.id()
    ));
    Ok(ChildProcess {
        child,
        executable: executable.to_path_buf(),
    })
}

impl ChildProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Non-blocking exit check; reaps the child when it has finished.
    pub fn has_exited(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(Some(_)))
    }

    /// Forcefully terminate the child.
    ///
    /// An already finished child is reported as [`LaunchError::AlreadyExited`].
    pub fn kill(&mut self) -> Result<(), LaunchError> {
        let pid = self.child.id();
        match self.child.try_wait() {
            Ok(Some(status)) => return Err(LaunchError::AlreadyExited { pid, status }),
            Ok(None) => {}
            Err(source) => return Err(LaunchError::Kill { pid, source }),
        }
        self.child
            .kill()
            .map_err(|source| LaunchError::Kill { pid, source })?;
        log_debug(&format!("killed pid {pid}"));
        Ok(())
    }

    /// Release the process handle. A child that is still running is reaped
    /// in the background so it does not linger as a zombie.
    pub fn close(mut self) {
        let pid = self.child.id();
        match self.child.try_wait() {
            Ok(Some(status)) => log_debug(&format!("pid {pid} exited with {status}")),
            Ok(None) => {
                let mut child = self.child;
                let spawned = thread::Builder::new()
                    .name(format!("pipectl-reap-{pid}"))
                    .spawn(move || match child.wait() {
                        Ok(status) => log_debug(&format!("pid {pid} exited with {status}")),
                        Err(err) => log_debug(&format!("waiting for pid {pid} failed: {err}")),
                    });
                if let Err(err) = spawned {
                    log_debug(&format!("could not start reaper for pid {pid}: {err}"));
                }
            }
            Err(err) => log_debug(&format!("status check for pid {pid} failed: {err}")),
        }
    }
}
