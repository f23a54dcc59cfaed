//! Command-line construction and child process control for the pipeline executable.

mod args;
mod process;

#[cfg(test)]
mod tests;

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

pub use args::{
    build_arguments, build_run_arguments, build_train_arguments, command_banner,
    split_arguments, Invocation,
};
pub use process::{spawn, ChildProcess, ChildStdio};

/// Failures raised while starting or stopping the child.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("could not start process '{}': {source}", .executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("process {pid} already exited ({status})")]
    AlreadyExited { pid: u32, status: ExitStatus },
    #[error("no process is running")]
    NotRunning,
    #[error("failed to kill process {pid}: {source}")]
    Kill {
        pid: u32,
        #[source]
        source: io::Error,
    },
}
