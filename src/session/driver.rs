use super::control::{ConnectWatchdog, SessionControl};
use super::events::{ErrorKind, EventSender};
use super::params::LinkOptions;
use crate::channel::{Direction, NamedPipe};
use crate::launcher::{self, command_banner};
use std::path::Path;
use tracing::{info, warn};

/// How a session run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The child connected (or the attempt was abandoned) and the read loop drained.
    Completed,
    /// Pipes could not be created or the child could not be spawned.
    Aborted,
}

/// Everything the shared run loop needs to launch one child.
pub(super) struct Launch<'a> {
    pub kind: &'static str,
    pub executable: &'a Path,
    pub arguments: String,
    pub link: &'a LinkOptions,
    /// Endpoints to create, in the order the child opens them.
    pub endpoints: &'a [Direction],
}

/// Create pipes, spawn the child, wait for it, and pump messages until it
/// disconnects. `Started` and `Stopped` bracket everything sent to `sink`.
pub(super) fn drive(
    launch: Launch<'_>,
    control: &SessionControl,
    sink: &EventSender,
    mut on_message: impl FnMut(String),
) -> SessionOutcome {
    control.begin(sink);
    info!(
        kind = launch.kind,
        executable = %launch.executable.display(),
        "session starting"
    );

    let mut pipes: Vec<NamedPipe> = Vec::with_capacity(launch.endpoints.len());
    for &direction in launch.endpoints {
        match launch.link.pipe_dir.create(direction) {
            Ok(pipe) => pipes.push(pipe),
            Err(err) => {
                warn!(kind = launch.kind, error = %err, "pipe creation failed");
                sink.error(ErrorKind::PipeCreation, err.to_string());
                return abort(pipes, control);
            }
        }
    }

    let process = match launcher::spawn(launch.executable, &launch.arguments, launch.link.stdio) {
        Ok(process) => process,
        Err(err) => {
            warn!(kind = launch.kind, error = %err, "spawn failed");
            sink.error(ErrorKind::ProcessSpawn, err.to_string());
            return abort(pipes, control);
        }
    };
    let pid = process.id();
    control.install_process(process);
    sink.output(command_banner(launch.executable, &launch.arguments));
    info!(kind = launch.kind, pid, "child spawned");

    let watchdog = ConnectWatchdog::spawn(
        control.clone(),
        pipes
            .iter()
            .map(|pipe| (pipe.path().to_path_buf(), pipe.direction()))
            .collect(),
        launch.link.connect_timeout,
        sink.clone(),
    );
    for pipe in &mut pipes {
        if !pipe.wait_for_client() {
            sink.error(
                ErrorKind::PipeConnect,
                format!("client did not connect to '{}'", pipe.path().display()),
            );
        }
    }
    if let Some(reason) = watchdog.disarm() {
        info!(kind = launch.kind, pid, ?reason, "connect wait released early");
    }

    let mut reader = None;
    for pipe in pipes {
        match pipe.direction() {
            Direction::Read => reader = Some(pipe),
            Direction::Write => control.install_writer(pipe),
        }
    }

    let mut messages = 0usize;
    if let Some(reader) = reader.as_mut() {
        loop {
            match reader.read_message() {
                Ok(Some(message)) => {
                    messages += 1;
                    on_message(message);
                }
                Ok(None) => break,
                Err(err) => {
                    sink.error(ErrorKind::ChannelRead, err.to_string());
                    break;
                }
            }
        }
        reader.close();
    }
    if let Some(mut writer) = control.take_writer() {
        writer.close();
    }

    control.finish();
    if let Some(process) = control.take_process() {
        process.close();
    }
    info!(kind = launch.kind, pid, messages, "session stopped");
    SessionOutcome::Completed
}

fn abort(pipes: Vec<NamedPipe>, control: &SessionControl) -> SessionOutcome {
    drop(pipes);
    control.finish();
    SessionOutcome::Aborted
}
