use super::protocol::IpcCommand;
use crate::config::{CliConfig, SessionPlan};
use crate::session::{
    event_channel, output_channel, RunSession, SessionControl, SessionEvent, TrainSession,
};
use crate::{log_debug, log_debug_content};
use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const EVENT_POLL: Duration = Duration::from_millis(100);

/// Run the configured session with stdin/stdout as the JSON-lines link.
///
/// Returns `false` when the session reported a fatal error.
pub fn run_ipc_mode(config: &CliConfig) -> Result<bool> {
    serve(config, io::stdin(), io::stdout())
}

/// Run the configured session, reading commands from `input` and writing
/// one JSON event per line to `output`.
pub fn serve<R, W>(config: &CliConfig, input: R, mut output: W) -> Result<bool>
where
    R: Read + Send + 'static,
    W: Write,
{
    let plan = config.plan()?;
    let (sink, events) = match &plan {
        SessionPlan::Run { raw: true, .. } => output_channel(),
        _ => event_channel(),
    };
    let flush_log = config.flush_log;

    let (control, worker) = match plan {
        SessionPlan::Train(params) => {
            let session = TrainSession::new(params);
            let control = session.control();
            let worker = spawn_worker("train", move || {
                session.start(&sink);
                if flush_log {
                    session.output_log(&sink);
                }
            })?;
            (control, worker)
        }
        SessionPlan::Run { params, .. } => {
            let session = RunSession::new(params);
            let control = session.control();
            let worker = spawn_worker("run", move || {
                session.start(&sink);
                if flush_log {
                    session.output_log(&sink);
                }
            })?;
            (control, worker)
        }
    };

    let _reader = spawn_command_reader(input, control);
    let clean = forward_events(&events, &worker, &mut output)?;
    worker
        .join()
        .map_err(|_| anyhow!("session worker panicked"))?;
    log_debug("ipc session finished");
    Ok(clean)
}

fn spawn_worker<F>(kind: &str, work: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(format!("pipectl-{kind}"))
        .spawn(work)
        .with_context(|| format!("failed to start {kind} session thread"))
}

fn forward_events<W: Write>(
    events: &Receiver<SessionEvent>,
    worker: &JoinHandle<()>,
    output: &mut W,
) -> Result<bool> {
    let mut clean = true;
    loop {
        let event = match events.recv_timeout(EVENT_POLL) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) if worker.is_finished() => {
                for event in events.try_iter() {
                    clean &= write_event(output, &event)?;
                }
                break;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        clean &= write_event(output, &event)?;
    }
    Ok(clean)
}

/// Write one event line; returns `false` for fatal errors.
fn write_event<W: Write>(output: &mut W, event: &SessionEvent) -> Result<bool> {
    let json = serde_json::to_string(event).context("failed to encode event")?;
    writeln!(output, "{json}").context("failed to write event")?;
    output.flush().context("failed to flush events")?;
    Ok(!matches!(event, SessionEvent::Error { fatal: true, .. }))
}

pub(super) fn apply_command(control: &SessionControl, command: IpcCommand) {
    log_debug(&format!("ipc command received: {command:?}"));
    let result = match command {
        IpcCommand::Stop => control.stop().map_err(|err| err.to_string()),
        IpcCommand::Cancel => control.cancel().map_err(|err| err.to_string()),
    };
    if let Err(err) = result {
        log_debug(&format!("ipc command {command:?} failed: {err}"));
    }
}

fn spawn_command_reader<R>(input: R, control: SessionControl) -> Option<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let spawned = thread::Builder::new()
        .name("pipectl-stdin".to_string())
        .spawn(move || {
            for line in BufReader::new(input).lines() {
                let Ok(line) = line else {
                    break;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match serde_json::from_str::<IpcCommand>(trimmed) {
                    Ok(command) => apply_command(&control, command),
                    Err(err) => {
                        log_debug_content(&format!("rejected command {trimmed:?}"));
                        log_debug(&format!("invalid command: {err}"));
                    }
                }
            }
            log_debug("stdin reader thread exiting");
        });
    match spawned {
        Ok(handle) => Some(handle),
        Err(err) => {
            log_debug(&format!("stdin reader unavailable: {err}"));
            None
        }
    }
}
