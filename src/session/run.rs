use super::control::SessionControl;
use super::driver::{drive, Launch, SessionOutcome};
use super::events::{ErrorKind, EventSender};
use super::log_flush::{output_log, LogFlushPolicy};
use super::params::RunParams;
use super::update::parse_update;
use crate::channel::{ChannelError, Direction};
use crate::launcher::{build_arguments, Invocation, LaunchError};

/// Continuous run of a trained pipeline that streams labelled segments.
///
/// The child opens the control endpoint first, then the telemetry endpoint,
/// so the waits happen in that order.
#[derive(Debug)]
pub struct RunSession {
    params: RunParams,
    control: SessionControl,
}

impl RunSession {
    pub fn new(params: RunParams) -> Self {
        let control = SessionControl::new(params.link.pipe_dir.endpoint(Direction::Write));
        Self { params, control }
    }

    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Handle for stopping or cancelling from another thread while `start` blocks.
    pub fn control(&self) -> SessionControl {
        self.control.clone()
    }

    /// Run the child until it disconnects. Blocks; call from a worker thread.
    ///
    /// Consumers that accept updates get one `Update` per well-formed message
    /// and a non-fatal `MalformedMessage` error otherwise. Output-only
    /// consumers get the raw messages.
    pub fn start(&self, sink: &EventSender) -> SessionOutcome {
        let invocation = Invocation::Run(&self.params);
        let launch = Launch {
            kind: invocation.label(),
            executable: &self.params.executable,
            arguments: build_arguments(invocation),
            link: &self.params.link,
            endpoints: &[Direction::Write, Direction::Read],
        };
        let structured = sink.accepts_updates();
        drive(launch, &self.control, sink, |message| {
            if !structured {
                sink.output(message);
                return;
            }
            match parse_update(&message) {
                Ok(update) => sink.update(update),
                Err(err) => sink.error(ErrorKind::MalformedMessage, err.to_string()),
            }
        })
    }

    /// Ask the child to finish; the session ends when it disconnects.
    pub fn stop(&self) -> Result<(), ChannelError> {
        self.control.stop()
    }

    pub fn cancel(&self) -> Result<(), LaunchError> {
        self.control.cancel()
    }

    /// Forward the configured log file, if any.
    pub fn output_log(&self, sink: &EventSender) -> bool {
        self.output_log_with(sink, LogFlushPolicy::default())
    }

    pub fn output_log_with(&self, sink: &EventSender, policy: LogFlushPolicy) -> bool {
        output_log(self.params.log.as_deref(), sink, policy)
    }
}
