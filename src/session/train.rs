use super::control::SessionControl;
use super::driver::{drive, Launch, SessionOutcome};
use super::events::EventSender;
use super::log_flush::{output_log, LogFlushPolicy};
use super::params::TrainParams;
use crate::channel::Direction;
use crate::launcher::{build_arguments, Invocation, LaunchError};

/// One-shot training (and optional evaluation) of a pipeline.
///
/// Every message the child writes is forwarded verbatim as `Output`.
#[derive(Debug)]
pub struct TrainSession {
    params: TrainParams,
    control: SessionControl,
}

impl TrainSession {
    pub fn new(params: TrainParams) -> Self {
        let control = SessionControl::new(params.link.pipe_dir.endpoint(Direction::Write));
        Self { params, control }
    }

    pub fn params(&self) -> &TrainParams {
        &self.params
    }

    /// Handle for cancelling from another thread while `start` blocks.
    pub fn control(&self) -> SessionControl {
        self.control.clone()
    }

    /// Run the child to completion. Blocks; call from a worker thread.
    pub fn start(&self, sink: &EventSender) -> SessionOutcome {
        let invocation = Invocation::Train(&self.params);
        let launch = Launch {
            kind: invocation.label(),
            executable: &self.params.executable,
            arguments: build_arguments(invocation),
            link: &self.params.link,
            endpoints: &[Direction::Read],
        };
        drive(launch, &self.control, sink, |message| sink.output(message))
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
