//! Train and run sessions: one child process, one pair of pipes, one event stream.
//!
//! A session blocks in `start` for the lifetime of its child, so callers run
//! it on a worker thread and steer it through a [`SessionControl`]. Events
//! arrive on the consumer's channel in order: `Started`, then any mix of
//! `Output`, `Update` and `Error`, then `Stopped`.

mod control;
mod driver;
mod events;
mod log_flush;
mod params;
mod run;
mod train;
mod update;


pub use control::{SessionControl, STOP_MESSAGE};
pub use driver::SessionOutcome;
pub use events::{event_channel, output_channel, ErrorKind, EventSender, SessionEvent};
pub use log_flush::{output_log, LogFlushPolicy};
pub use params::{LinkOptions, RunParams, TrainParams, DEFAULT_KFOLDS, EVAL_DISABLED};
pub use run::RunSession;
pub use train::TrainSession;
pub use update::{parse_update, MessageError, UpdateEvent};
