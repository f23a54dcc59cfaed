use super::update::UpdateEvent;
use crate::log_debug;
use crossbeam_channel::{Receiver, Sender};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Notification delivered to the consumer of a session.
///
/// Every run produces exactly one `Started` first and one `Stopped` last.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event")]
pub enum SessionEvent {
    #[serde(rename = "session_started")]
    Started,

    /// Raw text: the command banner, train-session messages, or run-session
    /// messages when the consumer does not take structured updates.
    #[serde(rename = "output")]
    Output { text: String },

    /// Parsed run-session telemetry.
    #[serde(rename = "update")]
    Update(UpdateEvent),

    #[serde(rename = "error")]
    Error {
        kind: ErrorKind,
        message: String,
        fatal: bool,
    },

    #[serde(rename = "session_stopped")]
    Stopped,
}

/// Classification of everything that can go wrong during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ProcessSpawn,
    PipeCreation,
    PipeConnect,
    ConnectTimeout,
    MalformedMessage,
    ChannelRead,
    ChannelWrite,
    ProcessKill,
    LogRead,
}

impl ErrorKind {
    /// Fatal errors end the session (or the operation that raised them).
    pub fn is_fatal(self) -> bool {
        match self {
            ErrorKind::ProcessSpawn
            | ErrorKind::PipeCreation
            | ErrorKind::ChannelRead
            | ErrorKind::ChannelWrite
            | ErrorKind::LogRead => true,
            ErrorKind::PipeConnect
            | ErrorKind::ConnectTimeout
            | ErrorKind::MalformedMessage
            | ErrorKind::ProcessKill => false,
        }
    }
}

/// Sending half of a session's event stream.
///
/// Events are pushed from the session's worker thread; the consumer decides
/// how to get them onto its own thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<SessionEvent>,
    updates: bool,
    receiver_gone: Arc<AtomicBool>,
}

impl EventSender {
    /// A sender whose consumer takes structured updates.
    pub fn new(tx: Sender<SessionEvent>) -> Self {
        Self {
            tx,
            updates: true,
            receiver_gone: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A sender whose consumer only wants raw text; run-session telemetry
    /// arrives as [`SessionEvent::Output`].
    pub fn output_only(tx: Sender<SessionEvent>) -> Self {
        Self {
            updates: false,
            ..Self::new(tx)
        }
    }

    pub fn accepts_updates(&self) -> bool {
        self.updates
    }

    pub fn emit(&self, event: SessionEvent) {
        if self.tx.send(event).is_err() && !self.receiver_gone.swap(true, Ordering::Relaxed) {
            log_debug("session event receiver dropped; discarding further events");
        }
    }

    pub fn output(&self, text: impl Into<String>) {
        self.emit(SessionEvent::Output { text: text.into() });
    }

    pub fn update(&self, update: UpdateEvent) {
        self.emit(SessionEvent::Update(update));
    }

    pub fn error(&self, kind: ErrorKind, message: impl Into<String>) {
        let message = message.into();
        log_debug(&format!("session error ({kind:?}): {message}"));
        self.emit(SessionEvent::Error {
            kind,
            message,
            fatal: kind.is_fatal(),
        });
    }
}

/// Unbounded event channel whose consumer takes structured updates.
pub fn event_channel() -> (EventSender, Receiver<SessionEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSender::new(tx), rx)
}

/// Unbounded event channel whose consumer only wants raw text.
pub fn output_channel() -> (EventSender, Receiver<SessionEvent>) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (EventSender::output_only(tx), rx)
}
