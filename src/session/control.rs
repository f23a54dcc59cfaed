use super::events::{ErrorKind, EventSender, SessionEvent};
use crate::channel::{unblock_waiter, ChannelError, Direction, NamedPipe};
use crate::launcher::{ChildProcess, LaunchError};
use crate::log_debug;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Poll interval for the connect watchdog.
const WATCHDOG_POLL: Duration = Duration::from_millis(50);

/// Control message that asks a running pipeline to finish.
pub const STOP_MESSAGE: &str = "stop";

/// Cloneable handle for steering a session from other threads.
///
/// `stop` only does something for run sessions, which hold a write endpoint
/// once the child has connected.
#[derive(Debug, Clone)]
pub struct SessionControl {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    write_endpoint: PathBuf,
    process: Mutex<Option<ChildProcess>>,
    writer: Mutex<Option<NamedPipe>>,
    notifier: Mutex<Option<EventSender>>,
    cancelled: AtomicBool,
}

impl SessionControl {
    pub(super) fn new(write_endpoint: PathBuf) -> Self {
        Self {
            shared: Arc::new(Shared {
                write_endpoint,
                process: Mutex::new(None),
                writer: Mutex::new(None),
                notifier: Mutex::new(None),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    /// Ask the child to finish by sending `stop` over the write endpoint.
    ///
    /// Failures are reported to the session consumer as `ChannelWrite` and
    /// returned.
    pub fn stop(&self) -> Result<(), ChannelError> {
        let result = match lock_or_recover(&self.shared.writer, "SessionControl::stop").as_mut() {
            Some(writer) => writer.write_message(STOP_MESSAGE),
            None => Err(ChannelError::NotConnected {
                path: self.shared.write_endpoint.clone(),
            }),
        };
        if let Err(err) = &result {
            self.report(ErrorKind::ChannelWrite, err.to_string());
        }
        result
    }

    /// Forcefully terminate the child.
    ///
    /// Kill failures are reported as non-fatal `ProcessKill` errors while the
    /// session is live, and always returned. A pending connect is abandoned.
    /// A cancel that lands while the child is still being spawned is applied
    /// as soon as the process is installed.
    pub fn cancel(&self) -> Result<(), LaunchError> {
        self.shared.cancelled.store(true, Ordering::SeqCst);
        let result = match lock_or_recover(&self.shared.process, "SessionControl::cancel").as_mut()
        {
            Some(process) => process.kill(),
            None if self.is_live() => {
                log_debug("cancel requested before spawn; deferring kill");
                return Ok(());
            }
            None => Err(LaunchError::NotRunning),
        };
        if let Err(err) = &result {
            self.report(ErrorKind::ProcessKill, err.to_string());
        }
        result
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::SeqCst)
    }

    /// Whether a session currently owns a child process.
    pub fn is_running(&self) -> bool {
        lock_or_recover(&self.shared.process, "SessionControl::is_running").is_some()
    }

    /// Emit `Started` and route out-of-band errors to `sink` until [`finish`](Self::finish).
    pub(super) fn begin(&self, sink: &EventSender) {
        let mut notifier = lock_or_recover(&self.shared.notifier, "SessionControl::begin");
        self.shared.cancelled.store(false, Ordering::SeqCst);
        sink.emit(SessionEvent::Started);
        *notifier = Some(sink.clone());
    }

    /// Emit `Stopped`. Nothing reaches the consumer through this handle afterwards.
    pub(super) fn finish(&self) {
        let mut notifier = lock_or_recover(&self.shared.notifier, "SessionControl::finish");
        if let Some(sink) = notifier.take() {
            sink.emit(SessionEvent::Stopped);
        }
    }

    /// Hand the spawned child to the control; kills it at once if a cancel
    /// already arrived.
    pub(super) fn install_process(&self, mut process: ChildProcess) {
        let mut slot = lock_or_recover(&self.shared.process, "SessionControl::install_process");
        if self.is_cancelled() {
            if let Err(err) = process.kill() {
                log_debug(&format!("deferred cancel kill: {err}"));
            }
        }
        *slot = Some(process);
    }

    pub(super) fn take_process(&self) -> Option<ChildProcess> {
        lock_or_recover(&self.shared.process, "SessionControl::take_process").take()
    }

    pub(super) fn install_writer(&self, pipe: NamedPipe) {
        *lock_or_recover(&self.shared.writer, "SessionControl::install_writer") = Some(pipe);
    }

    pub(super) fn take_writer(&self) -> Option<NamedPipe> {
        lock_or_recover(&self.shared.writer, "SessionControl::take_writer").take()
    }

    fn child_exited(&self) -> bool {
        lock_or_recover(&self.shared.process, "SessionControl::child_exited")
            .as_mut()
            .map_or(true, ChildProcess::has_exited)
    }

    fn kill_quietly(&self) {
        if let Some(process) =
            lock_or_recover(&self.shared.process, "SessionControl::kill_quietly").as_mut()
        {
            if let Err(err) = process.kill() {
                log_debug(&format!("connect watchdog kill: {err}"));
            }
        }
    }

    fn is_live(&self) -> bool {
        lock_or_recover(&self.shared.notifier, "SessionControl::is_live").is_some()
    }

    fn report(&self, kind: ErrorKind, message: String) {
        match lock_or_recover(&self.shared.notifier, "SessionControl::report").as_ref() {
            Some(sink) => sink.error(kind, message),
            None => log_debug(&format!("no live session for {kind:?}: {message}")),
        }
    }
}

/// Lock, taking the guard back if a previous holder panicked.
fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, context: &str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        log_debug(&format!("mutex poisoned in {context}; recovering"));
        poisoned.into_inner()
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WakeReason {
    Cancelled,
    TimedOut,
    ChildExited,
}

/// Releases blocked `wait_for_client` calls when connecting can no longer succeed.
///
/// Fires on cancel, on child exit, or once `timeout` elapses. After firing
/// it keeps attaching throw-away peers to every endpoint until disarmed.
pub(super) struct ConnectWatchdog {
    done: Arc<AtomicBool>,
    handle: Option<JoinHandle<Option<WakeReason>>>,
}

impl ConnectWatchdog {
    pub(super) fn spawn(
        control: SessionControl,
        endpoints: Vec<(PathBuf, Direction)>,
        timeout: Option<Duration>,
        sink: EventSender,
    ) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let thread_done = Arc::clone(&done);
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let handle = thread::Builder::new()
            .name("pipectl-connect-watchdog".to_string())
            .spawn(move || {
                watch(&control, &endpoints, deadline, timeout, &sink, &thread_done)
            });
        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(err) => {
                log_debug(&format!("connect watchdog unavailable: {err}"));
                None
            }
        };
        Self { done, handle }
    }

    /// Stop watching and report whether the watchdog had fired.
    pub(super) fn disarm(mut self) -> Option<WakeReason> {
        self.done.store(true, Ordering::SeqCst);
        self.handle.take().and_then(|handle| handle.join().ok().flatten())
    }
}

impl Drop for ConnectWatchdog {
    fn drop(&mut self) {
        self.done.store(true, Ordering::SeqCst);
    }
}

fn watch(
    control: &SessionControl,
    endpoints: &[(PathBuf, Direction)],
    deadline: Option<Instant>,
    timeout: Option<Duration>,
    sink: &EventSender,
    done: &AtomicBool,
) -> Option<WakeReason> {
    let mut fired = None;
    while !done.load(Ordering::SeqCst) {
        if fired.is_none() {
            fired = if control.is_cancelled() {
                Some(WakeReason::Cancelled)
            } else if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                Some(WakeReason::TimedOut)
            } else if control.child_exited() {
                Some(WakeReason::ChildExited)
            } else {
                None
            };
            if done.load(Ordering::SeqCst) {
                break;
            }
            if let Some(reason) = fired {
                log_debug(&format!("connect watchdog fired: {reason:?}"));
                if reason == WakeReason::TimedOut {
                    let waited = timeout.unwrap_or_default();
                    sink.error(
                        ErrorKind::ConnectTimeout,
                        format!("child did not connect within {} ms", waited.as_millis()),
                    );
                    control.kill_quietly();
                }
            }
        }
        if fired.is_some() {
            for (path, direction) in endpoints {
                if let Err(err) = unblock_waiter(path, *direction) {
                    log_debug(&format!("unblock {} pending: {err}", path.display()));
                }
            }
        }
        thread::sleep(WATCHDOG_POLL);
    }
    fired
}
