use super::events::{ErrorKind, EventSender};
use crate::log_debug;
use std::fs;
use std::io;
use std::thread;
use std::time::Duration;

/// Retry policy for reading a pipeline log the child may still hold open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogFlushPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for LogFlushPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Forward the whole log file to `sink` as one `Output` event.
///
/// Returns `false` when no log is configured or reading ultimately failed;
/// the failure itself goes to `sink` as a `LogRead` error.
pub fn output_log(log: Option<&str>, sink: &EventSender, policy: LogFlushPolicy) -> bool {
    let Some(path) = log.filter(|path| !path.is_empty()) else {
        return false;
    };
    let mut attempts_left = policy.attempts.max(1);
    loop {
        match fs::read(path) {
            Ok(bytes) => {
                sink.output(String::from_utf8_lossy(&bytes).into_owned());
                return true;
            }
            Err(err) if is_transient(&err) && attempts_left > 1 => {
                attempts_left -= 1;
                log_debug(&format!(
                    "log '{path}' not readable yet ({err}); {attempts_left} attempts left"
                ));
                thread::sleep(policy.backoff);
            }
            Err(err) => {
                sink.error(ErrorKind::LogRead, format!("failed to read log '{path}': {err}"));
                return false;
            }
        }
    }
}

/// Conditions a child still writing or holding the log can cause. Anything
/// else (permissions, a directory, a bad path) will not fix itself.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
            | io::ErrorKind::UnexpectedEof
    )
}
