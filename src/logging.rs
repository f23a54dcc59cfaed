use crate::config::LogOptions;
use std::{
    env, fs,
    io::Write,
    panic,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, OnceLock,
    },
    time::{SystemTime, UNIX_EPOCH},
};

const LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
const CRASH_LOG_MAX_BYTES: u64 = 256 * 1024;
static LOG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_CONTENT_ENABLED: AtomicBool = AtomicBool::new(false);
static CRASH_LOG_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_STATE: OnceLock<Mutex<LogState>> = OnceLock::new();
static PANIC_HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

/// Debug log location; `PIPECTL_LOG_FILE` overrides the temp-dir default.
pub fn log_file_path() -> PathBuf {
    env::var("PIPECTL_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("pipectl.log"))
}

/// Path to the crash log file (metadata only).
pub fn crash_log_path() -> PathBuf {
    env::temp_dir().join("pipectl_crash.log")
}

struct LogWriter {
    path: PathBuf,
    file: fs::File,
    max_bytes: u64,
    bytes_written: u64,
}

impl LogWriter {
    fn open(path: PathBuf, max_bytes: u64) -> Option<Self> {
        let mut bytes_written = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        if bytes_written > max_bytes {
            let _ = fs::remove_file(&path);
            bytes_written = 0;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .ok()?;
        Some(Self {
            path,
            file,
            max_bytes,
            bytes_written,
        })
    }

    fn truncate_if_full(&mut self, next_len: usize) {
        if self.bytes_written.saturating_add(next_len as u64) <= self.max_bytes {
            return;
        }
        if let Ok(file) = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)
        {
            self.file = file;
            self.bytes_written = 0;
        }
    }

    fn append(&mut self, line: &str) {
        self.truncate_if_full(line.len());
        if self.file.write_all(line.as_bytes()).is_ok() {
            self.bytes_written = self.bytes_written.saturating_add(line.len() as u64);
        }
    }
}

#[derive(Default)]
struct LogState {
    writer: Option<LogWriter>,
}

fn log_state() -> &'static Mutex<LogState> {
    LOG_STATE.get_or_init(|| Mutex::new(LogState::default()))
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Configure the debug and crash logs from CLI flags or environment.
pub fn init_logging(options: &LogOptions) {
    let enabled = options.enabled();
    LOG_ENABLED.store(enabled, Ordering::Relaxed);
    LOG_CONTENT_ENABLED.store(enabled && options.log_content, Ordering::Relaxed);
    CRASH_LOG_ENABLED.store(enabled, Ordering::Relaxed);

    let mut state = log_state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    state.writer = if enabled {
        LogWriter::open(log_file_path(), LOG_MAX_BYTES)
    } else {
        None
    };
}

/// Append a timestamped line to the debug log. No-op unless logging is enabled.
pub fn log_debug(msg: &str) {
    if !LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    let line = format!("[{}] {msg}\n", unix_seconds());
    let mut state = log_state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(writer) = state.writer.as_mut() {
        writer.append(&line);
    }
}

/// Log lines that carry wire payloads (telemetry labels, child output).
pub fn log_debug_content(msg: &str) {
    if !LOG_CONTENT_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    log_debug(msg);
}

/// Write a minimal crash log entry, omitting the panic payload unless content logging is on.
pub fn log_panic(info: &panic::PanicHookInfo<'_>) {
    if !CRASH_LOG_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let location = info
        .location()
        .map(|loc| format!("{}:{}", loc.file(), loc.line()))
        .unwrap_or_else(|| "unknown".to_string());

    let payload = if LOG_CONTENT_ENABLED.load(Ordering::Relaxed) {
        if let Some(text) = info.payload().downcast_ref::<&str>() {
            (*text).to_string()
        } else if let Some(text) = info.payload().downcast_ref::<String>() {
            text.clone()
        } else {
            "non-string panic payload".to_string()
        }
    } else {
        "panic payload omitted (log-content disabled)".to_string()
    };

    let line = format!(
        "[{}] panic at {location}: {payload} (v{})\n",
        unix_seconds(),
        env!("CARGO_PKG_VERSION")
    );
    if let Some(mut writer) = LogWriter::open(crash_log_path(), CRASH_LOG_MAX_BYTES) {
        writer.append(&line);
    }
}

/// Route panics through the crash log before the default hook prints them.
pub fn install_panic_hook() {
    PANIC_HOOK_INSTALLED.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            log_panic(info);
            let location = info
                .location()
                .map(|loc| format!("{}:{}", loc.file(), loc.line()))
                .unwrap_or_else(|| "unknown".to_string());
            log_debug(&format!("panic at {location}"));
            previous(info);
        }));
    });
}

#[cfg(test)]
pub(crate) fn set_logging_for_tests(enabled: bool, content_enabled: bool) {
    LOG_ENABLED.store(enabled, Ordering::Relaxed);
    LOG_CONTENT_ENABLED.store(content_enabled, Ordering::Relaxed);
    CRASH_LOG_ENABLED.store(enabled, Ordering::Relaxed);
    let mut state = log_state()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    state.writer = if enabled {
        LogWriter::open(log_file_path(), LOG_MAX_BYTES)
    } else {
        None
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_truncates_once_budget_is_exceeded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("small.log");
        let mut writer = LogWriter::open(path.clone(), 16).expect("open writer");
        writer.append("0123456789\n");
        writer.append("abcdefghij\n");
        let contents = fs::read_to_string(&path).expect("read log");
        assert_eq!(contents, "abcdefghij\n");
    }

    #[test]
    fn writer_starts_fresh_when_existing_file_is_oversized() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.log");
        fs::write(&path, vec![b'x'; 64]).expect("seed log");
        let mut writer = LogWriter::open(path.clone(), 32).expect("open writer");
        writer.append("fresh\n");
        assert_eq!(fs::read_to_string(&path).expect("read log"), "fresh\n");
    }

    #[test]
    fn content_logging_is_gated_separately() {
        set_logging_for_tests(false, false);
        // Neither call may panic or create state while disabled.
        log_debug("disabled");
        log_debug_content("disabled content");
        set_logging_for_tests(false, false);
    }
}
