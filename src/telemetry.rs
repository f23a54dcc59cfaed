use crate::config::LogOptions;
use crate::log_debug;
use anyhow::{Context, Result};
use std::env;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::fmt::time::UtcTime;

static TRACING_ACTIVE: OnceLock<bool> = OnceLock::new();

/// Trace file location; `PIPECTL_TRACE_LOG` overrides the temp-dir default.
pub fn tracing_log_path() -> PathBuf {
    env::var("PIPECTL_TRACE_LOG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir().join("pipectl_trace.jsonl"))
}

/// Install the JSON trace subscriber for session lifecycle events.
///
/// Stdout carries the event stream, so traces only ever go to the file.
/// Returns whether tracing is active.
pub fn init_tracing(options: &LogOptions) -> bool {
    if !options.enabled() {
        return false;
    }
    *TRACING_ACTIVE.get_or_init(|| match install(&tracing_log_path()) {
        Ok(()) => true,
        Err(err) => {
            log_debug(&format!("tracing disabled: {err:#}"));
            false
        }
    })
}

fn install(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open trace log '{}'", path.display()))?;
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_timer(UtcTime::rfc_3339())
        .with_writer(Mutex::new(file))
        .with_target(false)
        .with_thread_names(true)
        .with_current_span(false)
        .with_span_list(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("a global tracing subscriber is already installed")
}
