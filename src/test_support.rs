//! Helpers shared by unit tests that fork children or touch FIFOs.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock};

static PROCESS_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serialises tests that spawn processes.
///
/// Writing a script while another test forks can leave the script's write
/// descriptor open in the fork, which makes exec fail with ETXTBSY.
pub(crate) fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Write an executable `sh` script into `dir`.
pub(crate) fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod script");
    path
}
