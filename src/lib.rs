pub mod channel;
pub mod config;
pub mod ipc;
pub mod launcher;
mod logging;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod test_support;

pub use logging::{
    crash_log_path, init_logging, install_panic_hook, log_debug, log_debug_content,
    log_file_path, log_panic,
};
