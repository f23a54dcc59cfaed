//! pipectl entrypoint: one train or run session, driven over JSON lines.
//!
//! Session events go to stdout, one JSON object per line. Commands
//! (`{"cmd":"stop"}`, `{"cmd":"cancel"}`) are read from stdin. Diagnostics
//! never touch stdout; they go to the debug and trace logs when enabled.

use anyhow::Result;
use pipectl::config::CliConfig;
use pipectl::ipc::run_ipc_mode;
use pipectl::telemetry::init_tracing;
use pipectl::{init_logging, install_panic_hook, log_debug, log_file_path};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let config = CliConfig::parse_args()?;
    init_logging(&config.log);
    init_tracing(&config.log);
    install_panic_hook();
    log_debug("=== pipectl started ===");
    log_debug(&format!("Log file: {:?}", log_file_path()));

    let clean = run_ipc_mode(&config)?;
    log_debug(&format!("=== pipectl exiting (clean: {clean}) ==="));
    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
