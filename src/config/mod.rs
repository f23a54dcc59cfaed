//! Command-line parsing, profile loading and validation.

mod profile;
#[cfg(test)]
mod tests;
mod validation;

use crate::channel::PipeDir;
use crate::launcher::ChildStdio;
use crate::session::{LinkOptions, RunParams, TrainParams, DEFAULT_KFOLDS, EVAL_DISABLED};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub use profile::Profile;

/// Longest connect timeout accepted on the command line (10 minutes).
pub const MAX_CONNECT_TIMEOUT_MS: u64 = 600_000;

/// File logging switches shared by the debug log and the trace log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct LogOptions {
    /// Enable debug logging to a file in the temp dir
    #[arg(long = "logs", env = "PIPECTL_LOGS", default_value_t = false, global = true)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "PIPECTL_NO_LOGS", default_value_t = false, global = true)]
    pub no_logs: bool,

    /// Include message bodies (telemetry labels, child output) in debug logs
    #[arg(
        long = "log-content",
        env = "PIPECTL_LOG_CONTENT",
        default_value_t = false,
        global = true
    )]
    pub log_content: bool,
}

impl LogOptions {
    pub fn enabled(&self) -> bool {
        self.logs && !self.no_logs
    }
}

/// CLI options for pipectl. Validated values are safe to hand to the launcher.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "pipectl",
    about = "Drive a pipeline executable over named pipes and stream its events as JSON lines",
    author,
    version
)]
pub struct CliConfig {
    /// Pipeline executable to launch
    #[arg(long, env = "PIPECTL_EXECUTABLE", global = true)]
    pub executable: Option<String>,

    /// Directory that holds the session's named pipes (default: temp dir)
    #[arg(long = "pipe-dir", env = "PIPECTL_PIPE_DIR", global = true)]
    pub pipe_dir: Option<PathBuf>,

    /// Give up if the child has not connected after this many milliseconds
    #[arg(long = "connect-timeout-ms", env = "PIPECTL_CONNECT_TIMEOUT_MS", global = true)]
    pub connect_timeout_ms: Option<u64>,

    /// YAML profile with defaults for executable, pipe_dir, connect_timeout_ms and log
    #[arg(long, env = "PIPECTL_PROFILE", global = true)]
    pub profile: Option<PathBuf>,

    /// Discard the child's stdout and stderr
    #[arg(long = "silence-child", default_value_t = false, global = true)]
    pub silence_child: bool,

    /// Forward the pipeline log as output once the session stops
    #[arg(long = "flush-log", default_value_t = false, global = true)]
    pub flush_log: bool,

    #[command(flatten)]
    pub log: LogOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Train (and optionally evaluate) a pipeline
    Train(TrainArgs),
    /// Run a trained pipeline and stream its telemetry
    Run(RunArgs),
}

#[derive(Debug, Clone, Args)]
pub struct TrainArgs {
    /// Pipeline definition
    #[arg(long)]
    pub pipeline: String,

    /// Training definition
    #[arg(long)]
    pub traindef: String,

    /// Training data set
    #[arg(long)]
    pub training: String,

    /// Output trainer file
    #[arg(long)]
    pub trainer: String,

    /// Evaluation method (-1 disables evaluation)
    #[arg(long, default_value_t = EVAL_DISABLED, allow_negative_numbers = true)]
    pub eval: i32,

    /// Cross-validation folds
    #[arg(long, default_value_t = DEFAULT_KFOLDS)]
    pub kfolds: u32,

    /// Force feature re-extraction
    #[arg(long, default_value_t = false)]
    pub reextract: bool,

    /// Log file the pipeline writes
    #[arg(long)]
    pub log: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Pipeline definition
    #[arg(long)]
    pub pipeline: String,

    /// Trained model to load
    #[arg(long)]
    pub trainer: Option<String>,

    /// Signal source
    #[arg(long)]
    pub signal: Option<String>,

    /// Annotation target
    #[arg(long)]
    pub anno: Option<String>,

    /// User name passed through to the pipeline
    #[arg(long)]
    pub user: Option<String>,

    /// Log file the pipeline writes
    #[arg(long)]
    pub log: Option<String>,

    /// Forward telemetry as raw output instead of parsed updates
    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

/// A validated session, ready to start.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionPlan {
    Train(TrainParams),
    Run { params: RunParams, raw: bool },
}

impl CliConfig {
    /// Pipe, timeout and stdio settings for the session.
    pub fn link_options(&self) -> LinkOptions {
        LinkOptions {
            pipe_dir: self.pipe_dir.clone().map(PipeDir::new).unwrap_or_default(),
            connect_timeout: self.connect_timeout_ms.map(Duration::from_millis),
            stdio: if self.silence_child {
                ChildStdio::Null
            } else {
                ChildStdio::Inherit
            },
        }
    }

    /// Turn the validated configuration into session parameters.
    pub fn plan(&self) -> Result<SessionPlan> {
        let executable = self
            .executable
            .clone()
            .context("no executable configured (use --executable or a profile)")?;
        let link = self.link_options();
        let plan = match &self.command {
            Command::Train(args) => {
                let mut params = TrainParams::new(
                    &executable,
                    &args.pipeline,
                    &args.traindef,
                    &args.training,
                    &args.trainer,
                );
                params.eval = args.eval;
                params.kfolds = args.kfolds;
                params.reextract = args.reextract;
                params.log = args.log.clone();
                params.link = link;
                SessionPlan::Train(params)
            }
            Command::Run(args) => {
                let mut params = RunParams::new(&executable, &args.pipeline);
                params.trainer = args.trainer.clone();
                params.signal = args.signal.clone();
                params.anno = args.anno.clone();
                params.user = args.user.clone();
                params.log = args.log.clone();
                params.link = link;
                SessionPlan::Run {
                    params,
                    raw: args.raw,
                }
            }
        };
        Ok(plan)
    }
}
