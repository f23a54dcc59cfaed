use crate::channel::PipeDir;
use crate::launcher::ChildStdio;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of cross-validation folds.
pub const DEFAULT_KFOLDS: u32 = 2;

/// `eval` value that disables evaluation.
pub const EVAL_DISABLED: i32 = -1;

/// Settings that shape how a session talks to its child, shared by both kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkOptions {
    pub pipe_dir: PipeDir,
    /// Upper bound on the wait for the child to open the pipes. `None` waits forever.
    pub connect_timeout: Option<Duration>,
    pub stdio: ChildStdio,
}

/// Inputs for a one-shot train/evaluate invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainParams {
    pub executable: PathBuf,
    pub pipeline: String,
    pub traindef: String,
    pub training: String,
    pub trainer: String,
    /// -1 disables evaluation, 0..N picks the evaluation method.
    pub eval: i32,
    pub kfolds: u32,
    pub reextract: bool,
    pub log: Option<String>,
    pub link: LinkOptions,
}

impl TrainParams {
    pub fn new(
        executable: impl Into<PathBuf>,
        pipeline: impl Into<String>,
        traindef: impl Into<String>,
        training: impl Into<String>,
        trainer: impl Into<String>,
    ) -> Self {
        Self {
            executable: executable.into(),
            pipeline: pipeline.into(),
            traindef: traindef.into(),
            training: training.into(),
            trainer: trainer.into(),
            eval: EVAL_DISABLED,
            kfolds: DEFAULT_KFOLDS,
            reextract: false,
            log: None,
            link: LinkOptions::default(),
        }
    }
}

/// Inputs for a continuously streaming run invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunParams {
    pub executable: PathBuf,
    pub pipeline: String,
    pub trainer: Option<String>,
    pub signal: Option<String>,
    pub anno: Option<String>,
    pub user: Option<String>,
    pub log: Option<String>,
    pub link: LinkOptions,
}

impl RunParams {
    pub fn new(executable: impl Into<PathBuf>, pipeline: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            pipeline: pipeline.into(),
            trainer: None,
            signal: None,
            anno: None,
            user: None,
            log: None,
            link: LinkOptions::default(),
        }
    }
}
