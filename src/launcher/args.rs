use crate::session::{RunParams, TrainParams};
use std::path::Path;

/// Which pipeline invocation a command line is built for.
#[derive(Debug, Clone, Copy)]
pub enum Invocation<'a> {
    Train(&'a TrainParams),
    Run(&'a RunParams),
}

impl Invocation<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            Invocation::Train(_) => "train",
            Invocation::Run(_) => "run",
        }
    }
}

/// Build the argument string the pipeline executable expects.
///
/// Values are concatenated exactly as configured; nothing is quoted.
pub fn build_arguments(invocation: Invocation<'_>) -> String {
    match invocation {
        Invocation::Train(params) => build_train_arguments(params),
        Invocation::Run(params) => build_run_arguments(params),
    }
}

/// `--train -eval <e> -kfolds <k> -remote [-log <path>] [-reex] <pipeline> <traindef> <training> <trainer>`
pub fn build_train_arguments(params: &TrainParams) -> String {
    let mut args = format!(
        "--train -eval {} -kfolds {} -remote",
        params.eval, params.kfolds
    );
    if let Some(log) = configured(&params.log) {
        push_flag(&mut args, "-log", log);
    }
    if params.reextract {
        args.push_str(" -reex");
    }
    for positional in [
        &params.pipeline,
        &params.traindef,
        &params.training,
        &params.trainer,
    ] {
        args.push(' ');
        args.push_str(positional);
    }
    args
}

/// `--run -remote [-trainer <t>] [-signal <s>] [-anno <a>] [-user <u>] [-log <path>] <pipeline>`
pub fn build_run_arguments(params: &RunParams) -> String {
    let mut args = String::from("--run -remote");
    let optional = [
        ("-trainer", &params.trainer),
        ("-signal", &params.signal),
        ("-anno", &params.anno),
        ("-user", &params.user),
        ("-log", &params.log),
    ];
    for (flag, value) in optional {
        if let Some(value) = configured(value) {
            push_flag(&mut args, flag, value);
        }
    }
    args.push(' ');
    args.push_str(&params.pipeline);
    args
}

/// Split an argument string into argv the way a Windows command line is
/// tokenised: whitespace separates arguments, double quotes group a run
/// (and may produce an empty argument), backslashes and single quotes are
/// ordinary characters. An unclosed quote runs to the end of the string.
pub fn split_arguments(arguments: &str) -> Vec<String> {
    let mut argv = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    for ch in arguments.chars() {
        match ch {
            '"' => {
                quoted = !quoted;
                in_token = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_token {
                    argv.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        argv.push(current);
    }
    argv
}

/// Banner emitted once the child is running so the console shows the exact invocation.
pub fn command_banner(executable: &Path, arguments: &str) -> String {
    const RULE: &str = "-------------------------------------------";
    format!("{RULE}\n{} {arguments}\n{RULE}", executable.display())
}

fn configured(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn push_flag(args: &mut String, flag: &str, value: &str) {
    args.push(' ');
    args.push_str(flag);
    args.push(' ');
    args.push_str(value);
}
