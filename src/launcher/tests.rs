use super::*;
use crate::session::{RunParams, TrainParams};
use crate::test_support::{process_lock, write_script};
use std::path::Path;
use std::thread;
use std::time::Duration;

fn train_params() -> TrainParams {
    TrainParams::new(
        "/opt/pipeline/trainer",
        "emo.pipeline",
        "emo.traindef",
        "emo.training",
        "emo.trainer",
    )
}

#[test]
fn train_arguments_use_defaults() {
    let args = build_train_arguments(&train_params());
    assert_eq!(
        args,
        "--train -eval -1 -kfolds 2 -remote emo.pipeline emo.traindef emo.training emo.trainer"
    );
}

#[test]
fn train_arguments_place_log_before_reextract() {
    let mut params = train_params();
    params.eval = 0;
    params.kfolds = 5;
    params.log = Some("x.log".to_string());
    params.reextract = true;
    assert_eq!(
        build_train_arguments(&params),
        "--train -eval 0 -kfolds 5 -remote -log x.log -reex emo.pipeline emo.traindef emo.training emo.trainer"
    );
}

#[test]
fn train_arguments_skip_empty_log() {
    let mut params = train_params();
    params.log = Some(String::new());
    assert!(!build_train_arguments(&params).contains("-log"));
}

#[test]
fn run_arguments_only_pipeline() {
    let params = RunParams::new("/opt/pipeline/runner", "emo.pipeline");
    assert_eq!(build_run_arguments(&params), "--run -remote emo.pipeline");
}

#[test]
fn run_arguments_keep_flag_order() {
    let mut params = RunParams::new("/opt/pipeline/runner", "emo.pipeline");
    params.log = Some("run.log".to_string());
    params.user = Some("alice".to_string());
    params.trainer = Some("emo.trainer".to_string());
    params.signal = Some("audio.stream".to_string());
    params.anno = Some("emo.annotation".to_string());
    assert_eq!(
        build_run_arguments(&params),
        "--run -remote -trainer emo.trainer -signal audio.stream -anno emo.annotation -user alice -log run.log emo.pipeline"
    );
}

#[test]
fn run_arguments_skip_empty_values() {
    let mut params = RunParams::new("/opt/pipeline/runner", "emo.pipeline");
    params.trainer = Some(String::new());
    params.user = Some("bob".to_string());
    assert_eq!(
        build_run_arguments(&params),
        "--run -remote -user bob emo.pipeline"
    );
}

#[test]
fn build_arguments_dispatches_on_invocation() {
    let train = train_params();
    let run = RunParams::new("/opt/pipeline/runner", "p");
    assert_eq!(Invocation::Train(&train).label(), "train");
    assert_eq!(Invocation::Run(&run).label(), "run");
    assert_eq!(
        build_arguments(Invocation::Run(&run)),
        build_run_arguments(&run)
    );
    assert_eq!(
        build_arguments(Invocation::Train(&train)),
        build_train_arguments(&train)
    );
}

#[test]
fn banner_frames_the_command_line() {
    let banner = command_banner(Path::new("/opt/bin/tool"), "--run -remote p");
    let lines: Vec<&str> = banner.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "-".repeat(43));
    assert_eq!(lines[1], "/opt/bin/tool --run -remote p");
    assert_eq!(lines[2], lines[0]);
}

#[test]
fn split_honours_double_quotes() {
    let argv = split_arguments(r#"--run -user "Jane Doe" p"#);
    assert_eq!(argv, vec!["--run", "-user", "Jane Doe", "p"]);
}

#[test]
fn split_keeps_apostrophes_and_backslashes() {
    assert_eq!(
        split_arguments("--run -remote -user O'Brien emo.pipeline"),
        vec!["--run", "-remote", "-user", "O'Brien", "emo.pipeline"]
    );
    assert_eq!(
        split_arguments(r"--run -remote C:\data\emo.pipeline"),
        vec!["--run", "-remote", r"C:\data\emo.pipeline"]
    );
}

#[test]
fn split_collapses_whitespace_and_keeps_empty_quotes() {
    assert_eq!(
        split_arguments("  -a \t b   \"\"  c "),
        vec!["-a", "b", "", "c"]
    );
    assert!(split_arguments("   ").is_empty());
}

#[test]
fn split_runs_unclosed_quote_to_end() {
    assert_eq!(
        split_arguments(r#"--run "open ended"#),
        vec!["--run", "open ended"]
    );
    assert_eq!(split_arguments(r#"pre"fix"ed"#), vec!["prefixed"]);
}

#[test]
fn spawn_passes_quote_sensitive_values_through() {
    let _guard = process_lock();
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("argv.txt");
    let exe = write_script(
        dir.path(),
        "argv.sh",
        &format!("for arg in \"$@\"; do printf '%s\\n' \"$arg\"; done > '{}'", out.display()),
    );
    let mut child = spawn(&exe, r"-user O'Brien -log C:\logs\run.log", ChildStdio::Null)
        .expect("spawn script");
    for _ in 0..200 {
        if child.has_exited() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    child.close();
    let argv = std::fs::read_to_string(&out).expect("argv file");
    assert_eq!(
        argv.lines().collect::<Vec<_>>(),
        ["-user", "O'Brien", "-log", r"C:\logs\run.log"]
    );
}

#[test]
fn spawn_missing_executable_reports_path() {
    let _guard = process_lock();
    let err = spawn(
        Path::new("/nonexistent/pipectl-missing-tool"),
        "--run -remote p",
        ChildStdio::Null,
    )
    .expect_err("spawn should fail");
    assert!(matches!(err, LaunchError::Spawn { .. }));
    let message = err.to_string();
    assert!(message.contains("could not start process"));
    assert!(message.contains("/nonexistent/pipectl-missing-tool"));
}

#[test]
fn kill_running_child_succeeds() {
    let _guard = process_lock();
    let mut child = spawn(Path::new("/bin/sleep"), "5", ChildStdio::Null).expect("spawn sleep");
    assert!(!child.has_exited());
    child.kill().expect("kill running child");
    let mut exited = false;
    for _ in 0..100 {
        if child.has_exited() {
            exited = true;
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    assert!(exited);
    child.close();
}

#[test]
fn kill_after_exit_reports_already_exited() {
    let _guard = process_lock();
    let mut child = spawn(Path::new("/bin/sh"), "-c true", ChildStdio::Null).expect("spawn sh");
    let pid = child.id();
    for _ in 0..200 {
        if child.has_exited() {
            break;
        }
        thread::sleep(Duration::from_millis(10));
    }
    match child.kill() {
        Err(LaunchError::AlreadyExited { pid: reported, .. }) => assert_eq!(reported, pid),
        other => panic!("expected AlreadyExited, got {other:?}"),
    }
    child.close();
}

#[test]
fn close_running_child_does_not_block() {
    let _guard = process_lock();
    let mut child = spawn(Path::new("/bin/sleep"), "1", ChildStdio::Null).expect("spawn sleep");
    assert_eq!(child.executable(), Path::new("/bin/sleep"));
    assert!(!child.has_exited());
    child.close();
}
