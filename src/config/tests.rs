use super::validation::check_text;
use super::*;
use clap::Parser;
use std::fs;

const TRAIN: [&str; 10] = [
    "pipectl",
    "train",
    "--pipeline",
    "emo.pipeline",
    "--traindef",
    "emo.traindef",
    "--training",
    "emo.training",
    "--trainer",
    "emo.trainer",
];

fn train_with(extra: &[&str]) -> CliConfig {
    let mut argv: Vec<&str> = TRAIN.to_vec();
    argv.extend_from_slice(extra);
    CliConfig::parse_from(argv)
}

fn run_with(extra: &[&str]) -> CliConfig {
    let mut argv = vec!["pipectl", "run", "--pipeline", "emo.pipeline"];
    argv.extend_from_slice(extra);
    CliConfig::parse_from(argv)
}

#[test]
fn train_defaults_match_protocol() {
    let mut cfg = train_with(&["--executable", "/opt/bin/xmlpipe"]);
    cfg.validate().expect("valid config");
    match cfg.plan().expect("plan") {
        SessionPlan::Train(params) => {
            assert_eq!(params.eval, -1);
            assert_eq!(params.kfolds, 2);
            assert!(!params.reextract);
            assert_eq!(params.log, None);
            assert_eq!(params.executable, std::path::Path::new("/opt/bin/xmlpipe"));
            assert_eq!(params.link.connect_timeout, None);
        }
        other => panic!("expected train plan, got {other:?}"),
    }
}

#[test]
fn accepts_negative_eval() {
    let mut cfg = train_with(&["--executable", "tool", "--eval", "-1", "--kfolds", "5"]);
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_eval_below_disabled() {
    let mut cfg = train_with(&["--executable", "tool", "--eval", "-2"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_zero_kfolds() {
    let mut cfg = train_with(&["--executable", "tool", "--kfolds", "0"]);
    assert!(cfg.validate().is_err());
}

#[test]
fn requires_an_executable() {
    let mut cfg = run_with(&[]);
    let err = cfg.validate().expect_err("missing executable");
    assert!(err.to_string().contains("--executable"));

    let mut cfg = run_with(&["--executable", "   "]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_out_of_range_timeout() {
    let mut cfg = run_with(&["--executable", "tool", "--connect-timeout-ms", "0"]);
    assert!(cfg.validate().is_err());

    let too_long = (MAX_CONNECT_TIMEOUT_MS + 1).to_string();
    let mut cfg = run_with(&["--executable", "tool", "--connect-timeout-ms", too_long.as_str()]);
    assert!(cfg.validate().is_err());

    let mut cfg = run_with(&["--executable", "tool", "--connect-timeout-ms", "1500"]);
    cfg.validate().expect("valid timeout");
    assert_eq!(
        cfg.link_options().connect_timeout,
        Some(Duration::from_millis(1500))
    );
}

#[test]
fn rejects_missing_pipe_dir() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("nope");
    let mut cfg = run_with(&[
        "--executable",
        "tool",
        "--pipe-dir",
        missing.to_str().expect("utf8 path"),
    ]);
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_line_breaks_in_arguments() {
    let mut cfg = run_with(&["--executable", "tool", "--user", "bob\nrm"]);
    assert!(cfg.validate().is_err());
    assert!(check_text("--signal", "a\0b").is_err());
    assert!(check_text("--signal", "audio stream").is_ok());
}

#[test]
fn run_plan_carries_optional_flags() {
    let mut cfg = run_with(&[
        "--executable",
        "tool",
        "--trainer",
        "emo.trainer",
        "--user",
        "alice",
        "--raw",
        "--silence-child",
    ]);
    cfg.validate().expect("valid config");
    match cfg.plan().expect("plan") {
        SessionPlan::Run { params, raw } => {
            assert!(raw);
            assert_eq!(params.trainer.as_deref(), Some("emo.trainer"));
            assert_eq!(params.user.as_deref(), Some("alice"));
            assert_eq!(params.signal, None);
            assert_eq!(params.link.stdio, ChildStdio::Null);
        }
        other => panic!("expected run plan, got {other:?}"),
    }
}

#[test]
fn profile_fills_unset_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = dir.path().join("site.yaml");
    fs::write(
        &profile,
        format!(
            "executable: /opt/bin/xmlpipe\npipe_dir: {}\nconnect_timeout_ms: 2500\nlog: /tmp/pipeline.log\n",
            dir.path().display()
        ),
    )
    .expect("write profile");
    let mut cfg = run_with(&["--profile", profile.to_str().expect("utf8 path")]);
    cfg.validate().expect("valid config");

    assert_eq!(cfg.executable.as_deref(), Some("/opt/bin/xmlpipe"));
    assert_eq!(cfg.connect_timeout_ms, Some(2500));
    match cfg.plan().expect("plan") {
        SessionPlan::Run { params, .. } => {
            assert_eq!(params.log.as_deref(), Some("/tmp/pipeline.log"));
            assert_eq!(params.link.pipe_dir.as_path(), dir.path());
        }
        other => panic!("expected run plan, got {other:?}"),
    }
}

#[test]
fn command_line_wins_over_profile() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = dir.path().join("site.yaml");
    fs::write(&profile, "executable: /opt/bin/old\nconnect_timeout_ms: 2500\nlog: a.log\n")
        .expect("write profile");
    let mut cfg = train_with(&[
        "--profile",
        profile.to_str().expect("utf8 path"),
        "--executable",
        "/opt/bin/new",
        "--connect-timeout-ms",
        "100",
        "--log",
        "b.log",
    ]);
    cfg.validate().expect("valid config");
    assert_eq!(cfg.executable.as_deref(), Some("/opt/bin/new"));
    assert_eq!(cfg.connect_timeout_ms, Some(100));
    match cfg.plan().expect("plan") {
        SessionPlan::Train(params) => assert_eq!(params.log.as_deref(), Some("b.log")),
        other => panic!("expected train plan, got {other:?}"),
    }
}

#[test]
fn profile_rejects_unknown_keys() {
    assert!(Profile::from_yaml("executable: tool\ncolour: blue\n").is_err());
    assert_eq!(
        Profile::from_yaml("connect_timeout_ms: 10\n").expect("profile"),
        Profile {
            connect_timeout_ms: Some(10),
            ..Profile::default()
        }
    );
}

#[test]
fn missing_profile_is_an_error() {
    let mut cfg = run_with(&["--executable", "tool", "--profile", "/nonexistent/pipectl.yaml"]);
    let err = cfg.validate().expect_err("missing profile");
    assert!(err.to_string().contains("failed to read profile"));
}

#[test]
fn log_options_gate_on_no_logs() {
    let options = LogOptions {
        logs: true,
        no_logs: true,
        log_content: true,
    };
    assert!(!options.enabled());
    let options = LogOptions {
        logs: true,
        ..LogOptions::default()
    };
    assert!(options.enabled());
}
