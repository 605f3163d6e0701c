// tests/config_loading.rs

use std::io::Write;
use std::path::PathBuf;

use procrun::config::{InputSource, RotateSpec, load_and_validate, load_from_path};
use procrun::errors::RunnerError;
use procrun::types::StdinMode;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_maps_onto_runner_config() {
    let file = config_file(
        r#"
dir = "/srv/app"
command = "python3"
args = ["app.py", "--port", "8080"]
env = ["MODE=prod"]
user = "app"
redirect_stderr = true

[stdout]
console = true
file = "logs/app.log"
max_size = 50
max_age = 7
max_backups = 3
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap().into_runner_config();

    assert_eq!(cfg.dir, Some(PathBuf::from("/srv/app")));
    assert_eq!(cfg.command, "python3");
    assert_eq!(cfg.args, vec!["app.py", "--port", "8080"]);
    assert_eq!(cfg.env, vec!["MODE=prod"]);
    assert_eq!(cfg.user.as_deref(), Some("app"));
    assert!(cfg.redirect_stderr);
    assert_eq!(cfg.stdin, InputSource::Null);
    assert!(cfg.stdout.sink.is_some());
    assert_eq!(
        cfg.stdout.file,
        Some(RotateSpec {
            path: PathBuf::from("logs/app.log"),
            max_size_mb: 50,
            max_age_days: 7,
            max_backups: 3,
        })
    );
    assert!(cfg.stderr.is_empty());
}

#[test]
fn minimal_config_uses_defaults() {
    let file = config_file(r#"command = "true""#);

    let cfg = load_and_validate(file.path()).unwrap().into_runner_config();

    assert_eq!(cfg.dir, None);
    assert!(cfg.args.is_empty());
    assert!(!cfg.inherit_env);
    assert_eq!(cfg.stdin, InputSource::Null);
    assert_eq!(StdinMode::default(), StdinMode::Null);
    assert!(cfg.stdout.is_empty());
    assert!(cfg.user.is_none());
}

#[test]
fn stdin_file_takes_precedence_over_stdin_mode() {
    let file = config_file(
        r#"
command = "cat"
stdin = "inherit"
stdin_file = "input.txt"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap().into_runner_config();

    assert_eq!(cfg.stdin, InputSource::File(PathBuf::from("input.txt")));
}

#[test]
fn missing_command_is_a_config_error() {
    let file = config_file(r#"args = ["x"]"#);

    match load_and_validate(file.path()) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("command")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn malformed_env_is_a_config_error() {
    let file = config_file(
        r#"
command = "true"
env = ["GOOD=1", "=nokey"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("=nokey")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn empty_log_file_is_a_config_error() {
    let file = config_file(
        r#"
command = "true"

[stderr]
file = ""
"#,
    );

    match load_and_validate(file.path()) {
        Err(RunnerError::ConfigError(msg)) => assert!(msg.contains("[stderr].file")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn unknown_stdin_mode_fails_to_parse() {
    let file = config_file(
        r#"
command = "true"
stdin = "keyboard"
"#,
    );

    assert!(matches!(load_from_path(file.path()), Err(RunnerError::TomlError(_))));
}

#[test]
fn stdin_mode_from_str() {
    assert_eq!(" Inherit ".parse::<StdinMode>().unwrap(), StdinMode::Inherit);
    assert_eq!("null".parse::<StdinMode>().unwrap(), StdinMode::Null);
    assert!("tty".parse::<StdinMode>().is_err());
}
