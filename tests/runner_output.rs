// tests/runner_output.rs
#![cfg(unix)]

mod common;
use crate::common::{init_tracing, with_timeout};

use std::fs;

use procrun::config::RotateSpec;
use procrun::errors::{ExitKind, RunnerError};
use procrun::exec::Runner;
use procrun_test_utils::builders::RunnerConfigBuilder;
use procrun_test_utils::sinks::MemorySink;
use tempfile::tempdir;

#[tokio::test]
async fn stdout_reaches_a_direct_sink() {
    init_tracing();

    let out = MemorySink::new().shared();
    let runner = Runner::new(RunnerConfigBuilder::new("echo").arg("hi").stdout_sink(&out).build());

    with_timeout(runner.run()).await.unwrap();

    assert_eq!(out.contents_string(), "hi\n");
    assert_eq!(out.close_calls(), 0, "caller-supplied sinks are not closed by the runner");
}

#[tokio::test]
async fn stdout_and_stderr_are_kept_apart() {
    init_tracing();

    let out = MemorySink::new().shared();
    let err = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::shell("echo to-out; echo to-err 1>&2")
        .stdout_sink(&out)
        .stderr_sink(&err)
        .build();

    with_timeout(Runner::new(cfg).run()).await.unwrap();

    assert_eq!(out.contents_string(), "to-out\n");
    assert_eq!(err.contents_string(), "to-err\n");
}

#[tokio::test]
async fn redirected_stderr_shares_the_stdout_destination() {
    init_tracing();

    let out = MemorySink::new().shared();
    let err = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::shell("echo first; sleep 0.1; echo second 1>&2")
        .stdout_sink(&out)
        .stderr_sink(&err)
        .redirect_stderr(true)
        .build();

    with_timeout(Runner::new(cfg).run()).await.unwrap();

    assert_eq!(out.contents_string(), "first\nsecond\n");
    assert_eq!(err.write_calls(), 0, "stderr config is ignored when redirected");
}

#[tokio::test]
async fn merged_streams_never_split_a_write() {
    init_tracing();

    let out = MemorySink::new().shared();
    let script = r#"
        i=0
        while [ $i -lt 50 ]; do
            echo "out-$i"
            echo "err-$i" 1>&2
            i=$((i + 1))
        done
    "#;
    let cfg = RunnerConfigBuilder::shell(script)
        .stdout_sink(&out)
        .redirect_stderr(true)
        .build();

    with_timeout(Runner::new(cfg).run()).await.unwrap();

    let text = out.contents_string();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 100);
    for line in &lines {
        let ok = line
            .strip_prefix("out-")
            .or_else(|| line.strip_prefix("err-"))
            .is_some_and(|n| n.parse::<u32>().is_ok());
        assert!(ok, "mangled line {line:?} in {text:?}");
    }
    for i in 0..50 {
        assert!(lines.contains(&format!("out-{i}").as_str()));
        assert!(lines.contains(&format!("err-{i}").as_str()));
    }
}

#[tokio::test]
async fn output_is_written_to_rotating_files_under_the_working_dir() {
    init_tracing();

    let tmp = tempdir().unwrap();
    let out = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::shell("echo hello; echo oops 1>&2")
        .dir(tmp.path())
        .stdout_sink(&out)
        .stdout_file(RotateSpec::new("logs/out.log"))
        .stderr_file(RotateSpec::new("logs/err.log"))
        .build();

    with_timeout(Runner::new(cfg).run()).await.unwrap();

    assert_eq!(out.contents_string(), "hello\n");
    assert_eq!(fs::read_to_string(tmp.path().join("logs/out.log")).unwrap(), "hello\n");
    assert_eq!(fs::read_to_string(tmp.path().join("logs/err.log")).unwrap(), "oops\n");
}

#[tokio::test]
async fn environment_entries_are_passed_through() {
    init_tracing();

    let out = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::shell("echo \"$PROCRUN_TEST_VALUE\"")
        .env("PROCRUN_TEST_VALUE=a=b")
        .stdout_sink(&out)
        .build();

    with_timeout(Runner::new(cfg).run()).await.unwrap();

    assert_eq!(out.contents_string(), "a=b\n");
}

#[tokio::test]
async fn configured_env_replaces_the_parent_environment() {
    init_tracing();

    // Unique per test so parallel tests never race on it.
    unsafe { std::env::set_var("PROCRUN_PARENT_ONLY_REPLACE", "leaked") };

    let out = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::new("/bin/sh")
        .arg("-c")
        .arg("echo \"${PROCRUN_PARENT_ONLY_REPLACE:-absent} $ONLY\"")
        .env("ONLY=me")
        .stdout_sink(&out)
        .build();

    with_timeout(Runner::new(cfg).run()).await.unwrap();

    assert_eq!(out.contents_string(), "absent me\n");
}

#[tokio::test]
async fn inherit_env_layers_entries_over_the_parent_environment() {
    init_tracing();

    unsafe { std::env::set_var("PROCRUN_PARENT_ONLY_INHERIT", "kept") };

    let out = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::new("/bin/sh")
        .arg("-c")
        .arg("echo \"${PROCRUN_PARENT_ONLY_INHERIT:-absent} $ONLY\"")
        .env("ONLY=me")
        .inherit_env(true)
        .stdout_sink(&out)
        .build();

    with_timeout(Runner::new(cfg).run()).await.unwrap();

    assert_eq!(out.contents_string(), "kept me\n");
}

#[tokio::test]
async fn working_directory_and_stdin_file_are_honoured() {
    init_tracing();

    let tmp = tempdir().unwrap();
    fs::write(tmp.path().join("input.txt"), "from a file\n").unwrap();

    let pwd = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::new("pwd")
        .dir(tmp.path())
        .stdout_sink(&pwd)
        .build();
    with_timeout(Runner::new(cfg).run()).await.unwrap();
    let reported = pwd.contents_string();
    assert_eq!(
        fs::canonicalize(reported.trim()).unwrap(),
        fs::canonicalize(tmp.path()).unwrap()
    );

    let cat = MemorySink::new().shared();
    let cfg = RunnerConfigBuilder::new("cat")
        .dir(tmp.path())
        .stdin_file("input.txt")
        .stdout_sink(&cat)
        .build();
    with_timeout(Runner::new(cfg).run()).await.unwrap();
    assert_eq!(cat.contents_string(), "from a file\n");
}

#[tokio::test]
async fn failing_sink_does_not_block_the_process_but_fails_the_run() {
    init_tracing();

    let broken = MemorySink::new().fail_writes("sink gone").shared();
    let cfg = RunnerConfigBuilder::shell("yes | head -c 200000")
        .stdout_sink(&broken)
        .build();

    match with_timeout(Runner::new(cfg).run()).await {
        Err(RunnerError::ProcessExit(e)) => match e.kind {
            ExitKind::Output(msg) => assert!(msg.contains("sink gone"), "got {msg}"),
            other => panic!("expected an output failure, got {other:?}"),
        },
        other => panic!("expected ProcessExit, got {other:?}"),
    }
    assert_eq!(broken.write_calls(), 1, "only the first chunk is attempted");
}

#[tokio::test]
async fn exit_status_wins_over_an_output_failure() {
    init_tracing();

    let broken = MemorySink::new().fail_writes("sink gone").shared();
    let cfg = RunnerConfigBuilder::shell("echo hi; exit 3")
        .stdout_sink(&broken)
        .build();

    match with_timeout(Runner::new(cfg).run()).await {
        Err(RunnerError::ProcessExit(e)) => assert_eq!(e.kind, ExitKind::Code(3)),
        other => panic!("expected ProcessExit, got {other:?}"),
    }
}

#[tokio::test]
async fn output_failure_is_seen_by_every_waiter() {
    init_tracing();

    let broken = MemorySink::new().fail_writes("sink gone").shared();
    let runner = Runner::new(
        RunnerConfigBuilder::shell("sleep 0.2; echo hi")
            .stdout_sink(&broken)
            .build(),
    );
    runner.start().unwrap();

    let (a, b) = with_timeout(async { tokio::join!(runner.wait(), runner.wait()) }).await;
    for result in [a, b] {
        assert!(matches!(
            result,
            Err(RunnerError::ProcessExit(ref e)) if matches!(e.kind, ExitKind::Output(_))
        ));
    }
}
