// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod sink;
pub mod types;

use std::path::PathBuf;

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{RawRunnerFile, RunnerFile, default_config_path, load_from_path};
use crate::exec::Runner;

pub use crate::config::RunnerConfig;
pub use crate::errors::{ExitError, RunnerError};
pub use crate::sink::{FanoutWriter, SharedSink, Sink};
pub use crate::types::RunState;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, then command-line overrides)
/// - validation
/// - the runner itself
pub async fn run(args: CliArgs) -> Result<()> {
    let raw = load_raw_config(&args)?;
    let raw = apply_overrides(raw, &args);
    let file = RunnerFile::try_from(raw)?;

    if args.dry_run {
        print_dry_run(&file);
        return Ok(());
    }

    let runner = Runner::new(file.into_runner_config());
    runner.run().await?;

    info!("command finished successfully");
    Ok(())
}

/// Pick the config source.
///
/// - `--config PATH` must exist.
/// - Otherwise `Procrun.toml` is used when present.
/// - Otherwise a trailing command runs with console output only, inheriting
///   our environment.
fn load_raw_config(args: &CliArgs) -> Result<RawRunnerFile> {
    if let Some(path) = &args.config {
        debug!(path = %path, "loading config");
        return Ok(load_from_path(PathBuf::from(path))?);
    }

    let default_path = default_config_path();
    if default_path.is_file() {
        debug!(path = %default_path.display(), "loading default config");
        return Ok(load_from_path(&default_path)?);
    }

    if args.command.is_empty() {
        bail!(
            "no command given and no {} found (use --config or pass a command)",
            default_path.display()
        );
    }

    let mut raw = RawRunnerFile::default();
    raw.inherit_env = true;
    raw.stdout.console = true;
    raw.stderr.console = true;
    Ok(raw)
}

fn apply_overrides(mut raw: RawRunnerFile, args: &CliArgs) -> RawRunnerFile {
    if let Some((command, rest)) = args.command.split_first() {
        raw.command = command.clone();
        raw.args = rest.to_vec();
    }
    if let Some(dir) = &args.dir {
        raw.dir = Some(dir.clone());
    }
    if let Some(user) = &args.user {
        raw.user = Some(user.clone());
    }
    if let Some(stdin) = args.stdin {
        raw.stdin = stdin;
        raw.stdin_file = None;
    }
    raw
}

/// Simple dry-run output: print the resolved invocation.
fn print_dry_run(file: &RunnerFile) {
    let raw = file.raw();
    println!("procrun dry-run");
    println!("  command: {}", raw.command);
    if !raw.args.is_empty() {
        println!("  args: {:?}", raw.args);
    }
    println!("  dir: {}", raw.dir.as_deref().unwrap_or("<current>"));
    if !raw.env.is_empty() {
        println!("  env: {:?} (inherit_env = {})", raw.env, raw.inherit_env);
    }
    if let Some(user) = &raw.user {
        println!("  user: {user}");
    }
    match &raw.stdin_file {
        Some(path) => println!("  stdin: file {path}"),
        None => println!("  stdin: {:?}", raw.stdin),
    }
    print_output("stdout", &raw.stdout);
    if raw.redirect_stderr {
        println!("  stderr: redirected to stdout");
    } else {
        print_output("stderr", &raw.stderr);
    }

    debug!("dry-run complete (no execution)");
}

fn print_output(name: &str, section: &config::OutputSection) {
    let mut targets = Vec::new();
    if section.console {
        targets.push("console".to_string());
    }
    if let Some(file) = &section.file {
        targets.push(format!(
            "{file} (max_size = {} MB, max_age = {} days, max_backups = {})",
            section.max_size, section.max_age, section.max_backups
        ));
    }
    if targets.is_empty() {
        println!("  {name}: discarded");
    } else {
        println!("  {name}: {}", targets.join(", "));
    }
}
