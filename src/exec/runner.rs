// src/exec/runner.rs

//! Lifecycle of a single external process.
//!
//! A [`Runner`] moves between two states:
//!
//! ```text
//!            start()                    process exits
//! Stopped ──────────────▶ Started ──────────────────────▶ Stopped
//! ```
//!
//! `start` does all setup (credentials, log sinks, pipes) and spawns the
//! process while holding the runner's lock, then hands the child to a
//! background completion watcher. The watcher waits for the exit, lets the
//! output pumps drain, closes the runner-owned log files and flips the state
//! back to `Stopped`, whether or not anybody ever calls [`Runner::wait`].
//!
//! Two behaviours are deliberate and worth knowing about:
//!
//! - `start` on an already started runner is a no-op returning `Ok(())`.
//! - `wait` on a stopped runner returns `Ok(())` immediately, even if the last
//!   run failed and nobody observed it. Only callers that saw the runner in the
//!   `Started` state get the exit result.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use anyhow::anyhow;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{InputSource, OutputConfig, RunnerConfig};
use crate::errors::{ExitError, ExitKind, Result, RunnerError};
use crate::exec::credential::{IdentityResolver, SystemResolver, resolve_credential};
use crate::exec::pump::spawn_pump;
use crate::sink::{
    FanoutWriter, RotatingSinkFactory, SharedSink, Sink, SinkFactory, resolve_against,
};
use crate::types::RunState;

/// Result of one run as seen by waiters.
type RunOutcome = std::result::Result<(), ExitError>;

/// Single-slot completion signal: `None` until the watcher publishes.
type CompletionRx = watch::Receiver<Option<RunOutcome>>;

/// A pump task; yields the first sink write failure of its stream.
type OutputPump = JoinHandle<Option<std::io::Error>>;

/// The live process as tracked by the runner.
#[derive(Debug, Clone, Copy)]
pub struct ProcessHandle {
    pub pid: Option<u32>,
    pub started_at: Instant,
}

/// Cheap to clone; all clones drive the same process.
#[derive(Clone)]
pub struct Runner {
    inner: Arc<Shared>,
}

struct Shared {
    config: RunnerConfig,
    resolver: Arc<dyn IdentityResolver>,
    sinks: Arc<dyn SinkFactory>,
    state: Mutex<RunnerState>,
}

#[derive(Default)]
struct RunnerState {
    run_state: RunState,
    process: Option<ProcessHandle>,
    stdout_file: Option<SharedSink>,
    stderr_file: Option<SharedSink>,
    done: Option<CompletionRx>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, RunnerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Runner {
    /// Create a stopped runner that resolves users through the OS.
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    pub fn with_resolver(config: RunnerConfig, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self::with_collaborators(config, resolver, Arc::new(RotatingSinkFactory))
    }

    /// Full constructor: user lookup and log sink creation both go through
    /// the given collaborators.
    pub fn with_collaborators(
        config: RunnerConfig,
        resolver: Arc<dyn IdentityResolver>,
        sinks: Arc<dyn SinkFactory>,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                config,
                resolver,
                sinks,
                state: Mutex::new(RunnerState::default()),
            }),
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.inner.config
    }

    pub fn state(&self) -> RunState {
        self.inner.lock_state().run_state
    }

    /// Pid of the live process, if the runner is started.
    pub fn pid(&self) -> Option<u32> {
        self.inner.lock_state().process.and_then(|p| p.pid)
    }

    pub fn process(&self) -> Option<ProcessHandle> {
        self.inner.lock_state().process
    }

    /// Spawn the configured process.
    ///
    /// Must be called from within a Tokio runtime. Setup failures are
    /// returned here and leave the runner `Stopped` with nothing open.
    pub fn start(&self) -> Result<()> {
        let mut state = self.inner.lock_state();

        if state.run_state != RunState::Stopped {
            debug!(
                command = %self.inner.config.command,
                pid = ?state.process.and_then(|p| p.pid),
                "start requested while already running; ignoring"
            );
            return Ok(());
        }

        let cfg = &self.inner.config;
        let dir = working_dir(cfg);
        let mut cmd = build_command(cfg, &dir);

        if let Some(user) = cfg.user.as_deref() {
            let cred = resolve_credential(self.inner.resolver.as_ref(), user)?;
            debug!(user, uid = cred.uid, gid = cred.gid, "running process as user");
            cred.apply(&mut cmd);
        }

        let sinks = &self.inner.sinks;
        let stdout_file = match &cfg.stdout.file {
            Some(spec) => Some(sinks.build(&dir, spec)?),
            None => None,
        };

        let stderr_file = match (&cfg.stderr.file, cfg.redirect_stderr) {
            (Some(spec), false) => match sinks.build(&dir, spec) {
                Ok(file) => Some(file),
                Err(e) => {
                    close_owned(stdout_file, "stdout");
                    return Err(e);
                }
            },
            _ => None,
        };

        let stdout_writer = fanout_for(&cfg.stdout, stdout_file.as_ref(), cfg.redirect_stderr);
        let stderr_writer = if cfg.redirect_stderr {
            stdout_writer.clone()
        } else {
            fanout_for(&cfg.stderr, stderr_file.as_ref(), false)
        };

        let (child, pumps) = match spawn_child(cfg, &dir, cmd, stdout_writer, stderr_writer) {
            Ok(spawned) => spawned,
            Err(e) => {
                close_owned(stdout_file, "stdout");
                close_owned(stderr_file, "stderr");
                return Err(e);
            }
        };

        let (tx, rx) = watch::channel(None);
        let handle = ProcessHandle {
            pid: child.id(),
            started_at: Instant::now(),
        };

        state.process = Some(handle);
        state.stdout_file = stdout_file;
        state.stderr_file = stderr_file;
        state.done = Some(rx);
        state.run_state = RunState::Started;
        drop(state);

        info!(
            command = %cfg.command,
            args = ?cfg.args,
            dir = %dir.display(),
            pid = ?handle.pid,
            "process started"
        );

        tokio::spawn(watch_completion(Arc::clone(&self.inner), child, pumps, tx));
        Ok(())
    }

    /// Wait for the current run to finish.
    ///
    /// Returns `Ok(())` right away when the runner is stopped, including when
    /// the run already finished before this call.
    pub async fn wait(&self) -> Result<()> {
        let mut rx = {
            let state = self.inner.lock_state();
            if state.run_state == RunState::Stopped {
                return Ok(());
            }
            let Some(rx) = state.done.clone() else {
                return Ok(());
            };
            rx
        };

        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(published) => (*published).clone(),
            Err(_) => {
                return Err(RunnerError::Other(anyhow!(
                    "completion watcher exited without publishing a result"
                )));
            }
        };

        match outcome {
            Some(Err(e)) => Err(e.into()),
            _ => Ok(()),
        }
    }

    /// `start` followed by `wait`.
    pub async fn run(&self) -> Result<()> {
        self.start()?;
        self.wait().await
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("Runner")
            .field("command", &self.inner.config.command)
            .field("state", &state.run_state)
            .field("process", &state.process)
            .finish()
    }
}

fn working_dir(cfg: &RunnerConfig) -> PathBuf {
    match cfg.dir.as_ref().filter(|d| !d.as_os_str().is_empty()) {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn build_command(cfg: &RunnerConfig, dir: &Path) -> Command {
    let mut cmd = Command::new(&cfg.command);
    cmd.args(&cfg.args).current_dir(dir);

    if !cfg.inherit_env {
        cmd.env_clear();
    }
    for entry in &cfg.env {
        match entry.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                cmd.env(key, value);
            }
            _ => warn!(entry = %entry, "ignoring environment entry without KEY="),
        }
    }
    cmd
}

/// Combine a stream's direct sink and owned log file, if any.
fn fanout_for(
    output: &OutputConfig,
    file: Option<&SharedSink>,
    synchronized: bool,
) -> Option<Arc<FanoutWriter>> {
    let mut sinks: Vec<SharedSink> = Vec::new();
    if let Some(sink) = &output.sink {
        sinks.push(Arc::clone(sink));
    }
    if let Some(file) = file {
        sinks.push(Arc::clone(file));
    }
    if sinks.is_empty() {
        return None;
    }

    let writer = FanoutWriter::new(sinks);
    Some(Arc::new(if synchronized {
        writer.synchronized()
    } else {
        writer
    }))
}

fn spawn_child(
    cfg: &RunnerConfig,
    dir: &Path,
    mut cmd: Command,
    stdout_writer: Option<Arc<FanoutWriter>>,
    stderr_writer: Option<Arc<FanoutWriter>>,
) -> Result<(Child, Vec<OutputPump>)> {
    let spawn_err = |source: std::io::Error| RunnerError::ProcessSpawn {
        command: cfg.command.clone(),
        source,
    };

    let stdin = match &cfg.stdin {
        InputSource::Null => Stdio::null(),
        InputSource::Inherit => Stdio::inherit(),
        InputSource::File(path) => {
            let file = std::fs::File::open(resolve_against(dir, path)).map_err(spawn_err)?;
            Stdio::from(file)
        }
    };

    cmd.stdin(stdin)
        .stdout(piped_or_null(stdout_writer.is_some()))
        .stderr(piped_or_null(stderr_writer.is_some()));

    let mut child = cmd.spawn().map_err(spawn_err)?;

    let mut pumps = Vec::with_capacity(2);
    if let (Some(out), Some(writer)) = (child.stdout.take(), stdout_writer) {
        pumps.push(spawn_pump("stdout", out, writer));
    }
    if let (Some(err), Some(writer)) = (child.stderr.take(), stderr_writer) {
        pumps.push(spawn_pump("stderr", err, writer));
    }

    Ok((child, pumps))
}

fn piped_or_null(piped: bool) -> Stdio {
    if piped { Stdio::piped() } else { Stdio::null() }
}

fn close_owned(file: Option<SharedSink>, stream: &'static str) {
    if let Some(file) = file {
        if let Err(e) = file.close() {
            warn!(stream, error = %e, "closing log file failed");
        }
    }
}

/// Runs once per successful `start`.
async fn watch_completion(
    shared: Arc<Shared>,
    mut child: Child,
    pumps: Vec<OutputPump>,
    tx: watch::Sender<Option<RunOutcome>>,
) {
    let mut outcome = match child.wait().await {
        Ok(status) => exit_outcome(status),
        Err(e) => Err(ExitError {
            kind: ExitKind::Wait(e.to_string()),
        }),
    };

    for pump in pumps {
        match pump.await {
            Ok(Some(e)) if outcome.is_ok() => {
                outcome = Err(ExitError {
                    kind: ExitKind::Output(e.to_string()),
                });
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "output pump task failed"),
        }
    }

    let mut state = shared.lock_state();
    close_owned(state.stdout_file.take(), "stdout");
    close_owned(state.stderr_file.take(), "stderr");
    let process = state.process.take();
    state.run_state = RunState::Stopped;
    state.done = None;

    match &outcome {
        Ok(()) => info!(
            command = %shared.config.command,
            pid = ?process.and_then(|p| p.pid),
            "process exited"
        ),
        Err(e) => warn!(
            command = %shared.config.command,
            pid = ?process.and_then(|p| p.pid),
            error = %e,
            "process exited with failure"
        ),
    }

    tx.send_replace(Some(outcome));
    drop(state);
}

fn exit_outcome(status: std::process::ExitStatus) -> RunOutcome {
    if status.success() {
        return Ok(());
    }
    if let Some(code) = status.code() {
        return Err(ExitError {
            kind: ExitKind::Code(code),
        });
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return Err(ExitError {
                kind: ExitKind::Signal(sig),
            });
        }
    }

    Err(ExitError {
        kind: ExitKind::Code(-1),
    })
}
