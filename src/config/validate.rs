// src/config/validate.rs

use crate::config::model::{OutputSection, RawRunnerFile, RunnerFile};
use crate::errors::{Result, RunnerError};

impl TryFrom<RawRunnerFile> for RunnerFile {
    type Error = RunnerError;

    fn try_from(raw: RawRunnerFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(RunnerFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawRunnerFile) -> Result<()> {
    validate_command(cfg)?;
    validate_env(&cfg.env)?;
    validate_user(cfg)?;
    validate_output("stdout", &cfg.stdout)?;
    validate_output("stderr", &cfg.stderr)?;
    validate_stdin(cfg)?;
    warn_ignored_stderr(cfg);
    Ok(())
}

fn validate_command(cfg: &RawRunnerFile) -> Result<()> {
    if cfg.command.trim().is_empty() {
        return Err(RunnerError::ConfigError(
            "`command` must be set (in the config file or on the command line)".to_string(),
        ));
    }
    Ok(())
}

/// Every entry must look like `KEY=VALUE` with a non-empty key.
fn validate_env(env: &[String]) -> Result<()> {
    for entry in env {
        match entry.split_once('=') {
            Some((key, _)) if !key.is_empty() => {}
            _ => {
                return Err(RunnerError::ConfigError(format!(
                    "invalid env entry '{entry}' (expected KEY=VALUE)"
                )));
            }
        }
    }
    Ok(())
}

fn validate_user(cfg: &RawRunnerFile) -> Result<()> {
    if let Some(user) = &cfg.user {
        if user.trim().is_empty() {
            return Err(RunnerError::ConfigError(
                "`user` must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_output(name: &str, section: &OutputSection) -> Result<()> {
    if let Some(file) = &section.file {
        if file.trim().is_empty() {
            return Err(RunnerError::ConfigError(format!(
                "[{name}].file must not be empty when set"
            )));
        }
    }
    Ok(())
}

fn validate_stdin(cfg: &RawRunnerFile) -> Result<()> {
    if let Some(file) = &cfg.stdin_file {
        if file.trim().is_empty() {
            return Err(RunnerError::ConfigError(
                "`stdin_file` must not be empty when set".to_string(),
            ));
        }
    }
    Ok(())
}

fn warn_ignored_stderr(cfg: &RawRunnerFile) {
    if cfg.redirect_stderr && (cfg.stderr.console || cfg.stderr.file.is_some()) {
        tracing::warn!("redirect_stderr = true; the [stderr] section is ignored");
    }
}
