// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawRunnerFile, RunnerFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawRunnerFile`.
///
/// This only performs TOML deserialization; it does **not** validate. Use
/// [`load_and_validate`] for that, or validate yourself after applying
/// command-line overrides.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawRunnerFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawRunnerFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunnerFile> {
    let raw_config = load_from_path(&path)?;
    let config = RunnerFile::try_from(raw_config)?;
    Ok(config)
}

/// `Procrun.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Procrun.toml")
}
