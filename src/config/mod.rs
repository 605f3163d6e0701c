// src/config/mod.rs

//! Runner configuration.
//!
//! - [`model`] holds [`RunnerConfig`], the library input, and the TOML file
//!   model used by the `procrun` binary.
//! - [`loader`] reads a TOML file from disk.
//! - [`validate`] turns a [`RawRunnerFile`] into a checked [`RunnerFile`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    InputSource, OutputConfig, OutputSection, RawRunnerFile, RotateSpec, RunnerConfig,
    RunnerFile,
};
