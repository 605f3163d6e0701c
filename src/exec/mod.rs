// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] owns the start/wait lifecycle of one process.
//! - [`credential`] resolves a run-as-user name into a uid/gid.
//! - [`pump`] copies piped child output into fan-out writers.

pub mod credential;
pub mod pump;
pub mod runner;

pub use credential::{Credential, IdentityResolver, SystemResolver, resolve_credential};
pub use runner::{ProcessHandle, Runner};
