// src/exec/credential.rs

//! Run-as-user support.
//!
//! A user name is resolved to a numeric uid/gid through an
//! [`IdentityResolver`] and applied to the command before spawning. The child
//! runs with exactly the resolved primary group: when a uid is set from a
//! privileged parent, supplementary groups are dropped rather than inherited.

use anyhow::Result as AnyResult;
use tokio::process::Command;

use crate::errors::{Result, RunnerError};

/// Numeric identity the child process runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential {
    pub uid: u32,
    pub gid: u32,
}

impl Credential {
    /// Attach this identity to `cmd`.
    pub fn apply(&self, cmd: &mut Command) {
        #[cfg(unix)]
        {
            cmd.uid(self.uid);
            cmd.gid(self.gid);
        }
        #[cfg(not(unix))]
        {
            let _ = cmd;
        }
    }
}

/// Looks up user names in some identity database.
///
/// `Ok(None)` means the user does not exist; `Err` means the lookup itself
/// failed.
pub trait IdentityResolver: Send + Sync {
    fn lookup(&self, name: &str) -> AnyResult<Option<Credential>>;
}

/// Resolver backed by the OS user database.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[cfg(unix)]
impl IdentityResolver for SystemResolver {
    fn lookup(&self, name: &str) -> AnyResult<Option<Credential>> {
        use anyhow::Context;

        let user = nix::unistd::User::from_name(name)
            .with_context(|| format!("looking up user '{name}'"))?;

        Ok(user.map(|u| Credential {
            uid: u.uid.as_raw(),
            gid: u.gid.as_raw(),
        }))
    }
}

#[cfg(not(unix))]
impl IdentityResolver for SystemResolver {
    fn lookup(&self, _name: &str) -> AnyResult<Option<Credential>> {
        anyhow::bail!("running as another user is not supported on this platform")
    }
}

/// Resolve `user`, mapping every failure to `CredentialResolution`.
pub fn resolve_credential(resolver: &dyn IdentityResolver, user: &str) -> Result<Credential> {
    match resolver.lookup(user) {
        Ok(Some(cred)) => Ok(cred),
        Ok(None) => Err(RunnerError::CredentialResolution {
            user: user.to_string(),
            source: "unknown user".into(),
        }),
        Err(err) => Err(RunnerError::CredentialResolution {
            user: user.to_string(),
            source: err.into(),
        }),
    }
}
