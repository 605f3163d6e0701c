use std::collections::HashMap;

use procrun::exec::{Credential, IdentityResolver};

/// An in-memory user database.
///
/// Unknown names resolve to `Ok(None)`; names registered with
/// [`FakeResolver::failing`] make the lookup itself fail.
#[derive(Debug, Default)]
pub struct FakeResolver {
    users: HashMap<String, Credential>,
    broken: Vec<String>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, name: &str, uid: u32, gid: u32) -> Self {
        self.users.insert(name.to_string(), Credential { uid, gid });
        self
    }

    pub fn failing(mut self, name: &str) -> Self {
        self.broken.push(name.to_string());
        self
    }
}

impl IdentityResolver for FakeResolver {
    fn lookup(&self, name: &str) -> anyhow::Result<Option<Credential>> {
        if self.broken.iter().any(|b| b == name) {
            anyhow::bail!("user database unavailable");
        }
        Ok(self.users.get(name).copied())
    }
}
