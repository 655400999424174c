//! Credential storage
//!
//! The user database is built once at startup from the configuration and
//! shared read-only by every session.

use log::info;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ServerConfig;

/// Login that is authenticated by `USER` alone.
pub const ANONYMOUS_LOGIN: &str = "anonymous";

/// A provisioned account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    login: String,
    password: String,
    root: PathBuf,
}

impl UserRecord {
    pub fn new(login: impl Into<String>, password: impl Into<String>, root: PathBuf) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
            root,
        }
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    /// Canonical absolute sandbox root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_anonymous(&self) -> bool {
        self.login == ANONYMOUS_LOGIN
    }

    /// An empty stored password accepts any submission.
    pub fn accepts(&self, password: &str) -> bool {
        self.password.is_empty() || self.password == password
    }
}

/// Immutable login → account map.
#[derive(Debug, Default)]
pub struct UserDatabase {
    users: HashMap<String, UserRecord>,
}

impl UserDatabase {
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: records
                .into_iter()
                .map(|record| (record.login.clone(), record))
                .collect(),
        }
    }

    /// Creates every configured user root that is missing and records its
    /// canonical path.
    pub fn provision(config: &ServerConfig) -> io::Result<Self> {
        let mut records = Vec::with_capacity(config.users.len());
        for user in &config.users {
            let root = config.user_root(user);
            fs::create_dir_all(&root)?;
            let root = fs::canonicalize(&root)?;
            info!("User '{}' rooted at {}", user.login, root.display());
            records.push(UserRecord::new(&user.login, &user.password, root));
        }
        Ok(Self::new(records))
    }

    pub fn get(&self, login: &str) -> Option<&UserRecord> {
        self.users.get(login)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}
