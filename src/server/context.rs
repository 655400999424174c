//! State shared read-only by every session.

use crate::auth::UserDatabase;
use crate::config::ServerConfig;
use crate::server::ShutdownSignal;

/// Configuration, user database and the listener stop handle.
#[derive(Debug)]
pub struct ServerContext {
    pub config: ServerConfig,
    pub users: UserDatabase,
    pub shutdown: ShutdownSignal,
}

impl ServerContext {
    pub fn new(config: ServerConfig, users: UserDatabase, shutdown: ShutdownSignal) -> Self {
        Self {
            config,
            users,
            shutdown,
        }
    }
}
