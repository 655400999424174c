//! Module `client`
//!
//! Defines the `Session` struct holding the per-connection protocol state:
//! authentication progress, the sandbox cursor and the transfer mode.

use log::info;
use std::net::SocketAddr;

use crate::auth::UserRecord;
use crate::error::AuthError;
use crate::navigate::Cursor;
use crate::transfer::TransferMode;

/// Authentication progress of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    /// USER accepted, PASS pending.
    UserNamed(String),
    Authenticated(String),
}

/// State of one control connection.
///
/// A cursor exists exactly when the session is authenticated.
#[derive(Debug)]
pub struct Session {
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    auth: AuthState,
    cursor: Option<Cursor>,
    transfer_mode: TransferMode,
}

impl Session {
    pub fn new(peer_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            local_addr,
            auth: AuthState::Unauthenticated,
            cursor: None,
            transfer_mode: TransferMode::Undefined,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.auth, AuthState::Authenticated(_))
    }

    /// Login awaiting its password, if any.
    pub fn pending_login(&self) -> Option<&str> {
        match &self.auth {
            AuthState::UserNamed(login) => Some(login),
            _ => None,
        }
    }

    /// Records an accepted USER; any previous login is discarded.
    pub fn name_user(&mut self, login: &str) {
        self.cursor = None;
        self.auth = AuthState::UserNamed(login.to_string());
    }

    /// Completes a login and positions the cursor at the user's root.
    pub fn authenticate(&mut self, user: &UserRecord) {
        info!("Client {} logged in as '{}'", self.peer_addr, user.login());
        self.auth = AuthState::Authenticated(user.login().to_string());
        self.cursor = Some(Cursor::new(user.root().to_path_buf()));
    }

    /// Drops back to Unauthenticated. The transfer mode is kept.
    pub fn reset_auth(&mut self) {
        self.auth = AuthState::Unauthenticated;
        self.cursor = None;
    }

    /// Cursor of an authenticated session, or `NotLoggedIn`.
    pub fn cursor(&self) -> Result<&Cursor, AuthError> {
        self.cursor.as_ref().ok_or(AuthError::NotLoggedIn)
    }

    pub fn cursor_mut(&mut self) -> Result<&mut Cursor, AuthError> {
        self.cursor.as_mut().ok_or(AuthError::NotLoggedIn)
    }

    pub fn transfer_mode(&self) -> &TransferMode {
        &self.transfer_mode
    }

    /// Installs a new transfer mode, closing any previous passive listener.
    pub fn set_transfer_mode(&mut self, mode: TransferMode) {
        self.transfer_mode = mode;
    }

    /// Releases everything the session holds.
    pub fn close(&mut self) {
        self.transfer_mode = TransferMode::Undefined;
        self.reset_auth();
    }
}
