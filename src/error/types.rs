//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::io;
use std::net::SocketAddrV4;
use std::time::Duration;

use thiserror::Error;

/// Authentication module errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Invalid password for user: {0}")]
    InvalidPassword(String),
    #[error("Malformed input: {0}")]
    MalformedInput(String),
    #[error("PASS received without a pending USER")]
    NoPendingUser,
    #[error("User not logged in")]
    NotLoggedIn,
}

/// Path sandbox errors
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Path escapes the user root: {0}")]
    Escape(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

/// Navigate module errors
#[derive(Debug, Error)]
pub enum NavigateError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("Not a directory: {0}")]
    NotADirectory(String),
}

/// Storage lookups performed before a transfer
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Not a regular file: {0}")]
    NotAFile(String),
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Transfer module errors
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("No transfer mode configured; send PORT or PASV first")]
    NoTransferMode,
    #[error("No available port in passive range {min}-{max}")]
    NoAvailablePort { min: u16, max: u16 },
    #[error("No IPv4 address to announce for passive mode")]
    NoPassiveAddress,
    #[error("Failed to connect to {0}: {1}")]
    ConnectFailed(SocketAddrV4, io::Error),
    #[error("Failed to accept data connection: {0}")]
    AcceptFailed(io::Error),
    #[error("Timed out after {0:?} waiting for the data connection")]
    Timeout(Duration),
    #[error("Transfer aborted: {0}")]
    Aborted(io::Error),
}

/// Protocol-level errors: malformed or unsupported requests
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Command not implemented: {0}")]
    UnknownCommand(String),
    #[error("Missing argument for {0}")]
    MissingArgument(&'static str),
    #[error("Invalid host-port argument: {0}")]
    InvalidHostPort(String),
    #[error("Command line too long")]
    LineTooLong,
    #[error("Not permitted: {0}")]
    NotPermitted(String),
}

/// General FTP server error that encompasses all error types
#[derive(Debug, Error)]
pub enum FtpServerError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("Navigate error: {0}")]
    Navigate(#[from] NavigateError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<SandboxError> for FtpServerError {
    fn from(error: SandboxError) -> Self {
        FtpServerError::Navigate(NavigateError::Sandbox(error))
    }
}
