//! Error handlers
//!
//! Maps domain errors onto FTP reply codes and client-facing replies.

use log::{error, warn};

use crate::error::types::{
    AuthError, FtpServerError, NavigateError, ProtocolError, StorageError, TransferError,
};
use crate::protocol::responses::{self, Reply};

/// Log an FTP server error at a level matching its severity
pub fn handle_error(err: &FtpServerError) {
    match err {
        FtpServerError::Io(_) | FtpServerError::Config(_) => error!("FTP Server Error: {}", err),
        FtpServerError::Transfer(TransferError::Aborted(_)) => error!("FTP Server Error: {}", err),
        _ => warn!("Request rejected: {}", err),
    }
}

/// Convert error to FTP response code
pub fn error_to_ftp_code(err: &FtpServerError) -> u16 {
    match err {
        FtpServerError::Auth(AuthError::NoPendingUser) => responses::BAD_SEQUENCE,
        FtpServerError::Auth(AuthError::MalformedInput(_)) => responses::SYNTAX_ERROR_ARGS,
        FtpServerError::Auth(_) => responses::NOT_LOGGED_IN,
        FtpServerError::Navigate(_) => responses::FILE_UNAVAILABLE,
        FtpServerError::Storage(StorageError::Io(_)) => responses::LOCAL_ERROR,
        FtpServerError::Storage(_) => responses::FILE_UNAVAILABLE,
        FtpServerError::Transfer(TransferError::Aborted(_)) => responses::LOCAL_ERROR,
        FtpServerError::Transfer(_) => responses::CANT_OPEN_DATA_CONNECTION,
        FtpServerError::Protocol(ProtocolError::UnknownCommand(_)) => {
            responses::COMMAND_NOT_IMPLEMENTED
        }
        FtpServerError::Protocol(ProtocolError::LineTooLong) => responses::SYNTAX_ERROR,
        FtpServerError::Protocol(ProtocolError::NotPermitted(_)) => responses::FILE_UNAVAILABLE,
        FtpServerError::Protocol(_) => responses::SYNTAX_ERROR_ARGS,
        FtpServerError::Config(_) | FtpServerError::Io(_) => responses::LOCAL_ERROR,
    }
}

/// Client-facing text for an error. Never includes host filesystem paths.
fn reply_text(err: &FtpServerError) -> String {
    match err {
        FtpServerError::Auth(AuthError::UnknownUser(_)) => "Unknown user".into(),
        FtpServerError::Auth(AuthError::InvalidPassword(_)) => "Login incorrect".into(),
        FtpServerError::Auth(AuthError::MalformedInput(_)) => {
            "Syntax error in parameters or arguments".into()
        }
        FtpServerError::Auth(AuthError::NoPendingUser) => "Login with USER first".into(),
        FtpServerError::Auth(AuthError::NotLoggedIn) => "Not logged in".into(),
        FtpServerError::Navigate(NavigateError::DirectoryNotFound(p)) => {
            format!("{}: Directory not found", p)
        }
        FtpServerError::Navigate(NavigateError::NotADirectory(p)) => {
            format!("{}: Not a directory", p)
        }
        FtpServerError::Navigate(NavigateError::Sandbox(_))
        | FtpServerError::Storage(StorageError::Sandbox(_)) => "Permission denied".into(),
        FtpServerError::Storage(StorageError::FileNotFound(p)) => format!("{}: File not found", p),
        FtpServerError::Storage(StorageError::NotAFile(p)) => format!("{}: Not a regular file", p),
        FtpServerError::Storage(StorageError::DirectoryNotFound(p)) => {
            format!("{}: Directory not found", p)
        }
        FtpServerError::Storage(StorageError::Io(_)) => {
            "Requested action aborted: local error in processing".into()
        }
        FtpServerError::Transfer(TransferError::NoTransferMode) => {
            "Use PORT or PASV first".into()
        }
        FtpServerError::Transfer(TransferError::Aborted(_)) => {
            "Requested action aborted: local error in processing".into()
        }
        FtpServerError::Transfer(_) => "Can't open data connection".into(),
        FtpServerError::Protocol(ProtocolError::UnknownCommand(_)) => {
            "Command not implemented".into()
        }
        FtpServerError::Protocol(ProtocolError::LineTooLong) => "Command too long".into(),
        FtpServerError::Protocol(ProtocolError::NotPermitted(what)) => {
            format!("{} not permitted", what)
        }
        FtpServerError::Protocol(_) => "Syntax error in parameters or arguments".into(),
        FtpServerError::Config(_) | FtpServerError::Io(_) => {
            "Requested action aborted: local error in processing".into()
        }
    }
}

impl FtpServerError {
    /// Reply code this error is reported with on the control channel.
    pub fn reply_code(&self) -> u16 {
        error_to_ftp_code(self)
    }

    /// Builds the reply for this error.
    pub fn to_reply(&self) -> Reply {
        Reply::new(self.reply_code(), reply_text(self))
    }
}
