//! Module `command`
//!
//! Defines the FTP command set accepted on the control channel and the parser
//! that turns one request line into a `Command`.

use crate::error::ProtocolError;

/// Represents an FTP command parsed from the client input.
///
/// Commands that require arguments store them as `String` variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    USER(String), // Username for login
    PASS(String), // Password for login, may be empty
    PWD,
    CWD(String), // Change working directory
    CDUP,
    LIST(Option<String>), // Directory listing, optional target
    RETR(String),         // Retrieve/download file
    SIZE(String),
    PORT(String), // Active mode data endpoint
    PASV,         // Enter passive mode
    TYPE(String),
    SYST,
    FEAT,
    NOOP,
    DATE,
    HOUR,
    FULL,
    QUIT,
    SHUTDOWN, // Administrative stop, loopback peers only
}

impl Command {
    /// Verb as sent on the wire.
    pub fn verb(&self) -> &'static str {
        match self {
            Command::USER(_) => "USER",
            Command::PASS(_) => "PASS",
            Command::PWD => "PWD",
            Command::CWD(_) => "CWD",
            Command::CDUP => "CDUP",
            Command::LIST(_) => "LIST",
            Command::RETR(_) => "RETR",
            Command::SIZE(_) => "SIZE",
            Command::PORT(_) => "PORT",
            Command::PASV => "PASV",
            Command::TYPE(_) => "TYPE",
            Command::SYST => "SYST",
            Command::FEAT => "FEAT",
            Command::NOOP => "NOOP",
            Command::DATE => "DATE",
            Command::HOUR => "HOUR",
            Command::FULL => "FULL",
            Command::QUIT => "QUIT",
            Command::SHUTDOWN => "SHUTDOWN",
        }
    }

    /// Rendering safe for logs: password arguments are masked.
    pub fn log_line(&self) -> String {
        match self {
            Command::PASS(_) => "PASS ****".to_string(),
            Command::USER(arg)
            | Command::CWD(arg)
            | Command::RETR(arg)
            | Command::SIZE(arg)
            | Command::PORT(arg)
            | Command::TYPE(arg)
            | Command::LIST(Some(arg)) => format!("{} {}", self.verb(), arg),
            _ => self.verb().to_string(),
        }
    }
}

/// Parses one request line (`VERB[ SP argument]`) into a `Command`.
///
/// The verb is case-insensitive. Unknown verbs yield
/// `ProtocolError::UnknownCommand`; a known verb missing its mandatory
/// argument yields `ProtocolError::MissingArgument`.
pub fn parse_command(raw: &str) -> Result<Command, ProtocolError> {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    let required = |verb: &'static str| {
        if arg.is_empty() {
            Err(ProtocolError::MissingArgument(verb))
        } else {
            Ok(arg.to_string())
        }
    };

    let command = match cmd.as_str() {
        "USER" => Command::USER(required("USER")?),
        "PASS" => Command::PASS(arg.to_string()),
        "PWD" | "XPWD" => Command::PWD,
        "CWD" | "XCWD" => Command::CWD(required("CWD")?),
        "CDUP" | "XCUP" => Command::CDUP,
        "LIST" => Command::LIST((!arg.is_empty()).then(|| arg.to_string())),
        "RETR" => Command::RETR(required("RETR")?),
        "SIZE" => Command::SIZE(required("SIZE")?),
        "PORT" => Command::PORT(required("PORT")?),
        "PASV" => Command::PASV,
        "TYPE" => Command::TYPE(required("TYPE")?),
        "SYST" => Command::SYST,
        "FEAT" => Command::FEAT,
        "NOOP" => Command::NOOP,
        "DATE" => Command::DATE,
        "HOUR" => Command::HOUR,
        "FULL" => Command::FULL,
        "QUIT" => Command::QUIT,
        "SHUTDOWN" => Command::SHUTDOWN,
        _ => return Err(ProtocolError::UnknownCommand(cmd)),
    };

    Ok(command)
}
