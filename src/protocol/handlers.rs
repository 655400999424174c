//! Command handlers module for the sandftp server.
//!
//! This module defines one handler per FTP command. Handlers return the final
//! reply or an `FtpServerError`; the dispatcher turns errors into replies so
//! every command answers exactly once. Only control-channel I/O failures
//! escape as `io::Error` and end the session.

use chrono::Local;
use log::{info, warn};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::auth::{self, UserDatabase};
use crate::client::Session;
use crate::error::{AuthError, FtpServerError, ProtocolError, TransferError, handle_error};
use crate::navigate::change_directory;
use crate::protocol::Command;
use crate::protocol::responses::{self, Reply, send_reply};
use crate::server::ServerContext;
use crate::storage::{self, ListingEntry, RetrieveTarget};
use crate::transfer::{
    self, TransferMode, encode_host_port, handle_file_download, open_data_channel, send_listing,
};

type CommandOutcome = Result<Reply, FtpServerError>;

/// What the control loop does after a command has been answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    /// QUIT: close this session.
    Close,
    /// SHUTDOWN accepted: close this session, then stop the listener.
    Shutdown,
}

/// Features advertised by FEAT.
const FEATURES: [&str; 4] = ["SIZE", "DATE", "HOUR", "FULL"];

/// Dispatches a parsed command and writes its reply (plus any preliminary
/// reply of a transfer) to the control channel.
pub async fn handle_command<W>(
    session: &mut Session,
    context: &ServerContext,
    command: Command,
    writer: &mut W,
) -> io::Result<SessionFlow>
where
    W: AsyncWrite + Unpin,
{
    let (outcome, flow) = match command {
        Command::QUIT => (
            Ok(Reply::new(responses::CLOSING, "Goodbye")),
            SessionFlow::Close,
        ),
        Command::SHUTDOWN => handle_cmd_shutdown(session),
        Command::USER(login) => (
            handle_cmd_user(session, &context.users, &login),
            SessionFlow::Continue,
        ),
        Command::PASS(password) => (
            handle_cmd_pass(session, &context.users, &password),
            SessionFlow::Continue,
        ),
        Command::PWD => (handle_cmd_pwd(session), SessionFlow::Continue),
        Command::CWD(path) => (handle_cmd_cwd(session, &path).await, SessionFlow::Continue),
        Command::CDUP => (handle_cmd_cwd(session, "..").await, SessionFlow::Continue),
        Command::LIST(target) => (
            handle_cmd_list(session, context, target.as_deref(), writer).await?,
            SessionFlow::Continue,
        ),
        Command::RETR(path) => (
            handle_cmd_retr(session, context, &path, writer).await?,
            SessionFlow::Continue,
        ),
        Command::SIZE(path) => (handle_cmd_size(session, &path).await, SessionFlow::Continue),
        Command::PORT(arg) => (handle_cmd_port(session, &arg), SessionFlow::Continue),
        Command::PASV => (handle_cmd_pasv(session, context).await, SessionFlow::Continue),
        Command::TYPE(kind) => (
            Ok(Reply::new(responses::OK, format!("Type set to {}", kind.to_uppercase()))),
            SessionFlow::Continue,
        ),
        Command::SYST => (
            Ok(Reply::new(responses::SYSTEM_TYPE, "UNIX Type: L8")),
            SessionFlow::Continue,
        ),
        Command::FEAT => (handle_cmd_feat(), SessionFlow::Continue),
        Command::NOOP => (
            Ok(Reply::new(responses::OK, "NOOP ok")),
            SessionFlow::Continue,
        ),
        Command::DATE => (handle_cmd_clock(session, "%Y-%m-%d"), SessionFlow::Continue),
        Command::HOUR => (handle_cmd_clock(session, "%H:%M:%S"), SessionFlow::Continue),
        Command::FULL => (
            handle_cmd_clock(session, "%Y-%m-%d %H:%M:%S"),
            SessionFlow::Continue,
        ),
    };

    let reply = outcome.unwrap_or_else(|err| {
        handle_error(&err);
        err.to_reply()
    });
    send_reply(writer, &reply).await?;
    Ok(flow)
}

fn handle_cmd_user(session: &mut Session, users: &UserDatabase, login: &str) -> CommandOutcome {
    let user = match auth::validate_user(users, login) {
        Ok(user) => user,
        Err(e) => {
            session.reset_auth();
            return Err(e.into());
        }
    };

    if user.is_anonymous() {
        session.authenticate(user);
        return Ok(Reply::new(responses::LOGIN_SUCCESS, "Anonymous login ok"));
    }

    session.name_user(user.login());
    Ok(Reply::new(
        responses::PASSWORD_REQUIRED,
        format!("Password required for {}", user.login()),
    ))
}

fn handle_cmd_pass(session: &mut Session, users: &UserDatabase, password: &str) -> CommandOutcome {
    if session.is_authenticated() {
        return Ok(Reply::new(responses::LOGIN_SUCCESS, "Already logged in"));
    }

    let login = session
        .pending_login()
        .ok_or(AuthError::NoPendingUser)?
        .to_string();

    let checked = auth::validate_user(users, &login)
        .and_then(|user| auth::validate_password(user, password).map(|_| user));

    match checked {
        Ok(user) => {
            session.authenticate(user);
            Ok(Reply::new(responses::LOGIN_SUCCESS, "Login successful"))
        }
        Err(e) => {
            session.reset_auth();
            Err(e.into())
        }
    }
}

fn handle_cmd_pwd(session: &Session) -> CommandOutcome {
    let cursor = session.cursor()?;
    Ok(Reply::new(
        responses::PATH_CREATED,
        format!("\"{}\" is the current directory", cursor.working_directory()),
    ))
}

async fn handle_cmd_cwd(session: &mut Session, path: &str) -> CommandOutcome {
    let cursor = session.cursor_mut()?;
    let result = change_directory(cursor, path).await?;
    Ok(Reply::new(
        responses::FILE_ACTION_OK,
        format!("Directory changed to {}", result.virtual_path),
    ))
}

async fn handle_cmd_size(session: &Session, path: &str) -> CommandOutcome {
    let target = storage::prepare_file_retrieval(session.cursor()?, path).await?;
    Ok(Reply::new(responses::FILE_STATUS, target.size.to_string()))
}

/// Resolves and enumerates the LIST target.
async fn prepare_listing(
    session: &Session,
    target: Option<&str>,
) -> Result<Vec<ListingEntry>, FtpServerError> {
    let dir = storage::locate_directory(session.cursor()?, target).await?;
    Ok(storage::list_directory(&dir).await?)
}

async fn prepare_retrieval(
    session: &Session,
    path: &str,
) -> Result<RetrieveTarget, FtpServerError> {
    Ok(storage::prepare_file_retrieval(session.cursor()?, path).await?)
}

async fn connect_data_channel(
    session: &Session,
    context: &ServerContext,
) -> Result<TcpStream, FtpServerError> {
    let stream = open_data_channel(
        session.transfer_mode(),
        session.peer_addr().ip(),
        context.config.data_timeout(),
    )
    .await?;
    Ok(stream)
}

async fn handle_cmd_list<W>(
    session: &Session,
    context: &ServerContext,
    target: Option<&str>,
    writer: &mut W,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    let entries = match prepare_listing(session, target).await {
        Ok(entries) => entries,
        Err(e) => return Ok(Err(e)),
    };
    let mut data_stream = match connect_data_channel(session, context).await {
        Ok(stream) => stream,
        Err(e) => return Ok(Err(e)),
    };

    send_reply(
        writer,
        &Reply::new(
            responses::OPENING_DATA_CONNECTION,
            "Opening data connection for directory listing",
        ),
    )
    .await?;

    let outcome = match send_listing(&mut data_stream, &entries).await {
        Ok(()) => {
            info!(
                "Listed {} entries for client {}",
                entries.len(),
                session.peer_addr()
            );
            Ok(Reply::new(responses::TRANSFER_COMPLETE, "Transfer complete"))
        }
        Err(e) => Err(TransferError::Aborted(e).into()),
    };
    let _ = data_stream.shutdown().await;
    Ok(outcome)
}

async fn handle_cmd_retr<W>(
    session: &Session,
    context: &ServerContext,
    path: &str,
    writer: &mut W,
) -> io::Result<CommandOutcome>
where
    W: AsyncWrite + Unpin,
{
    let target = match prepare_retrieval(session, path).await {
        Ok(target) => target,
        Err(e) => return Ok(Err(e)),
    };
    let mut data_stream = match connect_data_channel(session, context).await {
        Ok(stream) => stream,
        Err(e) => return Ok(Err(e)),
    };

    send_reply(
        writer,
        &Reply::new(
            responses::OPENING_DATA_CONNECTION,
            format!(
                "Opening BINARY mode data connection for {} ({} bytes)",
                target.virtual_path, target.size
            ),
        ),
    )
    .await?;

    let outcome = match handle_file_download(
        &mut data_stream,
        &target.file_path,
        context.config.buffer_size,
    )
    .await
    {
        Ok(_) => Ok(Reply::new(responses::TRANSFER_COMPLETE, "Transfer complete")),
        Err(e) => Err(TransferError::Aborted(e).into()),
    };
    let _ = data_stream.shutdown().await;
    Ok(outcome)
}

fn handle_cmd_port(session: &mut Session, arg: &str) -> CommandOutcome {
    session.cursor()?;
    let result = transfer::setup_active_mode(arg)?;
    session.set_transfer_mode(TransferMode::Active(result.data_socket));
    Ok(Reply::new(responses::OK, "PORT command successful"))
}

async fn handle_cmd_pasv(session: &mut Session, context: &ServerContext) -> CommandOutcome {
    session.cursor()?;

    // The previous listener is released before scanning so its port can be reused.
    session.set_transfer_mode(TransferMode::Undefined);

    let announce_ip = match context.config.announced_passive_ip()? {
        Some(ip) => Some(ip),
        None => match session.local_addr().ip().to_canonical() {
            std::net::IpAddr::V4(ip) => Some(ip),
            std::net::IpAddr::V6(_) => None,
        },
    };

    let result = transfer::setup_passive_mode(
        context.config.bind_ip()?,
        announce_ip,
        context.config.passive_range(),
    )
    .await?;

    session.set_transfer_mode(TransferMode::Passive(result.listener));
    Ok(Reply::new(
        responses::PASSIVE_MODE,
        format!(
            "Entering Passive Mode ({})",
            encode_host_port(&result.announced)
        ),
    ))
}

fn handle_cmd_feat() -> CommandOutcome {
    Ok(Reply::multiline(
        responses::SYSTEM_STATUS,
        "Extensions supported:",
        FEATURES.iter().map(|feature| format!(" {}", feature)),
        "End",
    ))
}

fn handle_cmd_clock(session: &Session, format: &str) -> CommandOutcome {
    session.cursor()?;
    Ok(Reply::new(
        responses::SYSTEM_STATUS,
        Local::now().format(format).to_string(),
    ))
}

fn handle_cmd_shutdown(session: &Session) -> (CommandOutcome, SessionFlow) {
    let peer = session.peer_addr();
    if peer.ip().to_canonical().is_loopback() {
        info!("Shutdown requested by {}", peer);
        (
            Ok(Reply::new(responses::CLOSING, "Server shutting down")),
            SessionFlow::Shutdown,
        )
    } else {
        warn!("Refused shutdown request from non-loopback peer {}", peer);
        (
            Err(ProtocolError::NotPermitted("SHUTDOWN".into()).into()),
            SessionFlow::Continue,
        )
    }
}
