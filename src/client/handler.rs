use log::{info, warn};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};

use crate::client::Session;
use crate::error::{FtpServerError, ProtocolError, handle_error};
use crate::protocol::responses::{self, Reply, send_reply};
use crate::protocol::{SessionFlow, handle_command, parse_command};
use crate::server::ServerContext;

/// One line read from the control channel.
#[derive(Debug, PartialEq, Eq)]
enum ControlLine {
    Request(String),
    TooLong,
    Closed,
}

/// Runs one FTP session over any byte stream.
///
/// - Sends the 220 greeting, then reads and answers one command at a time.
/// - Ends on QUIT, SHUTDOWN, end of stream or a control-channel I/O error.
/// - On every exit path the session's passive listener is released and the
///   stream is shut down; an accepted SHUTDOWN then triggers the listener stop.
pub async fn handle_client<S>(
    stream: S,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
    context: Arc<ServerContext>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    info!("Client {} connected", peer_addr);

    let (read_half, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);
    let mut session = Session::new(peer_addr, local_addr);

    let outcome = serve(&mut reader, &mut writer, &mut session, &context).await;

    session.close();
    let _ = writer.shutdown().await;

    match outcome {
        Ok(SessionFlow::Shutdown) => {
            info!("Client {} disconnected, stopping listener", peer_addr);
            context.shutdown.trigger();
        }
        Ok(_) => info!("Client {} disconnected", peer_addr),
        Err(e) => warn!("Session with {} ended: {}", peer_addr, e),
    }
}

async fn serve<R, W>(
    reader: &mut R,
    writer: &mut W,
    session: &mut Session,
    context: &ServerContext,
) -> io::Result<SessionFlow>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    send_reply(writer, &Reply::new(responses::READY, "sandftp ready")).await?;

    let max_length = context.config.max_command_length;
    let mut buffer = Vec::new();

    loop {
        let line = match read_control_line(reader, &mut buffer, max_length).await? {
            ControlLine::Closed => {
                info!("Connection closed by client {}", session.peer_addr());
                return Ok(SessionFlow::Close);
            }
            ControlLine::TooLong => {
                reject(writer, ProtocolError::LineTooLong.into()).await?;
                continue;
            }
            ControlLine::Request(line) => line,
        };

        if line.trim().is_empty() {
            continue;
        }

        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(e) => {
                reject(writer, e.into()).await?;
                continue;
            }
        };

        info!("Received from {}: {}", session.peer_addr(), command.log_line());

        match handle_command(session, context, command, writer).await? {
            SessionFlow::Continue => {}
            flow => return Ok(flow),
        }
    }
}

async fn reject<W>(writer: &mut W, err: FtpServerError) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    handle_error(&err);
    send_reply(writer, &err.to_reply()).await
}

/// Reads one LF-terminated line of at most `max_length` bytes (excluding the
/// line terminator). Longer lines are consumed and discarded.
async fn read_control_line<R>(
    reader: &mut R,
    buffer: &mut Vec<u8>,
    max_length: usize,
) -> io::Result<ControlLine>
where
    R: AsyncBufRead + Unpin,
{
    // Room for the CRLF terminator.
    let limit = max_length as u64 + 2;

    buffer.clear();
    let n = (&mut *reader).take(limit).read_until(b'\n', buffer).await?;
    if n == 0 {
        return Ok(ControlLine::Closed);
    }

    if buffer.last() != Some(&b'\n') && n as u64 == limit {
        discard_rest_of_line(reader, limit).await?;
        return Ok(ControlLine::TooLong);
    }

    while matches!(buffer.last(), Some(b'\n' | b'\r')) {
        buffer.pop();
    }
    if buffer.len() > max_length {
        return Ok(ControlLine::TooLong);
    }

    Ok(ControlLine::Request(
        String::from_utf8_lossy(buffer).into_owned(),
    ))
}

async fn discard_rest_of_line<R>(reader: &mut R, chunk: u64) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut sink = Vec::new();
    loop {
        sink.clear();
        let n = (&mut *reader).take(chunk).read_until(b'\n', &mut sink).await?;
        if n == 0 || sink.last() == Some(&b'\n') {
            return Ok(());
        }
    }
}
