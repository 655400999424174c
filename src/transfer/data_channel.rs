//! Module `data_channel`
//!
//! Opens exactly one data connection per LIST/RETR according to the session's
//! transfer mode. The returned stream is owned by the calling command and is
//! closed when it goes out of scope, on success and failure alike.

use log::{debug, info, warn};
use std::net::IpAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

use crate::error::TransferError;
use crate::transfer::TransferMode;

/// Establishes the data connection for one transfer.
///
/// - Active mode: connects to the stored client endpoint.
/// - Passive mode: accepts one connection on the session's listener. Only a
///   connection from `control_peer`'s host is taken; others are dropped and
///   the wait continues.
/// - Undefined: reported as `TransferError::NoTransferMode` without touching
///   any socket.
pub async fn open_data_channel(
    mode: &TransferMode,
    control_peer: IpAddr,
    wait: Duration,
) -> Result<TcpStream, TransferError> {
    match mode {
        TransferMode::Undefined => Err(TransferError::NoTransferMode),
        TransferMode::Active(data_socket) => {
            info!("Active mode: connecting to client data socket {}", data_socket);
            match timeout(wait, TcpStream::connect(*data_socket)).await {
                Ok(Ok(stream)) => Ok(stream),
                Ok(Err(e)) => Err(TransferError::ConnectFailed(*data_socket, e)),
                Err(_) => Err(TransferError::Timeout(wait)),
            }
        }
        TransferMode::Passive(listener) => {
            debug!(
                "Passive mode: waiting for data connection on {:?}",
                listener.local_addr().ok()
            );
            timeout(wait, accept_from(listener, control_peer))
                .await
                .map_err(|_| TransferError::Timeout(wait))?
        }
    }
}

async fn accept_from(listener: &TcpListener, owner: IpAddr) -> Result<TcpStream, TransferError> {
    loop {
        let (stream, peer_addr) = listener
            .accept()
            .await
            .map_err(TransferError::AcceptFailed)?;

        if peer_addr.ip().to_canonical() == owner.to_canonical() {
            info!("Data connection accepted from {}", peer_addr);
            return Ok(stream);
        }

        warn!(
            "Rejected data connection from {} (control connection is from {})",
            peer_addr, owner
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, SocketAddrV4};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[tokio::test]
    async fn undefined_mode_reports_no_channel() {
        let err = open_data_channel(&TransferMode::Undefined, LOCALHOST, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::NoTransferMode));
    }

    #[tokio::test]
    async fn active_mode_connects_out() {
        let client = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = client.local_addr().unwrap().port();
        let mode = TransferMode::Active(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));

        let (opened, accepted) = tokio::join!(
            open_data_channel(&mode, LOCALHOST, Duration::from_secs(5)),
            client.accept()
        );
        let mut server_side = opened.unwrap();
        let (mut client_side, _) = accepted.unwrap();

        server_side.write_all(b"ping").await.unwrap();
        drop(server_side);
        let mut buf = Vec::new();
        client_side.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"ping");
    }

    #[tokio::test]
    async fn active_mode_refused_connection_is_reported() {
        let port = {
            let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
            probe.local_addr().unwrap().port()
        };
        let mode = TransferMode::Active(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port));
        let err = open_data_channel(&mode, LOCALHOST, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            TransferError::ConnectFailed(..) | TransferError::Timeout(_)
        ));
    }

    #[tokio::test]
    async fn passive_mode_accepts_and_listener_is_reusable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mode = TransferMode::Passive(listener);

        for _ in 0..2 {
            let (opened, connected) = tokio::join!(
                open_data_channel(&mode, LOCALHOST, Duration::from_secs(5)),
                TcpStream::connect(addr)
            );
            assert!(opened.is_ok());
            assert!(connected.is_ok());
        }
    }

    #[tokio::test]
    async fn passive_mode_times_out_without_client() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mode = TransferMode::Passive(listener);
        let err = open_data_channel(&mode, LOCALHOST, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Timeout(_)));
    }
}
