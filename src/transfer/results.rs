//! Transfer result types
//!
//! Defines result structures returned by transfer operations.

use std::net::SocketAddrV4;
use tokio::net::TcpListener;

/// Result of setting up passive mode (PASV command)
#[derive(Debug)]
pub struct PassiveModeResult {
    /// Endpoint announced to the client in the 227 reply.
    pub announced: SocketAddrV4,
    pub listener: TcpListener,
}

/// Result of setting up active mode (PORT command)
#[derive(Debug)]
pub struct ActiveModeResult {
    pub data_socket: SocketAddrV4,
}
