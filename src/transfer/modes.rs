//! FTP Transfer modes
//!
//! Handles active and passive mode state of one session.

use std::net::SocketAddrV4;
use tokio::net::TcpListener;

/// Data-channel topology configured by the last PORT or PASV.
///
/// Holds at most one live endpoint: replacing the mode drops, and thereby
/// closes, any previous passive listener.
#[derive(Debug, Default)]
pub enum TransferMode {
    #[default]
    Undefined,
    /// Server connects out to the client-specified endpoint.
    Active(SocketAddrV4),
    /// Server accepts one connection per transfer on this listener.
    Passive(TcpListener),
}

impl TransferMode {
    pub fn is_configured(&self) -> bool {
        !matches!(self, TransferMode::Undefined)
    }

    /// Local port of the passive listener, if any.
    pub fn passive_port(&self) -> Option<u16> {
        match self {
            TransferMode::Passive(listener) => listener.local_addr().ok().map(|addr| addr.port()),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransferMode::Undefined => "undefined",
            TransferMode::Active(_) => "active",
            TransferMode::Passive(_) => "passive",
        }
    }
}
