//! Transfer operations
//!
//! Data channel setup for FTP passive and active modes. Neither operation
//! touches the session; the caller installs the result as the new
//! `TransferMode`, which releases whatever the previous mode held.

use log::info;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};
use std::ops::RangeInclusive;

use crate::error::{FtpServerError, TransferError};
use crate::transfer::address::parse_host_port;
use crate::transfer::passive::bind_passive_listener;
use crate::transfer::results::{ActiveModeResult, PassiveModeResult};

/// Sets up passive mode: binds a listener on `bind_ip` within `port_range`
/// and pairs it with the address announced to the client.
pub async fn setup_passive_mode(
    bind_ip: IpAddr,
    announce_ip: Option<Ipv4Addr>,
    port_range: RangeInclusive<u16>,
) -> Result<PassiveModeResult, TransferError> {
    let announce_ip = announce_ip.ok_or(TransferError::NoPassiveAddress)?;
    let listener = bind_passive_listener(bind_ip, port_range).await?;
    let port = listener
        .local_addr()
        .map_err(TransferError::AcceptFailed)?
        .port();
    let announced = SocketAddrV4::new(announce_ip, port);

    info!("Passive listener ready, announcing {}", announced);

    Ok(PassiveModeResult {
        announced,
        listener,
    })
}

/// Sets up active mode from a PORT argument. Nothing is connected yet; the
/// endpoint is dialed once per LIST/RETR.
pub fn setup_active_mode(port_argument: &str) -> Result<ActiveModeResult, FtpServerError> {
    let data_socket = parse_host_port(port_argument)?;
    info!("Active mode target set to {}", data_socket);
    Ok(ActiveModeResult { data_socket })
}
