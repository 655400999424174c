//! Passive-mode port allocation.
//!
//! Linear scan over an inclusive port range; the first successful bind wins.
//! There is no cross-session registry of used ports, two sessions racing for
//! the same candidate are separated by the kernel's bind exclusivity alone.

use log::debug;
use std::net::IpAddr;
use std::ops::RangeInclusive;
use tokio::net::TcpListener;

use crate::error::TransferError;

/// Binds a listener on the first free port of `range`.
pub async fn bind_passive_listener(
    ip: IpAddr,
    range: RangeInclusive<u16>,
) -> Result<TcpListener, TransferError> {
    for port in range.clone() {
        match TcpListener::bind((ip, port)).await {
            Ok(listener) => {
                debug!("Passive listener bound on {}:{}", ip, port);
                return Ok(listener);
            }
            Err(e) => debug!("Passive port {} unavailable: {}", port, e),
        }
    }

    Err(TransferError::NoAvailablePort {
        min: *range.start(),
        max: *range.end(),
    })
}
