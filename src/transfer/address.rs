//! `a,b,c,d,p1,p2` host-port encoding used by PORT and PASV.

use std::net::{Ipv4Addr, SocketAddrV4};

use crate::error::ProtocolError;

/// Parses a PORT argument: exactly six comma-separated byte values, the first
/// four forming the IPv4 address and the port being `p1 * 256 + p2`.
pub fn parse_host_port(arg: &str) -> Result<SocketAddrV4, ProtocolError> {
    let invalid = || ProtocolError::InvalidHostPort(arg.to_string());

    let fields: Vec<&str> = arg.split(',').map(str::trim).collect();
    if fields.len() != 6 {
        return Err(invalid());
    }

    let mut bytes = [0u8; 6];
    for (slot, field) in bytes.iter_mut().zip(&fields) {
        *slot = field.parse::<u8>().map_err(|_| invalid())?;
    }

    let ip = Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]);
    let port = u16::from(bytes[4]) * 256 + u16::from(bytes[5]);
    Ok(SocketAddrV4::new(ip, port))
}

/// Encodes an endpoint as `a,b,c,d,p1,p2`.
pub fn encode_host_port(addr: &SocketAddrV4) -> String {
    let [a, b, c, d] = addr.ip().octets();
    let port = addr.port();
    format!("{},{},{},{},{},{}", a, b, c, d, port / 256, port % 256)
}
