//! This module provides the implementation for an instrument controlled via a raw TCP/IP socket.
//!
//! Most LAN-enabled SCPI instruments listen on such a socket, usually on port 5025.

use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use log::debug;

use crate::{Instrument, InstrumentError};

/// Poll interval of the socket. Reads return after this time if no data is available, such that
/// the session timeout of [`Instrument`] can be adjusted after the socket is opened.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A blocking TCP/IP interface using the [`std::net::TcpStream`] struct.
#[derive(Debug)]
pub struct TcpIpInterface {}

impl TcpIpInterface {
    /// Try to create a new [`Instrument`] session connected via TCP/IP.
    ///
    /// The terminator is by default set to `"\n"`, but can be changed using the `set_terminator`
    /// function. Note that the terminator is automatically appended to commands and reading
    /// responses will read until the terminator is found.
    ///
    /// The connection attempt itself and every response are bounded by `timeout`.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `timeout` - Timeout for connecting and for waiting on responses.
    pub fn try_new<A: ToSocketAddrs>(
        sock_addr: A,
        timeout: Duration,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        let mut last_err = None;
        for addr in sock_addr.to_socket_addrs()? {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => {
                    debug!("Connected to {addr}");
                    stream.set_write_timeout(Some(timeout))?;
                    stream.set_read_timeout(Some(POLL_INTERVAL))?;
                    stream.set_nodelay(true)?;
                    return Ok(Instrument::new(stream, timeout));
                }
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err
            .unwrap_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AddrNotAvailable,
                    "no socket address to connect to",
                )
            })
            .into())
    }
}
