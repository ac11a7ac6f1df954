//! This module provides the byte-stream implementation of the [`InstrumentInterface`] trait.
//!
//! It can be used with any type that implements [`std::io::Read`] and [`std::io::Write`],
//! such as [`std::net::TcpStream`] or a boxed [`serialport::SerialPort`].

use std::time::Duration;

use log::debug;

use crate::{InstrumentError, InstrumentInterface};

/// A session that can be built from any port that implements [`std::io::Read`] and
/// [`std::io::Write`].
///
/// This struct is used by the native backend for TCP/IP sockets and serial ports. However, it can
/// also be used with any other port type that is not provided by scpikit.
///
/// The port should not block forever when no data is available. Instead, reads should time out
/// after a short poll interval with [`std::io::ErrorKind::TimedOut`] or
/// [`std::io::ErrorKind::WouldBlock`], such that the session timeout set via
/// [`InstrumentInterface::set_timeout`] is honored.
///
/// # Example
///
/// ```no_run
/// use std::{net::TcpStream, time::Duration};
///
/// use scpikit::{Instrument, InstrumentInterface};
///
/// let stream = TcpStream::connect("192.168.10.1:5025").unwrap();
/// stream.set_read_timeout(Some(Duration::from_millis(50))).unwrap();
/// let mut inst = Instrument::new(stream, Duration::from_secs(5));
/// println!("{}", inst.query("*IDN?").unwrap());
/// ```
pub struct Instrument<P: std::io::Read + std::io::Write> {
    port: P,
    terminator: String,
    timeout: Duration,
}

impl<P: std::io::Read + std::io::Write> Instrument<P> {
    /// Create a new instance of [`Instrument`] with a given port and response timeout.
    ///
    /// The terminator is set to `"\n"` by default.
    pub fn new(port: P, timeout: Duration) -> Self {
        Self {
            port,
            terminator: "\n".to_string(),
            timeout,
        }
    }

    /// Get a reference to the underlying port.
    pub fn get_ref(&self) -> &P {
        &self.port
    }
}

impl<P: std::io::Read + std::io::Write> InstrumentInterface for Instrument<P> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        self.port.read_exact(buf)?;
        Ok(())
    }

    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        self.timeout = timeout;
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        debug!("Flushing port before closing the session");
        self.port.flush()?;
        Ok(())
    }
}
