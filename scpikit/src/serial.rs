//! This module provides the implementation for an instrument controlled via a serial port.
//!
//! It builds an [`Instrument`] session on top of a port opened with the `serialport` crate.

use std::time::Duration;

use serialport::{SerialPort, SerialPortBuilder};

use crate::{Instrument, InstrumentError};

/// Poll interval of the serial port, see [`crate::TcpIpInterface`] for the reasoning.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A blocking serial port interface using the `serialport` crate.
#[derive(Debug)]
pub struct SerialInterface {}

impl SerialInterface {
    /// Try to open a serial port with the given baud rate and otherwise default settings (8N1).
    ///
    /// # Arguments
    /// * `port` - The name of the serial port, e.g., `"/dev/ttyUSB0"` or `"COM3"`.
    /// * `baud` - The baud rate.
    /// * `timeout` - The response timeout of the session.
    pub fn simple(
        port: &str,
        baud: u32,
        timeout: Duration,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        Self::full(serialport::new(port, baud), timeout)
    }

    /// Try to open a serial port from a fully configured [`SerialPortBuilder`].
    ///
    /// The read timeout of the builder is replaced by a short poll interval. The response timeout
    /// of the session is given by `timeout`.
    pub fn full(
        spb: SerialPortBuilder,
        timeout: Duration,
    ) -> Result<Instrument<Box<dyn SerialPort>>, InstrumentError> {
        let port = spb.timeout(POLL_INTERVAL).open()?;
        Ok(Instrument::new(port, timeout))
    }
}
