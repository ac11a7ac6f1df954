//! scpikit: List, open, and talk SCPI to your lab instruments from Rust
//!
//! The scpikit library is a thin helper layer over an instrument driver stack. It lets you
//! enumerate the instruments that are currently reachable, open a session to one of them, and send
//! SCPI commands and queries to it. To do so, it provides:
//!
//! - The [`InstrumentInterface`] trait, which describes an open session to a single instrument.
//! - The [`ResourceManager`] trait, which describes a driver that lists and opens resources.
//! - The [`InstrumentManager`], which wraps a resource manager and hands out [`ScpiInstrument`]s.
//! - The [`ScpiInstrument`] facade, which exposes `write`, `read`, `query`, `idn` and `close`.
//!
//! # Backends
//!
//! Two backends are available, see [`Backend`]:
//!
//! - VISA (feature `visa`): Uses the system VISA library (e.g., NI-VISA or Keysight IO libraries)
//!   via the [`visa_rs`] crate. Anything the VISA library can open can be used.
//! - Native: A pure Rust backend that needs no vendor driver. It opens
//!   `TCPIP0::<host>::<port>::SOCKET` resources over TCP/IP and, with the `serial` feature,
//!   `ASRL<port>::INSTR` resources using the [`serialport`] crate.
//!
//! # Example
//!
//! ```no_run
//! use scpikit::{Backend, InstrumentManager, DEFAULT_TIMEOUT};
//!
//! let mut manager = InstrumentManager::with_backend(Backend::default()).unwrap();
//! for resource in manager.list_resources().unwrap() {
//!     println!("{resource}");
//! }
//!
//! let mut inst = manager
//!     .open_scpi_instrument("TCPIP0::192.168.10.1::5025::SOCKET", DEFAULT_TIMEOUT)
//!     .unwrap();
//! println!("{}", inst.idn().unwrap());
//! inst.close();
//! ```
//!
//! # Goals and non-goals of this project
//!
//! scpikit does not know anything about specific instruments. It does not parse or validate SCPI
//! commands, does not decode binary block data, and does not retry failed commands. Whatever the
//! instrument answers is handed back to you as a string.
//!
//! # License
//!
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.
//!
//! # Contribution
//!
//! Unless you explicitly state otherwise, any contribution intentionally submitted
//! for inclusion in the work by you, as defined in the Apache-2.0 license, shall be
//! dual licensed as above, without any additional terms or conditions.

#![warn(missing_docs)]

use std::time::{Duration, Instant};

use log::warn;
use thiserror::Error;

mod instrument;
mod loopback;
mod manager;
mod native;
mod scpi;
#[cfg(feature = "serial")]
mod serial;
mod tcp_ip;
#[cfg(feature = "visa")]
mod visa;

pub use instrument::Instrument;
pub use loopback::{LoopbackInterfaceString, LoopbackResourceManager};
pub use manager::{Backend, DEFAULT_TIMEOUT, InstrumentManager, ResourceManager, Session};
pub use native::NativeResourceManager;
pub use scpi::ScpiInstrument;
#[cfg(feature = "serial")]
pub use serial::SerialInterface;
pub use tcp_ip::TcpIpInterface;
#[cfg(feature = "visa")]
pub use visa::{VisaResourceManager, VisaSession};

/// The error enum for everything that talks to an instrument.
///
/// Opening resources, sending commands, and reading responses all return this error type, such
/// that errors from the underlying driver propagate nicely with the `?` operator. Errors from the
/// driver are passed on as they are and are not translated.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// The requested backend was not compiled into this build.
    #[error("The {0} backend is not available. Rebuild with the `{0}` feature enabled.")]
    BackendUnavailable(&'static str),
    /// The called command is not supported by this interface.
    #[error("This command is not supported by this interface.")]
    InterfaceCommandNotSupported,
    /// Error when an invalid argument is passed to a function. This error contains only an error
    /// message, but no arguments. It is intended for the user.
    #[error("{0}")]
    InvalidArgument(String),
    /// The resource identifier cannot be opened by this backend, e.g., because its form is not
    /// supported, it is not known, or it is already in use.
    #[error("Cannot open resource '{resource}': {reason}")]
    InvalidResource {
        /// The resource identifier as given.
        resource: String,
        /// Why the resource could not be opened.
        reason: String,
    },
    /// Error when reading from/writing to an interface. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The session was already closed.
    #[error("The session to the instrument is closed.")]
    SessionClosed,
    #[cfg(feature = "serial")]
    /// Serial port errors can occur when opening a serial interface. See the [`serialport::Error`]
    /// documentation for more information.
    #[error(transparent)]
    Serialport(#[from] serialport::Error),
    /// Timeout occurred while waiting for a response from the instrument. The error contains the
    /// timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
    /// Timeout occurred while waiting for a response to a query. The error contains the query
    /// that was sent and the timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
    #[cfg(feature = "visa")]
    /// Errors reported by the VISA library, see [`visa_rs::Error`].
    #[error(transparent)]
    Visa(#[from] visa_rs::Error),
}

/// The `InstrumentInterface` trait describes an open session to a single instrument.
///
/// Implementors only have to provide [`InstrumentInterface::read_exact`] and
/// [`InstrumentInterface::write_raw`]. Everything else, i.e., sending terminated commands, reading
/// terminated responses, and querying, is provided on top of these two. Sessions that keep a
/// terminator or a timeout should override the corresponding getters and setters.
pub trait InstrumentInterface {
    /// Read exactly enough bytes from the instrument to fill the given buffer.
    ///
    /// Transports that poll should return an [`std::io::Error`] of kind
    /// [`std::io::ErrorKind::TimedOut`] or [`std::io::ErrorKind::WouldBlock`] when no data is
    /// available yet. [`InstrumentInterface::read_until_terminator`] keeps polling until its
    /// own timeout is reached.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Write all the given bytes to the instrument and flush the interface.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;

    /// Get the terminator of the interface. Defaults to `"\n"`.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Set the terminator of an interface from a `&str`.
    ///
    /// # Arguments:
    /// - `_terminator` - A string slice that will be used as the terminator for commands
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Get the timeout of the interface. Defaults to three seconds.
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Set the timeout that is used when waiting for a response from the instrument.
    fn set_timeout(&mut self, _timeout: Duration) -> Result<(), InstrumentError> {
        Err(InstrumentError::InterfaceCommandNotSupported)
    }

    /// Send a command to the instrument.
    ///
    /// This function takes the command, appends the terminator, and writes it to the instrument.
    ///
    /// # Arguments:
    /// - `cmd` - A string slice that will be sent to the instrument.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let data = format!("{cmd}{}", self.get_terminator());
        self.write_raw(data.as_bytes())
    }

    /// Read from the instrument until the terminator is received and return the response without
    /// the terminator.
    ///
    /// The response is read byte by byte and decoded once the terminator is found. If no
    /// terminator is encountered within the timeout, a [`InstrumentError::Timeout`] is returned.
    /// Bytes that are not valid UTF-8 are replaced by `U+FFFD`.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let timeout = self.get_timeout();
        let terminator = self.get_terminator().as_bytes().to_vec();
        let mut response: Vec<u8> = Vec::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        while tic.elapsed() < timeout {
            match self.read_exact(&mut single_buf) {
                Ok(()) => {}
                Err(InstrumentError::Io(err))
                    if matches!(
                        err.kind(),
                        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    continue;
                }
                Err(err) => return Err(err),
            }
            response.push(single_buf[0]);
            if let Some(stripped) = response.strip_suffix(terminator.as_slice()) {
                return Ok(match String::from_utf8(stripped.to_vec()) {
                    Ok(resp) => resp,
                    Err(err) => {
                        warn!("Received invalid UTF-8 data: {stripped:?}");
                        String::from_utf8_lossy(err.as_bytes()).into_owned()
                    }
                });
            }
        }

        Err(InstrumentError::Timeout(timeout))
    }

    /// Query the instrument with a command and return the trimmed response as a String.
    ///
    /// A timeout while waiting for the response is reported as [`InstrumentError::TimeoutQuery`].
    ///
    /// # Arguments
    /// * `cmd` - The command to send to the instrument for which we expect a response.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        match self.read_until_terminator() {
            Ok(resp) => Ok(resp.trim().to_string()),
            Err(InstrumentError::Timeout(timeout)) => Err(InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            }),
            Err(err) => Err(err),
        }
    }

    /// Release the session. The default implementation does nothing.
    fn close(&mut self) -> Result<(), InstrumentError> {
        Ok(())
    }
}

impl<T: InstrumentInterface + ?Sized> InstrumentInterface for Box<T> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        (**self).read_exact(buf)
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        (**self).write_raw(data)
    }

    fn get_terminator(&self) -> &str {
        (**self).get_terminator()
    }

    fn set_terminator(&mut self, terminator: &str) {
        (**self).set_terminator(terminator)
    }

    fn get_timeout(&self) -> Duration {
        (**self).get_timeout()
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        (**self).set_timeout(timeout)
    }

    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        (**self).sendcmd(cmd)
    }

    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        (**self).read_until_terminator()
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        (**self).query(cmd)
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        (**self).close()
    }
}
