//! The SCPI facade over a single open session.

use log::{debug, warn};

use crate::{InstrumentError, InstrumentInterface, Session};

/// Lifecycle of the session owned by a [`ScpiInstrument`].
#[derive(Clone, Copy, Debug, PartialEq)]
enum SessionState {
    Open,
    Closed,
}

/// A SCPI instrument wrapping one open session.
///
/// Most bench instruments (oscilloscopes, multimeters, power supplies, ...) understand SCPI. This
/// struct owns the session exclusively and provides a few straightforward methods on top of it.
/// The session is closed when [`ScpiInstrument::close`] is called or, at the latest, when the
/// instrument is dropped.
///
/// Usually you get a `ScpiInstrument` from [`crate::InstrumentManager::open_scpi_instrument`],
/// but any [`InstrumentInterface`] can be wrapped with [`ScpiInstrument::new`].
pub struct ScpiInstrument<T: InstrumentInterface = Session> {
    interface: T,
    resource: String,
    state: SessionState,
}

impl<T: InstrumentInterface> ScpiInstrument<T> {
    /// Wrap an open session.
    ///
    /// # Arguments
    /// * `interface` - The open session.
    /// * `resource` - The resource identifier the session was opened for.
    pub fn new(interface: T, resource: &str) -> Self {
        Self {
            interface,
            resource: resource.to_string(),
            state: SessionState::Open,
        }
    }

    /// The resource identifier of this instrument.
    pub fn resource_name(&self) -> &str {
        &self.resource
    }

    /// Whether the session is still open.
    pub fn is_open(&self) -> bool {
        self.state == SessionState::Open
    }

    /// Get a reference to the wrapped session.
    pub fn interface(&self) -> &T {
        &self.interface
    }

    /// Send a SCPI command for which no response is expected.
    pub fn write(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        debug!("{} <- {cmd}", self.resource);
        self.session()?.sendcmd(cmd)
    }

    /// Read one response from the instrument.
    ///
    /// Blocks until the terminator is received or the timeout elapses. The response is returned
    /// without the terminator, but otherwise as it was received.
    pub fn read(&mut self) -> Result<String, InstrumentError> {
        let resp = self.session()?.read_until_terminator()?;
        debug!("{} -> {resp:?}", self.resource);
        Ok(resp)
    }

    /// Send a SCPI query and return the response with leading and trailing whitespace removed.
    pub fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        debug!("{} <- {cmd}", self.resource);
        let resp = self.session()?.query(cmd)?;
        debug!("{} -> {resp:?}", self.resource);
        Ok(resp.trim().to_string())
    }

    /// Query the identification of the instrument with the standard `*IDN?` command.
    ///
    /// Returns what the instrument answers, usually a comma-separated string of manufacturer,
    /// model, serial number, and firmware version.
    pub fn idn(&mut self) -> Result<String, InstrumentError> {
        self.query("*IDN?")
    }

    /// Close the session.
    ///
    /// Errors while closing are not fatal and are therefore only logged. Closing an already
    /// closed instrument does nothing.
    pub fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        self.state = SessionState::Closed;
        match self.interface.close() {
            Ok(()) => debug!("Closed '{}'", self.resource),
            Err(err) => warn!("Ignoring error while closing '{}': {err}", self.resource),
        }
    }

    fn session(&mut self) -> Result<&mut T, InstrumentError> {
        match self.state {
            SessionState::Open => Ok(&mut self.interface),
            SessionState::Closed => Err(InstrumentError::SessionClosed),
        }
    }
}

impl<T: InstrumentInterface> Drop for ScpiInstrument<T> {
    fn drop(&mut self) {
        self.close();
    }
}
