//! The resource manager adapter: list reachable instruments and open SCPI sessions to them.

use std::time::Duration;

use log::{debug, info};

use crate::{InstrumentError, InstrumentInterface, NativeResourceManager, ScpiInstrument};

/// The default response timeout of newly opened sessions.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// An open session to an instrument as handed out by a [`ResourceManager`].
pub type Session = Box<dyn InstrumentInterface>;

/// The `ResourceManager` trait describes a driver that knows which instruments are reachable and
/// how to open a session to them.
///
/// Resource identifiers are opaque strings as defined by the driver, e.g.,
/// `"USB0::0x0957::0x1796::MY12345678::INSTR"` or `"TCPIP0::192.168.10.1::5025::SOCKET"`.
pub trait ResourceManager {
    /// List the identifiers of all currently reachable resources in the order given by the
    /// driver. No reachable resource is not an error.
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError>;

    /// Open a session to the given resource.
    fn open_resource(&mut self, resource: &str) -> Result<Session, InstrumentError>;
}

impl<T: ResourceManager + ?Sized> ResourceManager for Box<T> {
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        (**self).list_resources()
    }

    fn open_resource(&mut self, resource: &str) -> Result<Session, InstrumentError> {
        (**self).open_resource(resource)
    }
}

/// The driver stack an [`InstrumentManager`] is built on.
#[derive(Clone, Debug, PartialEq)]
pub enum Backend {
    /// The system VISA library. Requires the `visa` feature.
    Visa,
    /// The pure Rust backend that needs no vendor driver.
    ///
    /// Raw sockets cannot be discovered, so the given resources are listed in addition to the
    /// serial ports that are found.
    Native {
        /// Additional resources to list, e.g., `"TCPIP0::192.168.10.1::5025::SOCKET"`.
        resources: Vec<String>,
    },
}

impl Default for Backend {
    /// VISA if scpikit is built with the `visa` feature, otherwise the native backend.
    fn default() -> Self {
        if cfg!(feature = "visa") {
            Backend::Visa
        } else {
            Backend::Native { resources: vec![] }
        }
    }
}

/// A simple helper that wraps a [`ResourceManager`].
///
/// It lists the connectable instruments and opens [`ScpiInstrument`]s for a given resource
/// identifier. The manager owns the resource manager for its whole lifetime.
pub struct InstrumentManager<M: ResourceManager = Box<dyn ResourceManager>> {
    rm: M,
}

impl InstrumentManager {
    /// Create a manager with the default [`Backend`].
    pub fn new() -> Result<Self, InstrumentError> {
        Self::with_backend(Backend::default())
    }

    /// Create a manager on top of the given [`Backend`].
    pub fn with_backend(backend: Backend) -> Result<Self, InstrumentError> {
        info!("Using the {backend:?} backend");
        let rm: Box<dyn ResourceManager> = match backend {
            Backend::Native { resources } => Box::new(NativeResourceManager::new(resources)),
            #[cfg(feature = "visa")]
            Backend::Visa => Box::new(crate::VisaResourceManager::new()?),
            #[cfg(not(feature = "visa"))]
            Backend::Visa => return Err(InstrumentError::BackendUnavailable("visa")),
        };
        Ok(Self { rm })
    }
}

impl<M: ResourceManager> InstrumentManager<M> {
    /// Create a manager from any [`ResourceManager`].
    pub fn from_resource_manager(rm: M) -> Self {
        Self { rm }
    }

    /// Get a reference to the wrapped resource manager.
    pub fn resource_manager(&self) -> &M {
        &self.rm
    }

    /// Return the currently reachable resources in the order given by the driver.
    pub fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        let resources = self.rm.list_resources()?;
        debug!("Found {} resource(s): {resources:?}", resources.len());
        Ok(resources)
    }

    /// Open a SCPI instrument for the given resource and set its response timeout.
    ///
    /// Errors of the driver, e.g., for invalid, unreachable, or locked resources, are returned as
    /// they are.
    ///
    /// # Arguments
    /// * `resource` - The resource identifier, usually as returned by `list_resources`.
    /// * `timeout` - The response timeout, see [`DEFAULT_TIMEOUT`].
    pub fn open_scpi_instrument(
        &mut self,
        resource: &str,
        timeout: Duration,
    ) -> Result<ScpiInstrument, InstrumentError> {
        let mut session = self.rm.open_resource(resource)?;
        if let Err(err) = session.set_timeout(timeout) {
            let _ = session.close();
            return Err(err);
        }
        debug!("Opened '{resource}' with a timeout of {timeout:?}");
        Ok(ScpiInstrument::new(session, resource))
    }
}
