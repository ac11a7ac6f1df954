//! The native backend: a pure Rust resource manager that needs no vendor driver.
//!
//! Supported resource identifiers are raw sockets, `TCPIP[board]::<host>::<port>::SOCKET`, and,
//! with the `serial` feature, serial ports, `ASRL<port>::INSTR`. The port of a serial resource is
//! either a device name, e.g., `ASRL/dev/ttyUSB0::INSTR`, or a number, e.g., `ASRL3::INSTR`, which
//! refers to `COM3` on Windows and to `/dev/ttyS2` elsewhere.

use log::debug;

use crate::{DEFAULT_TIMEOUT, InstrumentError, ResourceManager, Session, TcpIpInterface};

/// Baud rate that serial resources are opened with.
#[cfg(feature = "serial")]
const SERIAL_BAUD: u32 = 9600;

/// A resource identifier split up into what is needed to connect to it.
#[derive(Debug, PartialEq)]
enum NativeResource {
    Socket { host: String, port: u16 },
    Serial { port: String },
}

impl NativeResource {
    fn parse(resource: &str) -> Result<Self, InstrumentError> {
        let invalid = |reason: &str| InstrumentError::InvalidResource {
            resource: resource.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = resource.split("::").collect();
        let interface = parts[0].to_ascii_uppercase();

        if let Some(board) = interface.strip_prefix("TCPIP") {
            if !board.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid("invalid TCPIP board number"));
            }
            match parts.as_slice() {
                [_, host, port, class] if class.eq_ignore_ascii_case("SOCKET") => {
                    let port = port
                        .parse::<u16>()
                        .map_err(|_| invalid("invalid port number"))?;
                    Ok(NativeResource::Socket {
                        host: host.to_string(),
                        port,
                    })
                }
                _ => Err(invalid(
                    "only raw SOCKET resources are supported by the native backend",
                )),
            }
        } else if interface.starts_with("ASRL") {
            match parts.as_slice() {
                [asrl, class] if class.eq_ignore_ascii_case("INSTR") && asrl.len() > 4 => {
                    let port = serial_port_name(&asrl[4..])
                        .ok_or_else(|| invalid("invalid serial port number"))?;
                    Ok(NativeResource::Serial { port })
                }
                _ => Err(invalid("expected a resource of the form ASRL<port>::INSTR")),
            }
        } else {
            Err(invalid("interface type is not supported by the native backend"))
        }
    }
}

/// Translate the port part of an `ASRL` resource into the name of a serial port.
fn serial_port_name(port: &str) -> Option<String> {
    if !port.chars().all(|c| c.is_ascii_digit()) {
        return Some(port.to_string());
    }
    let number: u32 = port.parse().ok()?;
    if cfg!(windows) {
        Some(format!("COM{number}"))
    } else {
        number.checked_sub(1).map(|n| format!("/dev/ttyS{n}"))
    }
}

/// A resource manager that talks to instruments directly via TCP/IP sockets and serial ports.
///
/// Raw sockets cannot be discovered on the network. Therefore, the resources that this manager
/// lists are the serial ports found on the system (with the `serial` feature) followed by the
/// resources that were given when creating the manager.
#[derive(Debug, Default)]
pub struct NativeResourceManager {
    resources: Vec<String>,
}

impl NativeResourceManager {
    /// Create a new native resource manager.
    ///
    /// # Arguments
    /// * `resources` - Resources to list in addition to the discovered serial ports.
    pub fn new(resources: Vec<String>) -> Self {
        Self { resources }
    }
}

impl ResourceManager for NativeResourceManager {
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        #[cfg_attr(not(feature = "serial"), allow(unused_mut))]
        let mut resources: Vec<String> = Vec::new();

        #[cfg(feature = "serial")]
        resources.extend(
            serialport::available_ports()?
                .into_iter()
                .map(|p| format!("ASRL{}::INSTR", p.port_name)),
        );

        resources.extend(self.resources.iter().cloned());
        Ok(resources)
    }

    fn open_resource(&mut self, resource: &str) -> Result<Session, InstrumentError> {
        match NativeResource::parse(resource)? {
            NativeResource::Socket { host, port } => {
                debug!("Opening socket {host}:{port}");
                let inst = TcpIpInterface::try_new((host.as_str(), port), DEFAULT_TIMEOUT)?;
                Ok(Box::new(inst))
            }
            #[cfg(feature = "serial")]
            NativeResource::Serial { port } => {
                debug!("Opening serial port {port}");
                let inst = crate::SerialInterface::simple(&port, SERIAL_BAUD, DEFAULT_TIMEOUT)?;
                Ok(Box::new(inst))
            }
            #[cfg(not(feature = "serial"))]
            NativeResource::Serial { .. } => Err(InstrumentError::BackendUnavailable("serial")),
        }
    }
}
