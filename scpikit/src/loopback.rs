//! The loopback module provides an instrument simulator for testing purposes.
//!
//! The [`LoopbackInterfaceString`] allows to test code that talks to instruments using strings
//! with a fixed terminator. The [`LoopbackResourceManager`] hands out such interfaces by resource
//! name, such that code built on top of an [`crate::InstrumentManager`] can be tested without any
//! hardware.

use std::{collections::VecDeque, time::Duration};

use crate::{InstrumentError, InstrumentInterface, ResourceManager, Session};

/// A self-incrementing index structure that by default starts at 0 and increments whenever `next`
/// is called.
#[derive(Debug, Default)]
struct IncrIndex {
    index: usize,
}

impl IncrIndex {
    fn next(&mut self) -> usize {
        let current = self.index;
        self.index += 1;
        current
    }
}

/// A scripted in-memory session that plays the instrument in tests.
///
/// # Example
///
/// ```
/// use scpikit::{InstrumentInterface, LoopbackInterfaceString};
///
/// let host2inst = vec!["*IDN?".to_string()];
/// let inst2host = vec!["ACME,DMM1000,1234,1.0".to_string()];
///
/// let mut lbk = LoopbackInterfaceString::new(host2inst, inst2host, "\n");
/// assert_eq!("ACME,DMM1000,1234,1.0", lbk.query("*IDN?").unwrap());
///
/// // All commands were used, so dropping the interface does not panic.
/// ```
///
/// Commands are checked in order against `from_host` and responses are played back from
/// `from_inst`. An unexpected command panics, and so do unused entries once the interface is
/// dropped, see [`LoopbackInterfaceString::finalize`].
#[derive(Debug)]
pub struct LoopbackInterfaceString {
    from_host: Vec<String>,
    from_inst: Vec<String>,
    terminator_exp: String,
    from_host_index: IncrIndex,
    from_inst_index: IncrIndex,
    curr_bytes: VecDeque<u8>,
    terminator: String,
    timeout: Duration,
    close_error: bool,
    closed: bool,
    check_on_drop: bool,
}

impl LoopbackInterfaceString {
    /// Script a session.
    ///
    /// # Arguments:
    /// * `from_host` - Commands the host is expected to send, without terminator.
    /// * `from_inst` - Responses the instrument gives, without terminator.
    /// * `terminator_exp` - Terminator appended to both when comparing and playing back.
    pub fn new(from_host: Vec<String>, from_inst: Vec<String>, terminator_exp: &str) -> Self {
        LoopbackInterfaceString {
            from_host,
            from_inst,
            terminator_exp: terminator_exp.to_string(),
            from_host_index: IncrIndex::default(),
            from_inst_index: IncrIndex::default(),
            curr_bytes: VecDeque::new(),
            terminator: "\n".to_string(),
            timeout: Duration::from_secs(3),
            close_error: false,
            closed: false,
            check_on_drop: true,
        }
    }

    /// Make [`InstrumentInterface::close`] fail, e.g., to simulate a broken transport.
    pub fn with_close_error(mut self) -> Self {
        self.close_error = true;
        self
    }

    /// Whether [`InstrumentInterface::close`] was called on this interface.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Assert that the timeout of the interface is the expected one.
    pub fn test_timeout(&self, expected_timeout: Duration) {
        assert_eq!(
            expected_timeout, self.timeout,
            "Expected timeout {expected_timeout:?}, got {:?}",
            self.timeout
        );
    }

    /// Panic if any scripted command or response was not used.
    ///
    /// Called on drop, unless the interface was never handed out by a
    /// [`LoopbackResourceManager`].
    pub fn finalize(&mut self) {
        let from_host_leftover = self.from_host.get(self.from_host_index.next());
        let from_inst_leftover = self.from_inst.get(self.from_inst_index.next());
        if let Some(fil) = from_host_leftover {
            panic!("Leftover expected commands found from host to instrument: {fil}");
        }
        if let Some(fil) = from_inst_leftover {
            panic!("Leftover expected commands found from instrument to host: {fil}");
        }
    }

    fn get_next_from_host_with_terminator(&mut self) -> String {
        let cmd = self
            .from_host
            .get(self.from_host_index.next())
            .expect("No more commands were expected from host to instrument.");
        format!("{cmd}{}", self.terminator_exp)
    }

    fn get_next_from_inst_with_terminator(&mut self) -> String {
        let cmd = self
            .from_inst
            .get(self.from_inst_index.next())
            .expect("No more commands were expected from instrument to host.");
        format!("{cmd}{}", self.terminator_exp)
    }

    /// Next byte of the scripted responses. Panics once they are used up.
    fn read_one_byte(&mut self) -> u8 {
        match self.curr_bytes.pop_front() {
            Some(byte) => byte,
            None => {
                let next_cmd = self.get_next_from_inst_with_terminator();
                self.curr_bytes = next_cmd.as_bytes().iter().copied().collect();
                self.read_one_byte()
            }
        }
    }
}

impl InstrumentInterface for LoopbackInterfaceString {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        for byte in buf.iter_mut() {
            *byte = self.read_one_byte();
        }
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

    fn write_raw(&mut self, cmd: &[u8]) -> Result<(), InstrumentError> {
        let exp = self.get_next_from_host_with_terminator();
        assert_eq!(
            exp.as_bytes(),
            cmd,
            "Expected sendcmd '{0}', got '{1:?}'",
            exp,
            str::from_utf8(cmd)
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        self.closed = true;
        if self.close_error {
            return Err(InstrumentError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "loopback transport is broken",
            )));
        }
        Ok(())
    }
}

impl Drop for LoopbackInterfaceString {
    fn drop(&mut self) {
        if self.check_on_drop && !std::thread::panicking() {
            self.finalize();
        }
    }
}

/// A resource manager that hands out [`LoopbackInterfaceString`]s by resource name.
///
/// Resources are listed in the order in which they were added. Every resource can be opened
/// once, opening it a second time fails as if the resource was locked by another session.
///
/// Only opened interfaces check their scripts when dropped. Scripts of resources that were never
/// opened are not checked, such that one manager can serve tests that open different resources.
///
/// # Example
///
/// ```
/// use scpikit::{InstrumentManager, LoopbackInterfaceString, LoopbackResourceManager, DEFAULT_TIMEOUT};
///
/// let lbk = LoopbackInterfaceString::new(
///     vec!["*IDN?".to_string()],
///     vec!["ACME,DMM1000,1234,1.0".to_string()],
///     "\n",
/// );
/// let rm = LoopbackResourceManager::default().with_resource("TCPIP0::10.0.0.2::INSTR", lbk);
/// let mut manager = InstrumentManager::from_resource_manager(rm);
///
/// let mut inst = manager
///     .open_scpi_instrument("TCPIP0::10.0.0.2::INSTR", DEFAULT_TIMEOUT)
///     .unwrap();
/// assert_eq!("ACME,DMM1000,1234,1.0", inst.idn().unwrap());
/// ```
#[derive(Debug, Default)]
pub struct LoopbackResourceManager {
    resources: Vec<(String, Option<LoopbackInterfaceString>)>,
    opened: Vec<String>,
}

impl LoopbackResourceManager {
    /// Add a resource with the interface that is handed out when it is opened.
    pub fn with_resource(mut self, name: &str, interface: LoopbackInterfaceString) -> Self {
        self.resources.push((name.to_string(), Some(interface)));
        self
    }

    /// The resources that were opened so far, in order.
    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl ResourceManager for LoopbackResourceManager {
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        Ok(self
            .resources
            .iter()
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn open_resource(&mut self, resource: &str) -> Result<Session, InstrumentError> {
        let slot = self
            .resources
            .iter_mut()
            .find(|(name, _)| name == resource)
            .ok_or_else(|| InstrumentError::InvalidResource {
                resource: resource.to_string(),
                reason: "resource not found".to_string(),
            })?;
        let interface = slot.1.take().ok_or_else(|| InstrumentError::InvalidResource {
            resource: resource.to_string(),
            reason: "resource is locked by another session".to_string(),
        })?;
        self.opened.push(resource.to_string());
        Ok(Box::new(interface))
    }
}

impl Drop for LoopbackResourceManager {
    fn drop(&mut self) {
        for interface in self.resources.iter_mut().filter_map(|(_, lbk)| lbk.as_mut()) {
            interface.check_on_drop = false;
        }
    }
}
