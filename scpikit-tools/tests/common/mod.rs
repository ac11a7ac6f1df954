//! Test doubles shared by the procedure tests.

#![allow(dead_code)]

use std::{cell::Cell, collections::VecDeque, rc::Rc, time::Duration};

use scpikit::{
    InstrumentError, InstrumentInterface, InstrumentManager, LoopbackInterfaceString,
    LoopbackResourceManager, ResourceManager, Session,
};

/// A session that answers queries from a script. `None` in the script is a query that times out.
pub struct FlakySession {
    responses: VecDeque<Option<String>>,
    timeout: Duration,
    closed: Rc<Cell<bool>>,
}

impl FlakySession {
    /// Create a session and a flag that tells whether it was closed.
    pub fn new(responses: Vec<Option<&str>>) -> (Self, Rc<Cell<bool>>) {
        let closed = Rc::new(Cell::new(false));
        let session = Self {
            responses: responses
                .into_iter()
                .map(|resp| resp.map(|s| s.to_string()))
                .collect(),
            timeout: Duration::from_secs(3),
            closed: closed.clone(),
        };
        (session, closed)
    }
}

impl InstrumentInterface for FlakySession {
    fn read_exact(&mut self, _buf: &mut [u8]) -> Result<(), InstrumentError> {
        panic!("Responses are only scripted for queries.")
    }

    fn write_raw(&mut self, _data: &[u8]) -> Result<(), InstrumentError> {
        Ok(())
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), InstrumentError> {
        self.timeout = timeout;
        Ok(())
    }

    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        match self.responses.pop_front() {
            Some(Some(resp)) => Ok(resp),
            Some(None) => Err(InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout: self.timeout,
            }),
            None => panic!("No more responses scripted, got query '{cmd}'."),
        }
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        self.closed.set(true);
        Ok(())
    }
}

/// A resource manager that lists the given resources and opens one [`FlakySession`] for any of
/// them.
pub struct FlakyManager {
    resources: Vec<String>,
    session: Option<FlakySession>,
}

impl FlakyManager {
    pub fn new(resources: &[&str], session: FlakySession) -> Self {
        Self {
            resources: resources.iter().map(|s| s.to_string()).collect(),
            session: Some(session),
        }
    }
}

impl ResourceManager for FlakyManager {
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        Ok(self.resources.clone())
    }

    fn open_resource(&mut self, resource: &str) -> Result<Session, InstrumentError> {
        assert!(self.resources.iter().any(|r| r == resource));
        let session = self
            .session
            .take()
            .expect("The session was already opened.");
        Ok(Box::new(session))
    }
}

/// A manager on top of a [`FlakyManager`] with two resources and the given responses.
pub fn flaky_manager(
    responses: Vec<Option<&str>>,
) -> (InstrumentManager<FlakyManager>, Rc<Cell<bool>>) {
    let (session, closed) = FlakySession::new(responses);
    let rm = FlakyManager::new(&["GPIB0::12::INSTR", "ASRL1::INSTR"], session);
    (InstrumentManager::from_resource_manager(rm), closed)
}

/// A manager with two loopback resources that expect no commands.
pub fn idle_manager() -> InstrumentManager<LoopbackResourceManager> {
    let rm = LoopbackResourceManager::default()
        .with_resource(
            "USB0::0x0957::0x1796::MY1234::INSTR",
            LoopbackInterfaceString::new(vec![], vec![], "\n"),
        )
        .with_resource(
            "GPIB0::12::INSTR",
            LoopbackInterfaceString::new(vec![], vec![], "\n"),
        );
    InstrumentManager::from_resource_manager(rm)
}

/// The console output as a string.
pub fn output(out: Vec<u8>) -> String {
    String::from_utf8(out).unwrap()
}
