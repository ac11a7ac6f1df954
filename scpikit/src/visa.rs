//! The VISA backend, using the system VISA library through the `visa-rs` crate.
//!
//! Anything the installed VISA library can open, i.e., USB, GPIB, LAN (VXI-11, HiSLIP, sockets),
//! and serial resources, can be used through this backend.

use std::{
    ffi::CString,
    io::{Read, Write},
    time::Duration,
};

use log::debug;
use visa_rs::{attribute::AttrTmoValue, enums::status::ErrorCode, prelude::*};

use crate::{DEFAULT_TIMEOUT, InstrumentError, InstrumentInterface, ResourceManager, Session};

/// Expression that matches every instrument resource.
const FIND_ALL_INSTRUMENTS: &str = "?*::INSTR";

/// A resource manager on top of the default VISA resource manager.
///
/// The default resource manager of the VISA library is opened when this struct is created and
/// closed again when it is dropped.
pub struct VisaResourceManager {
    rm: DefaultRM,
}

impl VisaResourceManager {
    /// Open the default VISA resource manager.
    pub fn new() -> Result<Self, InstrumentError> {
        Ok(Self {
            rm: DefaultRM::new()?,
        })
    }
}

impl ResourceManager for VisaResourceManager {
    fn list_resources(&mut self) -> Result<Vec<String>, InstrumentError> {
        let expr = to_res_id(FIND_ALL_INSTRUMENTS)?;
        let mut resources = Vec::new();
        let mut list = match self.rm.find_res_list(&expr) {
            Ok(list) => list,
            // VISA reports an empty search as an error, but for us this is just an empty list.
            Err(err) if err.0 == ErrorCode::ErrorRsrcNfound => return Ok(resources),
            Err(err) => return Err(err.into()),
        };
        while let Some(res) = list.find_next()? {
            resources.push(res.to_string());
        }
        Ok(resources)
    }

    fn open_resource(&mut self, resource: &str) -> Result<Session, InstrumentError> {
        let res = to_res_id(resource)?;
        let instr = self.rm.open(&res, AccessMode::NO_LOCK, DEFAULT_TIMEOUT)?;
        debug!("VISA session to '{resource}' opened");
        Ok(Box::new(VisaSession {
            instr: Some(instr),
            terminator: "\n".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }))
    }
}

fn to_res_id(resource: &str) -> Result<ResID, InstrumentError> {
    let cstr = CString::new(resource).map_err(|_| InstrumentError::InvalidResource {
        resource: resource.to_string(),
        reason: "resource identifier contains a nul byte".to_string(),
    })?;
    Ok(cstr.into())
}

/// An open VISA session.
///
/// The VISA library handles message termination for most interface types itself, but the
/// terminator is still appended to commands and awaited in responses like for any other session.
pub struct VisaSession {
    instr: Option<Instrument>,
    terminator: String,
    timeout: Duration,
}

impl VisaSession {
    fn instr(&mut self) -> Result<&mut Instrument, InstrumentError> {
        self.instr.as_mut().ok_or(InstrumentError::SessionClosed)
    }
}

impl InstrumentInterface for VisaSession {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        self.instr()?.read_exact(buf)?;
        Ok(())
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        let instr = self.instr()?;
        instr.write_all(data)?;
        instr.flush()?;
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
        let millis = u32::try_from(timeout.as_millis()).map_err(|_| {
            InstrumentError::InvalidArgument(format!("Timeout {timeout:?} is too long for VISA."))
        })?;
        let attr = AttrTmoValue::new_checked(millis).ok_or_else(|| {
            InstrumentError::InvalidArgument(format!("Timeout {timeout:?} is not valid for VISA."))
        })?;
        self.instr()?.set_attr(attr)?;
        self.timeout = timeout;
        Ok(())
    }

    fn close(&mut self) -> Result<(), InstrumentError> {
        // The VISA session is closed when the instrument is dropped.
        self.instr.take();
        Ok(())
    }
}
