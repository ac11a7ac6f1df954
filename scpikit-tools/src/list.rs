//! Print the resources that are currently reachable.

use std::io::{BufRead, Write};

use scpikit::{InstrumentManager, ResourceManager};

use crate::{Console, ProcedureError, menu::list_menu};

/// Print the reachable resources as a numbered list and return them.
///
/// If no resource is reachable, a few hints on what to check are printed and
/// [`ProcedureError::NoResources`] is returned. No session is opened.
pub fn list_resources<M, R, W>(
    manager: &mut InstrumentManager<M>,
    console: &mut Console<R, W>,
) -> Result<Vec<String>, ProcedureError>
where
    M: ResourceManager,
    R: BufRead,
    W: Write,
{
    match list_menu(manager, console) {
        Err(ProcedureError::NoResources) => {
            writeln!(console, "{}", ProcedureError::NoResources)?;
            writeln!(
                console,
                "- Check the VISA installation, or use the native backend (--backend native)."
            )?;
            writeln!(console, "- Check the USB/GPIB/LAN cables and that the instrument is on.")?;
            Err(ProcedureError::NoResources)
        }
        other => other,
    }
}
