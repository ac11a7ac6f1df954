//! The resource menu shared by the procedures.

use std::io::{BufRead, Write};

use scpikit::{InstrumentManager, ResourceManager};

use crate::{Console, ProcedureError};

/// List the resources and print them as a numbered menu.
///
/// Fails with [`ProcedureError::NoResources`] if no resource is reachable.
pub(crate) fn list_menu<M, R, W>(
    manager: &mut InstrumentManager<M>,
    console: &mut Console<R, W>,
) -> Result<Vec<String>, ProcedureError>
where
    M: ResourceManager,
    R: BufRead,
    W: Write,
{
    let resources = manager.list_resources()?;
    if resources.is_empty() {
        return Err(ProcedureError::NoResources);
    }

    writeln!(console, "[VISA resources]")?;
    for (idx, resource) in resources.iter().enumerate() {
        writeln!(console, "{:02}: {resource}", idx + 1)?;
    }
    Ok(resources)
}

/// Ask for a 1-based number and return the selected resource.
pub(crate) fn select_resource<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    resources: &[String],
    msg: &str,
) -> Result<String, ProcedureError> {
    writeln!(console)?;
    let answer = console.prompt(msg)?;
    let selection: i64 = answer
        .parse()
        .map_err(|_| ProcedureError::InvalidSelection(answer.clone()))?;

    let resource = usize::try_from(selection)
        .ok()
        .and_then(|sel| sel.checked_sub(1))
        .and_then(|idx| resources.get(idx))
        .ok_or(ProcedureError::SelectionOutOfRange {
            selection,
            count: resources.len(),
        })?;

    writeln!(console, "Selected resource: {resource}")?;
    Ok(resource.clone())
}

/// Print the message of a user abort, pass everything on unchanged.
pub(crate) fn report_abort<T, R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    result: Result<T, ProcedureError>,
) -> Result<T, ProcedureError> {
    if let Err(err) = &result {
        if err.is_user_abort() {
            writeln!(console, "{err}")?;
        }
    }
    result
}
