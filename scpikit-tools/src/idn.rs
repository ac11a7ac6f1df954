//! Query the identification of a selected instrument.

use std::{
    io::{BufRead, Write},
    time::Duration,
};

use scpikit::{InstrumentManager, ResourceManager};

use crate::{
    Console, ProcedureError,
    menu::{list_menu, report_abort, select_resource},
};

/// List the resources, let the user pick one, and print its `*IDN?` response.
///
/// The session is closed again before returning, also if the query fails. Bad input and an empty
/// resource list abort the procedure with a message, before any session is opened.
///
/// # Arguments
/// * `manager` - The manager to list and open resources with.
/// * `console` - The console to talk to the user.
/// * `timeout` - The response timeout of the session.
pub fn query_idn<M, R, W>(
    manager: &mut InstrumentManager<M>,
    console: &mut Console<R, W>,
    timeout: Duration,
) -> Result<String, ProcedureError>
where
    M: ResourceManager,
    R: BufRead,
    W: Write,
{
    let result = run(manager, console, timeout);
    report_abort(console, result)
}

fn run<M, R, W>(
    manager: &mut InstrumentManager<M>,
    console: &mut Console<R, W>,
    timeout: Duration,
) -> Result<String, ProcedureError>
where
    M: ResourceManager,
    R: BufRead,
    W: Write,
{
    let resources = list_menu(manager, console)?;
    let resource = select_resource(
        console,
        &resources,
        "Enter the number of the instrument to use (e.g. 1):",
    )?;

    let mut inst = manager.open_scpi_instrument(&resource, timeout)?;
    let idn = inst.idn();
    inst.close();
    let idn = idn?;

    writeln!(console, "\n[*IDN? response]")?;
    writeln!(console, "{idn}")?;
    Ok(idn)
}
