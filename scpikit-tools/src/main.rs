use clap::Parser;
use log::debug;
use scpikit::InstrumentManager;
use scpikit_tools::{Console, list_resources, measure_and_log, query_idn};

mod cli;

use cli::{Args, Command};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    debug!("{args:?}");

    let mut manager = InstrumentManager::with_backend(args.backend())?;
    let mut console = Console::stdio();

    let result = match &args.command {
        Command::List => list_resources(&mut manager, &mut console).map(|_| ()),
        Command::Idn => query_idn(&mut manager, &mut console, args.timeout()).map(|_| ()),
        Command::Measure { .. } => {
            measure_and_log(&mut manager, &mut console, &args.measure_settings()).map(|_| ())
        }
    };

    match result {
        Err(err) if err.is_user_abort() => Ok(()),
        other => Ok(other?),
    }
}
