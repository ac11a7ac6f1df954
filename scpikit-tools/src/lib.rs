//! scpikit-tools: Interactive procedures on top of scpikit
//!
//! This crate provides three small procedures that talk to you via a [`Console`] and to your
//! instruments via an [`scpikit::InstrumentManager`]:
//!
//! - [`list_resources`]: Print the instruments that are currently reachable.
//! - [`query_idn`]: Let you pick an instrument and print its `*IDN?` response.
//! - [`measure_and_log`]: Let you pick an instrument, then query a measurement command a given
//!   number of times with a fixed interval and log the results to a CSV file.
//!
//! The procedures are generic over the console input and output as well as over the resource
//! manager, such that they can be tested with a [`scpikit::LoopbackResourceManager`]. The
//! `scpikit` binary in this crate runs them on the terminal.
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.

#![warn(missing_docs)]

use scpikit::InstrumentError;
use thiserror::Error;

mod console;
mod idn;
mod list;
mod measure;
mod menu;

pub use console::Console;
pub use idn::query_idn;
pub use list::list_resources;
pub use measure::{
    DEFAULT_CSV_PATH, DEFAULT_INTERVAL_SEC, DEFAULT_REPEAT, ERROR_VALUE, MEASURE_COMMAND,
    MeasureConfig, MeasureSettings, MeasureSummary, measure_and_log, timestamp_now,
};

/// The error enum for all procedures.
///
/// The first four variants are user aborts: The procedure printed a message for the user and
/// stopped without doing anything harmful. See [`ProcedureError::is_user_abort`]. All other
/// variants are failures of the instrument, the console, or the CSV file.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcedureError {
    /// No instrument is reachable.
    #[error("No VISA instruments are connected.")]
    NoResources,
    /// The selection is not a number.
    #[error("Invalid input: '{0}'")]
    InvalidSelection(String),
    /// The selection is a number, but no instrument has it.
    #[error("Selection {selection} is out of range. Valid are 1 to {count}.")]
    SelectionOutOfRange {
        /// The number that was entered.
        selection: i64,
        /// The number of instruments to choose from.
        count: usize,
    },
    /// A configuration value could not be parsed.
    #[error("Invalid {field}: '{input}'")]
    InvalidConfig {
        /// The name of the value, e.g., `"number of measurements"`.
        field: &'static str,
        /// What was entered.
        input: String,
    },
    /// Error when talking to the instrument. See [`InstrumentError`] for more details.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
    /// Error when reading from/writing to the console.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Error when writing the CSV file.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl ProcedureError {
    /// Whether this error is a user abort, i.e., bad input or no instrument to talk to.
    pub fn is_user_abort(&self) -> bool {
        matches!(
            self,
            ProcedureError::NoResources
                | ProcedureError::InvalidSelection(_)
                | ProcedureError::SelectionOutOfRange { .. }
                | ProcedureError::InvalidConfig { .. }
        )
    }
}
