//! Repeated measurements of a selected instrument, logged to a CSV file.
//!
//! Every measurement is a single query of the measurement command. What the instrument answers
//! is logged as it is, together with the index of the measurement and a timestamp. If a query
//! fails, `ERROR` is logged instead and the measurements go on.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
    thread,
    time::Duration,
};

use chrono::Local;
use csv::{Terminator, WriterBuilder};
use log::{debug, warn};
use scpikit::{DEFAULT_TIMEOUT, InstrumentManager, ResourceManager, ScpiInstrument};

use crate::{
    Console, ProcedureError,
    menu::{list_menu, report_abort, select_resource},
};

/// The measurement command used if none is configured. Adjust it to your instrument.
pub const MEASURE_COMMAND: &str = ":MEAS:VOLT?";
/// Default number of measurements.
pub const DEFAULT_REPEAT: i64 = 10;
/// Default interval between two measurements in seconds.
pub const DEFAULT_INTERVAL_SEC: f64 = 1.0;
/// Default path of the CSV file.
pub const DEFAULT_CSV_PATH: &str = "measure_log.csv";
/// Value that is logged for a failed measurement.
pub const ERROR_VALUE: &str = "ERROR";

const CSV_HEADER: [&str; 3] = ["Index", "Timestamp", "RawValue"];

/// What to measure and how long to wait for it.
#[derive(Clone, Debug)]
pub struct MeasureSettings {
    /// The SCPI query that returns one measurement.
    pub command: String,
    /// The response timeout of the session.
    pub timeout: Duration,
    /// The values that are used when the user leaves a prompt blank.
    pub defaults: MeasureConfig,
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self {
            command: MEASURE_COMMAND.to_string(),
            timeout: DEFAULT_TIMEOUT,
            defaults: MeasureConfig::default(),
        }
    }
}

/// The configuration of one measurement run, as entered by the user.
///
/// Values are taken as they are entered. A number of measurements below one gives a CSV file
/// with only the header. An interval that is negative or not finite gives no pause at all.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureConfig {
    /// Number of measurements.
    pub repeat: i64,
    /// Interval between two measurements in seconds.
    pub interval: f64,
    /// Path of the CSV file, created or truncated.
    pub path: PathBuf,
}

impl Default for MeasureConfig {
    fn default() -> Self {
        Self {
            repeat: DEFAULT_REPEAT,
            interval: DEFAULT_INTERVAL_SEC,
            path: PathBuf::from(DEFAULT_CSV_PATH),
        }
    }
}

impl MeasureConfig {
    /// Ask for the number of measurements, the interval, and the CSV path.
    ///
    /// A blank answer selects the corresponding value of `defaults`.
    pub fn prompt<R: BufRead, W: Write>(
        console: &mut Console<R, W>,
        defaults: &MeasureConfig,
    ) -> Result<Self, ProcedureError> {
        let line = console.prompt(&format!(
            "Number of measurements (default {}):",
            defaults.repeat
        ))?;
        let repeat = match line.as_str() {
            "" => defaults.repeat,
            _ => line.parse().map_err(|_| ProcedureError::InvalidConfig {
                field: "number of measurements",
                input: line.clone(),
            })?,
        };

        let line = console.prompt(&format!(
            "Interval in seconds (default {:?}):",
            defaults.interval
        ))?;
        let interval = match line.as_str() {
            "" => defaults.interval,
            _ => line.parse().map_err(|_| ProcedureError::InvalidConfig {
                field: "interval",
                input: line.clone(),
            })?,
        };

        let line = console.prompt(&format!(
            "CSV file path (default {}):",
            defaults.path.display()
        ))?;
        let path = match line.as_str() {
            "" => defaults.path.clone(),
            _ => PathBuf::from(line),
        };

        Ok(Self {
            repeat,
            interval,
            path,
        })
    }

    /// The pause between two measurements.
    fn pause(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval).unwrap_or_else(|_| {
            warn!(
                "Interval of {} s cannot be waited for, measuring without pause",
                self.interval
            );
            Duration::ZERO
        })
    }
}

/// The result of a completed measurement run.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasureSummary {
    /// The CSV file that was written.
    pub path: PathBuf,
    /// Number of data rows written.
    pub rows: usize,
    /// Number of rows that hold [`ERROR_VALUE`].
    pub errors: usize,
}

/// The current local time in ISO 8601 format with second precision, e.g., `2024-05-01T13:45:07`.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// List the resources, let the user pick one, ask for the configuration of the run, and log the
/// measurements to a CSV file.
///
/// Once the instrument is opened, it is closed again before returning, whether the run completed
/// or not. A failed measurement is printed, logged as [`ERROR_VALUE`], and does not stop the run.
/// Bad input and an empty resource list abort the procedure with a message.
pub fn measure_and_log<M, R, W>(
    manager: &mut InstrumentManager<M>,
    console: &mut Console<R, W>,
    settings: &MeasureSettings,
) -> Result<MeasureSummary, ProcedureError>
where
    M: ResourceManager,
    R: BufRead,
    W: Write,
{
    let result = run(manager, console, settings);
    report_abort(console, result)
}

fn run<M, R, W>(
    manager: &mut InstrumentManager<M>,
    console: &mut Console<R, W>,
    settings: &MeasureSettings,
) -> Result<MeasureSummary, ProcedureError>
where
    M: ResourceManager,
    R: BufRead,
    W: Write,
{
    let resources = list_menu(manager, console)?;
    let resource = select_resource(
        console,
        &resources,
        "Enter the number of the instrument to measure with (e.g. 1):",
    )?;

    let mut inst = manager.open_scpi_instrument(&resource, settings.timeout)?;
    let result = measure(&mut inst, console, settings);
    inst.close();
    result
}

fn measure<R: BufRead, W: Write>(
    inst: &mut ScpiInstrument,
    console: &mut Console<R, W>,
    settings: &MeasureSettings,
) -> Result<MeasureSummary, ProcedureError> {
    writeln!(console, "Measurement command: {}", settings.command)?;
    let config = MeasureConfig::prompt(console, &settings.defaults)?;
    debug!("Measuring with {config:?}");

    writeln!(console, "\nStarting {} measurements...", config.repeat)?;

    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_path(&config.path)?;
    writer.write_record(CSV_HEADER)?;
    writer.flush()?;

    let pause = config.pause();
    let mut summary = MeasureSummary {
        path: config.path.clone(),
        rows: 0,
        errors: 0,
    };

    for idx in 1..=config.repeat {
        let timestamp = timestamp_now();
        let value = match inst.query(&settings.command) {
            Ok(value) => value,
            Err(err) => {
                writeln!(console, "[{idx}] Measurement failed: {err}")?;
                summary.errors += 1;
                ERROR_VALUE.to_string()
            }
        };

        writer.write_record([idx.to_string(), timestamp.clone(), value.clone()])?;
        writer.flush()?;
        summary.rows += 1;
        writeln!(console, "[{idx}/{}] {timestamp} -> {value}", config.repeat)?;

        if idx < config.repeat {
            thread::sleep(pause);
        }
    }

    writeln!(
        console,
        "\nMeasurement complete. CSV file: {}",
        config.path.display()
    )?;
    Ok(summary)
}
