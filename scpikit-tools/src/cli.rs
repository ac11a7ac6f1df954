use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use log::warn;
use scpikit::Backend;
use scpikit_tools::{DEFAULT_CSV_PATH, MEASURE_COMMAND, MeasureConfig, MeasureSettings};

/// List bench instruments, query their identity, and log measurements to CSV.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The driver stack to use. Defaults to VISA if built with the `visa` feature.
    #[arg(long, value_enum, env = "SCPIKIT_BACKEND")]
    backend: Option<BackendKind>,

    /// Additional resources for the native backend, e.g., `TCPIP0::192.168.10.1::5025::SOCKET`.
    #[arg(long = "resource", value_delimiter = ',', env = "SCPIKIT_RESOURCES")]
    resources: Vec<String>,

    /// Response timeout in milliseconds.
    #[arg(long, default_value_t = 5000, env = "SCPIKIT_TIMEOUT_MS")]
    timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List the reachable instruments.
    List,
    /// Select an instrument and print its `*IDN?` response.
    Idn,
    /// Select an instrument and log repeated measurements to a CSV file.
    Measure {
        /// The SCPI query that returns one measurement.
        #[arg(long, default_value = MEASURE_COMMAND, env = "SCPIKIT_MEASURE_COMMAND")]
        command: String,

        /// The CSV path that is used when the path prompt is left blank.
        #[arg(long, default_value = DEFAULT_CSV_PATH)]
        default_path: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum BackendKind {
    Visa,
    Native,
}

impl Args {
    /// The backend to build the instrument manager on.
    pub fn backend(&self) -> Backend {
        let backend = match self.backend {
            Some(BackendKind::Visa) => Backend::Visa,
            Some(BackendKind::Native) => Backend::Native {
                resources: vec![],
            },
            None => Backend::default(),
        };
        match backend {
            Backend::Native { .. } => Backend::Native {
                resources: self.resources.clone(),
            },
            Backend::Visa => {
                if !self.resources.is_empty() {
                    warn!("Ignoring --resource with the VISA backend");
                }
                Backend::Visa
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Settings for the `measure` subcommand. Other subcommands get the defaults.
    pub fn measure_settings(&self) -> MeasureSettings {
        let mut settings = MeasureSettings {
            timeout: self.timeout(),
            ..MeasureSettings::default()
        };
        if let Command::Measure {
            command,
            default_path,
        } = &self.command
        {
            settings.command = command.clone();
            settings.defaults = MeasureConfig {
                path: default_path.clone(),
                ..MeasureConfig::default()
            };
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("scpikit").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn subcommands() {
        assert_eq!(parse(&["list"]).command, Command::List);
        assert_eq!(parse(&["idn"]).command, Command::Idn);
        assert!(Args::try_parse_from(["scpikit"]).is_err());
        assert!(Args::try_parse_from(["scpikit", "scan"]).is_err());
    }

    #[test]
    fn native_resources() {
        let args = parse(&[
            "--backend",
            "native",
            "--resource",
            "TCPIP0::10.0.0.2::5025::SOCKET,ASRL1::INSTR",
            "--resource",
            "TCPIP0::10.0.0.3::5025::SOCKET",
            "list",
        ]);
        assert_eq!(
            args.backend(),
            Backend::Native {
                resources: vec![
                    "TCPIP0::10.0.0.2::5025::SOCKET".to_string(),
                    "ASRL1::INSTR".to_string(),
                    "TCPIP0::10.0.0.3::5025::SOCKET".to_string(),
                ]
            }
        );
    }

    #[test]
    fn visa_backend() {
        assert_eq!(parse(&["--backend", "visa", "idn"]).backend(), Backend::Visa);
        assert!(Args::try_parse_from(["scpikit", "--backend", "gpib", "idn"]).is_err());
    }

    #[test]
    fn timeout() {
        assert_eq!(parse(&["idn"]).timeout(), Duration::from_millis(5000));
        assert_eq!(
            parse(&["--timeout-ms", "250", "idn"]).timeout(),
            Duration::from_millis(250)
        );
    }

    #[test]
    fn measure_settings() {
        let settings = parse(&["measure"]).measure_settings();
        assert_eq!(settings.command, ":MEAS:VOLT?");
        assert_eq!(settings.defaults, MeasureConfig::default());

        let settings = parse(&[
            "--timeout-ms",
            "1000",
            "measure",
            "--command",
            "MEAS:CURR:DC?",
            "--default-path",
            "bench.csv",
        ])
        .measure_settings();
        assert_eq!(settings.command, "MEAS:CURR:DC?");
        assert_eq!(settings.timeout, Duration::from_millis(1000));
        assert_eq!(settings.defaults.path, PathBuf::from("bench.csv"));
        assert_eq!(settings.defaults.repeat, 10);
    }
}
