//! Runtime configuration
//!
//! Defaults, overridden by a `.env` file, overridden by the process
//! environment, overridden by flags. Loading `.env` never replaces a variable
//! that is already set, so the real environment wins over the file.
//!
//! | Setting        | Env           | Flag       | Default          |
//! |----------------|---------------|------------|------------------|
//! | device path    | `DEVICE_PATH` | `--port`   | (none)           |
//! | listen address | `LISTEN_ADDR` | `--listen` | `127.0.0.1:8000` |
//! | baud rate      | `BAUD_RATE`   | `--baud`   | `9600`           |

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::adapters::serial_driver::DEFAULT_BAUD_RATE;

/// Default address for the query service
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8000";

/// Error type for configuration parsing
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Flag given without its value
    #[error("{0} requires a value")]
    MissingValue(String),
    /// Value failed to parse
    #[error("invalid {name} {value:?}")]
    InvalidValue { name: &'static str, value: String },
    /// Unrecognized command-line argument
    #[error("unknown argument {0:?}")]
    UnknownArgument(String),
}

/// What happened when looking for a `.env` file
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DotenvStatus {
    /// Variables were loaded from this file
    Loaded(PathBuf),
    /// No file was found
    Missing,
    /// A file was found but could not be read or parsed
    Invalid(String),
}

/// Load `.env` from the working directory or one of its parents
///
/// Call before `Command::from_env` so file values reach the environment
/// lookup.
pub fn load_dotenv() -> DotenvStatus {
    classify(dotenvy::dotenv())
}

/// Load a specific env file
pub fn load_dotenv_from(path: &Path) -> DotenvStatus {
    classify(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn classify(result: Result<PathBuf, dotenvy::Error>) -> DotenvStatus {
    match result {
        Ok(path) => DotenvStatus::Loaded(path),
        Err(e) if e.not_found() => DotenvStatus::Missing,
        Err(e) => DotenvStatus::Invalid(e.to_string()),
    }
}

/// Settings for a monitoring run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Serial device; empty means the driver will never stream
    pub device_path: String,
    /// Where the query service binds
    pub listen_addr: SocketAddr,
    /// Serial line speed
    pub baud_rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// What the binary was asked to do
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Ingest and serve
    Run(Config),
    /// Print serial ports and exit
    ListPorts,
    /// Print usage and exit
    Help,
}

impl Command {
    /// Parse from the process environment and arguments
    pub fn from_env() -> Result<Self, ConfigError> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        Self::parse(|key| std::env::var(key).ok(), &args)
    }

    /// Parse from an environment lookup and arguments (program name excluded)
    pub fn parse<E>(env: E, args: &[String]) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = env("DEVICE_PATH") {
            config.device_path = path;
        }
        if let Some(addr) = env("LISTEN_ADDR") {
            config.listen_addr = parse_value("LISTEN_ADDR", &addr)?;
        }
        if let Some(baud) = env("BAUD_RATE") {
            config.baud_rate = parse_value("BAUD_RATE", &baud)?;
        }

        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--list-ports" => return Ok(Command::ListPorts),
                "--help" | "-h" => return Ok(Command::Help),
                "--port" | "-p" => {
                    config.device_path = next_value(arg, &mut args)?.to_string();
                }
                "--listen" | "-l" => {
                    config.listen_addr = parse_value("listen address", next_value(arg, &mut args)?)?;
                }
                "--baud" | "-b" => {
                    config.baud_rate = parse_value("baud rate", next_value(arg, &mut args)?)?;
                }
                other => return Err(ConfigError::UnknownArgument(other.to_string())),
            }
        }

        Ok(Command::Run(config))
    }
}

fn next_value<'a>(
    flag: &str,
    args: &mut impl Iterator<Item = &'a String>,
) -> Result<&'a str, ConfigError> {
    args.next()
        .map(String::as_str)
        .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
