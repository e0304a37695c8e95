//! Configuration input-related errors.

use std::convert::From;
use std::error;
use std::fmt;
use std::fmt::Display;

use radee_common::config::ConfigurationError;

/// Errors from creating an acquisition configuration from provided input.
#[derive(Debug)]
pub enum Error {
    /// Input is well-formed but describes an invalid configuration.
    Config(ConfigurationError),
    /// Input format error with provided input.
    Format(String),
    /// I/O error.
    IO(std::io::Error),
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        use Error::*;
        match self {
            Config(ref e) => Some(e),
            IO(ref e) => Some(e),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Error::*;
        match self {
            Config(ref e) => write!(f, "invalid configuration: {}", e),
            Format(ref msg) => write!(f, "input format error: {}", msg),
            IO(ref e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl From<ConfigurationError> for Error {
    fn from(e: ConfigurationError) -> Self {
        Error::Config(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::IO(e)
    }
}
