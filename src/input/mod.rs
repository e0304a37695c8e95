//! Pluggable acquisition configuration providers.

use std::fmt::Debug;

use radee_common::config::AcquisitionConfig;

pub mod error;
pub mod hard_code;
pub mod json;

type Result<T> = std::result::Result<T, error::Error>;

/// Configuration reader producing a validated acquisition configuration from an input source.
pub trait ConfigReader: Debug {
    /// Create the configuration.
    fn read(&self) -> Result<AcquisitionConfig>;
}
