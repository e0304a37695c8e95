//! Configuration compiled into the binary.

use radee_common::config::AcquisitionConfig;

use super::{ConfigReader, Result};

/// The wiring of the reference board: edge on P18, reset on P17, hold on P27, ADC channel 0.
#[derive(Debug)]
pub struct HardCodedConfig {  }

impl HardCodedConfig {
    pub fn new() -> HardCodedConfig {
        HardCodedConfig {  }
    }
}

impl ConfigReader for HardCodedConfig {
    fn read(&self) -> Result<AcquisitionConfig> {
        Ok(AcquisitionConfig::default())
    }
}
