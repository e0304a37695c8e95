//! The value produced by one acquisition cycle.

use std::fmt;
use std::fmt::Display;

use crate::clock::Timestamp;

/// One detected event: when the hold was asserted and what the ADC read.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Sample {
    timestamp: Timestamp,
    voltage_code: u16,
}

impl Sample {
    /// Create a new Sample.
    pub fn new(timestamp: Timestamp, voltage_code: u16) -> Sample {
        Sample {
            timestamp,
            voltage_code,
        }
    }

    /// Returns the time the hold signal was asserted.
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    /// Returns the raw 10-bit ADC code (0 to 1023). No unit conversion is applied.
    pub fn voltage_code(&self) -> u16 {
        self.voltage_code
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.timestamp, self.voltage_code)
    }
}
