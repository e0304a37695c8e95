/*! Acquisition configuration.

An [`AcquisitionConfig`] is validated once when it is created and never changes afterwards.
Anything a sequencer could trip over at run time (a channel the ADC does not have,
a reset pulse too short to be seen, two roles wired to the same line) is rejected here,
before any hardware is touched.
 */

use std::error;
use std::fmt;
use std::fmt::Display;
use std::time::Duration;

use crate::codec::{self, CodecKind};

/// BCM number of the line signalling an incoming pulse.
pub const DEFAULT_EDGE_PIN: u8 = 18;
/// BCM number of the sensor reset line.
pub const DEFAULT_RESET_PIN: u8 = 17;
/// BCM number of the sample-and-hold line.
pub const DEFAULT_HOLD_PIN: u8 = 27;

/// Time for a shaped pulse to reach its peak.
pub const DEFAULT_PEAK_DELAY: Duration = Duration::from_micros(20);
/// Pause between releasing the hold and asserting reset.
pub const DEFAULT_RESET_SETTLE_DELAY: Duration = Duration::from_micros(300);
/// Time the reset line must stay asserted for the sensor to notice it.
pub const DEFAULT_RESET_HOLD_DURATION: Duration = Duration::from_micros(500);

/// Invalid acquisition configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigurationError {
    /// The ADC has no such channel.
    InvalidChannel(u8),
    /// The reset pulse has zero width.
    ZeroResetHold,
    /// The same pin was given more than one role.
    AliasedPins(u8),
}

impl error::Error for ConfigurationError {  }

impl Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ConfigurationError::*;
        match self {
            InvalidChannel(ch) => write!(f, "ADC channel {} is not 0 or 1", ch),
            ZeroResetHold => write!(f, "reset hold duration must be longer than zero"),
            AliasedPins(pin) => write!(f, "pin {} is assigned to more than one role", pin),
        }
    }
}

/// Which BCM pin plays which role.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PinAssignment {
    /// Input watched for rising edges.
    pub edge: u8,
    /// Output pulsed to reset the sensor.
    pub reset: u8,
    /// Output holding the analog voltage during conversion.
    pub hold: u8,
}

impl Default for PinAssignment {
    fn default() -> Self {
        PinAssignment {
            edge: DEFAULT_EDGE_PIN,
            reset: DEFAULT_RESET_PIN,
            hold: DEFAULT_HOLD_PIN,
        }
    }
}

/// Delays making up one acquisition cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Timing {
    /// Edge detection to hold assertion.
    pub peak_delay: Duration,
    /// Hold release to reset assertion.
    pub reset_settle_delay: Duration,
    /// Width of the reset pulse.
    pub reset_hold_duration: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            peak_delay: DEFAULT_PEAK_DELAY,
            reset_settle_delay: DEFAULT_RESET_SETTLE_DELAY,
            reset_hold_duration: DEFAULT_RESET_HOLD_DURATION,
        }
    }
}

/// Validated, immutable configuration for one detector channel.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AcquisitionConfig {
    pins: PinAssignment,
    adc_channel: u8,
    timing: Timing,
    codec: CodecKind,
}

impl AcquisitionConfig {
    /** Create a new, validated configuration.

    # Errors
    - `ConfigurationError::AliasedPins` if two roles share a pin.
    - `ConfigurationError::InvalidChannel` if `adc_channel` is not 0 or 1.
    - `ConfigurationError::ZeroResetHold` if the reset pulse has no width.

    # Examples
    ```
    use radee_common::codec::CodecKind;
    use radee_common::config::{AcquisitionConfig, PinAssignment, Timing};

    let config = AcquisitionConfig::new(
        PinAssignment::default(), 0, Timing::default(), CodecKind::Standard).unwrap();
    assert_eq!(config.edge_pin(), 18);
    ```
     */
    pub fn new(pins: PinAssignment,
               adc_channel: u8,
               timing: Timing,
               codec: CodecKind) -> Result<AcquisitionConfig, ConfigurationError>
    {
        if pins.edge == pins.reset || pins.edge == pins.hold {
            return Err(ConfigurationError::AliasedPins(pins.edge));
        }
        if pins.reset == pins.hold {
            return Err(ConfigurationError::AliasedPins(pins.reset));
        }

        codec::encode_command(adc_channel)
            .map_err(|_e| ConfigurationError::InvalidChannel(adc_channel))?;

        if timing.reset_hold_duration == Duration::from_secs(0) {
            return Err(ConfigurationError::ZeroResetHold);
        }

        Ok(AcquisitionConfig {
            pins,
            adc_channel,
            timing,
            codec,
        })
    }

    /// Returns the edge input pin.
    pub fn edge_pin(&self) -> u8 {
        self.pins.edge
    }

    /// Returns the reset output pin.
    pub fn reset_pin(&self) -> u8 {
        self.pins.reset
    }

    /// Returns the hold output pin.
    pub fn hold_pin(&self) -> u8 {
        self.pins.hold
    }

    /// Returns the pin assignment.
    pub fn pins(&self) -> &PinAssignment {
        &self.pins
    }

    /// Returns the selected ADC channel.
    pub fn adc_channel(&self) -> u8 {
        self.adc_channel
    }

    /// Returns the delay between edge and hold.
    pub fn peak_delay(&self) -> Duration {
        self.timing.peak_delay
    }

    /// Returns the delay between hold release and reset.
    pub fn reset_settle_delay(&self) -> Duration {
        self.timing.reset_settle_delay
    }

    /// Returns the width of the reset pulse.
    pub fn reset_hold_duration(&self) -> Duration {
        self.timing.reset_hold_duration
    }

    /// Returns the selected codec.
    pub fn codec(&self) -> CodecKind {
        self.codec
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        AcquisitionConfig {
            pins: PinAssignment::default(),
            adc_channel: 0,
            timing: Timing::default(),
            codec: CodecKind::default(),
        }
    }
}

impl Display for AcquisitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Acquisition:\n")?;
        write!(f, "  edge   P{:02} ->\n", self.pins.edge)?;
        write!(f, "  hold   P{:02} <-\n", self.pins.hold)?;
        write!(f, "  reset  P{:02} <-\n", self.pins.reset)?;
        write!(f, "  ADC channel {} ({} codec)\n", self.adc_channel, self.codec)?;
        write!(f, "  peak delay {:?}, settle {:?}, reset pulse {:?}\n",
               self.timing.peak_delay,
               self.timing.reset_settle_delay,
               self.timing.reset_hold_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing_us(peak: u64, settle: u64, hold: u64) -> Timing {
        Timing {
            peak_delay: Duration::from_micros(peak),
            reset_settle_delay: Duration::from_micros(settle),
            reset_hold_duration: Duration::from_micros(hold),
        }
    }

    #[test]
    fn accept_defaults() {
        let config = AcquisitionConfig::new(
            PinAssignment::default(), 0, Timing::default(), CodecKind::Standard).unwrap();
        assert_eq!(config, AcquisitionConfig::default());
        assert_eq!(config.reset_hold_duration(), Duration::from_micros(500));
    }

    #[test]
    fn reject_zero_reset_hold() {
        let r = AcquisitionConfig::new(
            PinAssignment::default(), 0, timing_us(20, 300, 0), CodecKind::Standard);
        assert_eq!(r, Err(ConfigurationError::ZeroResetHold));
    }

    #[test]
    fn zero_peak_delay_allowed() {
        let r = AcquisitionConfig::new(
            PinAssignment::default(), 1, timing_us(0, 0, 1), CodecKind::Legacy);
        assert!(r.is_ok());
    }

    #[test]
    fn reject_invalid_channel() {
        let r = AcquisitionConfig::new(
            PinAssignment::default(), 2, Timing::default(), CodecKind::Standard);
        assert_eq!(r, Err(ConfigurationError::InvalidChannel(2)));
    }

    #[test]
    fn reject_aliased_pins() {
        let pins = PinAssignment { edge: 18, reset: 17, hold: 17 };
        let r = AcquisitionConfig::new(pins, 0, Timing::default(), CodecKind::Standard);
        assert_eq!(r, Err(ConfigurationError::AliasedPins(17)));

        let pins = PinAssignment { edge: 27, reset: 17, hold: 27 };
        let r = AcquisitionConfig::new(pins, 0, Timing::default(), CodecKind::Standard);
        assert_eq!(r, Err(ConfigurationError::AliasedPins(27)));
    }
}
