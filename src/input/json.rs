//! JSON acquisition configuration.
//!
//! ```json
//! {
//!     "_version": 1,
//!     "pins": { "edge": 18, "reset": 17, "hold": 27 },
//!     "adc": { "channel": 0, "codec": "standard" },
//!     "timing": {
//!         "peak_delay_us": 20,
//!         "reset_settle_delay_us": 300,
//!         "reset_hold_duration_us": 500
//!     }
//! }
//! ```
//!
//! Any section (or field) left out takes the value of the reference board.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use radee_common::codec::CodecKind;
use radee_common::config::{self, AcquisitionConfig, PinAssignment, Timing};
use serde::Deserialize;
use serde_json;
use serde_json::Value as JSONValue;

use super::{ConfigReader, Result};
use super::error::Error;

const CONFIG_VERSION: i64 = 1;

#[derive(Debug)]
pub struct JSONConfigReader {
    config_path: PathBuf,
}

impl JSONConfigReader {
    pub fn new(config_path: &Path) -> JSONConfigReader {
        JSONConfigReader {
            config_path: config_path.to_path_buf(),
        }
    }
}

impl ConfigReader for JSONConfigReader {
    fn read(&self) -> Result<AcquisitionConfig> {
        let mut text = String::new();
        let mut file = File::open(self.config_path.as_path())?;
        file.read_to_string(&mut text)?;

        parse(&text)
    }
}

/// Parse configuration text.
pub fn parse(text: &str) -> Result<AcquisitionConfig> {
    let json: JSONValue = serde_json::from_str(text)
        .map_err(|e| Error::Format(format!("JSON parsing failure: {}", e)))?;

    // Check file version.
    json["_version"].as_i64()
        .ok_or(Error::Format("Missing '_version' specifier.".to_string()))
        .and_then(|ver| if ver == CONFIG_VERSION {
            Ok(())
        } else {
            let msg = format!(
                "Configuration not compatible (provided: {}, required: {}).",
                ver,
                CONFIG_VERSION);
            Err(Error::Format(msg))
        })?;

    let file_config: FileConfig = serde_json::from_value(json)
        .map_err(|e| Error::Format(format!("configuration parsing failed: {}", e)))?;

    file_config.create_config()
}

#[derive(Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    pins: PinsSection,
    adc: AdcSection,
    timing: TimingSection,
}

impl FileConfig {
    fn create_config(&self) -> Result<AcquisitionConfig> {
        let pins = PinAssignment {
            edge: self.pins.edge,
            reset: self.pins.reset,
            hold: self.pins.hold,
        };
        let timing = Timing {
            peak_delay: Duration::from_micros(self.timing.peak_delay_us),
            reset_settle_delay: Duration::from_micros(self.timing.reset_settle_delay_us),
            reset_hold_duration: Duration::from_micros(self.timing.reset_hold_duration_us),
        };

        Ok(AcquisitionConfig::new(pins, self.adc.channel, timing, self.adc.codec)?)
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct PinsSection {
    edge: u8,
    reset: u8,
    hold: u8,
}

impl Default for PinsSection {
    fn default() -> Self {
        PinsSection {
            edge: config::DEFAULT_EDGE_PIN,
            reset: config::DEFAULT_RESET_PIN,
            hold: config::DEFAULT_HOLD_PIN,
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct AdcSection {
    channel: u8,
    codec: CodecKind,
}

impl Default for AdcSection {
    fn default() -> Self {
        AdcSection {
            channel: 0,
            codec: CodecKind::default(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
struct TimingSection {
    peak_delay_us: u64,
    reset_settle_delay_us: u64,
    reset_hold_duration_us: u64,
}

impl Default for TimingSection {
    fn default() -> Self {
        TimingSection {
            peak_delay_us: config::DEFAULT_PEAK_DELAY.as_micros() as u64,
            reset_settle_delay_us: config::DEFAULT_RESET_SETTLE_DELAY.as_micros() as u64,
            reset_hold_duration_us: config::DEFAULT_RESET_HOLD_DURATION.as_micros() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radee_common::config::ConfigurationError;

    #[test]
    fn full_config() {
        let text = r#"{
            "_version": 1,
            "pins": { "edge": 5, "reset": 6, "hold": 13 },
            "adc": { "channel": 1, "codec": "legacy" },
            "timing": { "peak_delay_us": 35, "reset_settle_delay_us": 100, "reset_hold_duration_us": 250 }
        }"#;
        let config = parse(text).unwrap();
        assert_eq!(config.edge_pin(), 5);
        assert_eq!(config.reset_pin(), 6);
        assert_eq!(config.hold_pin(), 13);
        assert_eq!(config.adc_channel(), 1);
        assert_eq!(config.codec(), CodecKind::Legacy);
        assert_eq!(config.peak_delay(), Duration::from_micros(35));
        assert_eq!(config.reset_settle_delay(), Duration::from_micros(100));
        assert_eq!(config.reset_hold_duration(), Duration::from_micros(250));
    }

    #[test]
    fn missing_sections_use_defaults() {
        let config = parse(r#"{ "_version": 1, "adc": { "channel": 1 } }"#).unwrap();
        assert_eq!(config.edge_pin(), config::DEFAULT_EDGE_PIN);
        assert_eq!(config.adc_channel(), 1);
        assert_eq!(config.codec(), CodecKind::Standard);
        assert_eq!(config.reset_hold_duration(), config::DEFAULT_RESET_HOLD_DURATION);
    }

    #[test]
    fn version_checked() {
        match parse(r#"{ "_version": 2 }"#) {
            Err(Error::Format(msg)) => assert!(msg.contains("not compatible")),
            other => panic!("unexpected result: {:?}", other),
        }
        match parse(r#"{ "pins": {} }"#) {
            Err(Error::Format(msg)) => assert!(msg.contains("_version")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn zero_reset_pulse_rejected() {
        let text = r#"{ "_version": 1, "timing": { "reset_hold_duration_us": 0 } }"#;
        match parse(text) {
            Err(Error::Config(ConfigurationError::ZeroResetHold)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn bad_values_rejected() {
        match parse(r#"{ "_version": 1, "adc": { "codec": "mcp3208" } }"#) {
            Err(Error::Format(msg)) => assert!(msg.contains("mcp3208")),
            other => panic!("unexpected result: {:?}", other),
        }
        match parse(r#"{ "_version": 1, "pins": { "edge": 300 } }"#) {
            Err(Error::Format(_)) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        match parse(r#"{ "_version": 1, "pins": { "hold": 17 } }"#) {
            Err(Error::Config(ConfigurationError::AliasedPins(17))) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
