/*! MCP3002 command encoding and response decoding.

The MCP3002 clocks out a 10-bit conversion across two 8-bit transfer words.
Two wire protocols are supported:

- [`StandardCodec`]: a two-byte frame `[command, 0x00]`, decoded as
  `((b0 << 8) | b1) & 0x3FF`.
- [`LegacyCodec`]: a three-byte frame `[command, 0x00, 0x00]` used by an older
  board revision, decoded as `(b0 & 0x3) << 8 | b1`.

Which one a sequencer uses is chosen with [`CodecKind`].
 */

use std::error;
use std::fmt;
use std::fmt::{Debug, Display};

use serde::Deserialize;

/// Mask selecting the 10 bits of a conversion result.
pub const CODE_MASK: u16 = 0x3FF;

/// Largest code the ADC can produce.
pub const MAX_CODE: u16 = CODE_MASK;

/// Start bit, single-ended mode and MSB-first bits of the command word.
const START_SGL_MSBF: u8 = 0xD;

/// Codec-related errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CodecError {
    /// Channel is neither 0 nor 1.
    InvalidChannel(u8),
    /// The bus returned fewer bytes than the frame needs.
    ShortResponse {
        /// Bytes the codec needs to decode a result.
        expected: usize,
        /// Bytes actually received.
        got: usize,
    },
}

impl error::Error for CodecError {  }

impl Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use CodecError::*;
        match self {
            InvalidChannel(ch) => write!(f, "ADC channel {} does not exist (expected 0 or 1)", ch),
            ShortResponse { expected, got } =>
                write!(f, "ADC response too short (expected {} bytes, got {})", expected, got),
        }
    }
}

/// Encode the channel-select command: `0x68` for channel 0, `0x78` for channel 1.
pub fn encode_command(channel: u8) -> Result<u8, CodecError> {
    match channel {
        0 | 1 => Ok((START_SGL_MSBF | (channel << 1)) << 3),
        ch => Err(CodecError::InvalidChannel(ch)),
    }
}

/// Combine the two returned words into a 10-bit code.
///
/// The first byte lands in the high bits; anything above bit 9 is framing and is masked off.
pub fn decode_response(b0: u8, b1: u8) -> u16 {
    ((u16::from(b0) << 8) | u16::from(b1)) & CODE_MASK
}

/// Encode the channel-select command for the legacy protocol.
pub fn encode_command_legacy(channel: u8) -> Result<u8, CodecError> {
    match channel {
        0 | 1 => {
            let command = START_SGL_MSBF | (channel << 1);
            Ok(command << 3)
        },
        ch => Err(CodecError::InvalidChannel(ch)),
    }
}

/// Decode a legacy response: two low bits of the first word, then the second word.
pub fn decode_response_legacy(b0: u8, b1: u8) -> u16 {
    (u16::from(b0 & 0x3) << 8) | u16::from(b1)
}

/// Strategy translating between a channel selection and the bytes on the wire.
pub trait AdcCodec: Debug + Send {
    /// Build the complete transmit frame for one conversion on `channel`.
    fn frame(&self, channel: u8) -> Result<Vec<u8>, CodecError>;

    /// Decode the frame received in response to [`AdcCodec::frame`].
    fn decode(&self, rx: &[u8]) -> Result<u16, CodecError>;
}

/// Two-byte protocol used by current boards.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardCodec;

impl AdcCodec for StandardCodec {
    fn frame(&self, channel: u8) -> Result<Vec<u8>, CodecError> {
        Ok(vec![encode_command(channel)?, 0x00])
    }

    fn decode(&self, rx: &[u8]) -> Result<u16, CodecError> {
        match rx {
            [b0, b1, ..] => Ok(decode_response(*b0, *b1)),
            _ => Err(CodecError::ShortResponse { expected: 2, got: rx.len() }),
        }
    }
}

/// Three-byte protocol used by the earlier board revision.
#[derive(Clone, Copy, Debug, Default)]
pub struct LegacyCodec;

impl AdcCodec for LegacyCodec {
    fn frame(&self, channel: u8) -> Result<Vec<u8>, CodecError> {
        Ok(vec![encode_command_legacy(channel)?, 0x00, 0x00])
    }

    fn decode(&self, rx: &[u8]) -> Result<u16, CodecError> {
        // The third word only clocks the transfer; it carries nothing.
        match rx {
            [b0, b1, _, ..] => Ok(decode_response_legacy(*b0, *b1)),
            _ => Err(CodecError::ShortResponse { expected: 3, got: rx.len() }),
        }
    }
}

/// Selects which [`AdcCodec`] a sequencer drives the ADC with.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// [`StandardCodec`]
    Standard,
    /// [`LegacyCodec`]
    Legacy,
}

impl CodecKind {
    /// Create the codec this variant refers to.
    pub fn codec(&self) -> Box<dyn AdcCodec> {
        match self {
            CodecKind::Standard => Box::new(StandardCodec),
            CodecKind::Legacy => Box::new(LegacyCodec),
        }
    }
}

impl Default for CodecKind {
    fn default() -> Self {
        CodecKind::Standard
    }
}

impl Display for CodecKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CodecKind::Standard => write!(f, "standard"),
            CodecKind::Legacy => write!(f, "legacy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn channel_commands() {
        assert_eq!(encode_command(0), Ok(0x68));
        assert_eq!(encode_command(1), Ok(0x78));
    }

    #[test]
    fn reject_unknown_channel() {
        assert_eq!(encode_command(2), Err(CodecError::InvalidChannel(2)));
        assert_eq!(encode_command(255), Err(CodecError::InvalidChannel(255)));
        assert_eq!(encode_command_legacy(7), Err(CodecError::InvalidChannel(7)));
    }

    #[test]
    fn decode_known_response() {
        assert_eq!(decode_response(0x02, 0x34), 564);
        assert_eq!(decode_response(0xFF, 0xFF), 1023);
        assert_eq!(decode_response(0xFC, 0x00), 0);
    }

    #[test]
    fn legacy_command_and_decode() {
        assert_eq!(encode_command_legacy(0), Ok((0xD | 0) << 3));
        assert_eq!(encode_command_legacy(1), Ok((0xD | (1 << 1)) << 3));
        assert_eq!(decode_response_legacy(0x02, 0x34), (0x02 & 0x3) << 8 | 0x34);
        assert_eq!(decode_response_legacy(0xFE, 0x01), (0x2 << 8) | 0x01);
    }

    #[test]
    fn standard_frame() {
        let codec = StandardCodec;
        assert_eq!(codec.frame(1).unwrap(), vec![0x78, 0x00]);
        assert_eq!(codec.decode(&[0x02, 0x34]), Ok(564));
        assert_eq!(codec.decode(&[0x02]),
                   Err(CodecError::ShortResponse { expected: 2, got: 1 }));
    }

    #[test]
    fn legacy_frame() {
        let codec = LegacyCodec;
        assert_eq!(codec.frame(0).unwrap(), vec![0x68, 0x00, 0x00]);
        assert_eq!(codec.decode(&[0x03, 0xFF, 0x00]), Ok(1023));
        assert_eq!(codec.decode(&[0x02, 0x34, 0x00, 0x00]), Ok(564));
        assert_eq!(codec.decode(&[0x03, 0xFF]),
                   Err(CodecError::ShortResponse { expected: 3, got: 2 }));
    }

    #[test]
    fn codec_kind_names() {
        assert_eq!(CodecKind::Legacy.to_string(), "legacy");
        assert_eq!(CodecKind::Standard.to_string(), "standard");
        assert_eq!(CodecKind::default(), CodecKind::Standard);
    }

    proptest! {
        #[test]
        fn decode_matches_formula(b0 in any::<u8>(), b1 in any::<u8>()) {
            let code = decode_response(b0, b1);
            prop_assert!(code <= MAX_CODE);
            prop_assert_eq!(code, (((b0 as u16) << 8) | b1 as u16) & 0x3FF);
        }

        #[test]
        fn legacy_decode_in_range(b0 in any::<u8>(), b1 in any::<u8>()) {
            prop_assert!(decode_response_legacy(b0, b1) <= MAX_CODE);
        }
    }
}
