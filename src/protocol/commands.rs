//! Light bulb command encoding.
//!
//! The bulb accepts two fixed-length frames on its light control
//! characteristic:
//! - Power: `0xCC` + opcode (`0x23` on, `0x24` off) + `0x33`
//! - Color: `0x56` + red + green + blue + `0x00` + `0xF0` + `0xAA`
//!
//! The opcodes are vendor defined and sent as-is.

use bytes::Bytes;

use crate::data::Rgb;

/// Length of a power frame.
pub const POWER_FRAME_LEN: usize = 3;

/// Length of a color frame.
pub const COLOR_FRAME_LEN: usize = 7;

const POWER_HEADER: u8 = 0xCC;
const POWER_ON_OPCODE: u8 = 0x23;
const POWER_OFF_OPCODE: u8 = 0x24;
const POWER_TRAILER: u8 = 0x33;

const COLOR_HEADER: u8 = 0x56;
/// Warm-white level, mode and terminator that follow the RGB channels.
const COLOR_TRAILER: [u8; 3] = [0x00, 0xF0, 0xAA];

/// A command for the bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Command {
    /// Switch the bulb on or off.
    Power {
        /// Whether the bulb should be lit.
        on: bool,
    },
    /// Set the bulb color.
    Color(Rgb),
}

impl Command {
    /// Encode the command to its wire frame.
    pub fn encode(&self) -> Bytes {
        match *self {
            Self::Power { on } => Bytes::copy_from_slice(&encode_power(on)),
            Self::Color(rgb) => {
                Bytes::copy_from_slice(&encode_color(rgb.red, rgb.green, rgb.blue))
            }
        }
    }
}

impl From<Rgb> for Command {
    fn from(rgb: Rgb) -> Self {
        Self::Color(rgb)
    }
}

/// Build a power frame.
pub fn encode_power(on: bool) -> [u8; POWER_FRAME_LEN] {
    let opcode = if on { POWER_ON_OPCODE } else { POWER_OFF_OPCODE };
    [POWER_HEADER, opcode, POWER_TRAILER]
}

/// Build a color frame. Channels are sent unvalidated.
pub fn encode_color(red: u8, green: u8, blue: u8) -> [u8; COLOR_FRAME_LEN] {
    [
        COLOR_HEADER,
        red,
        green,
        blue,
        COLOR_TRAILER[0],
        COLOR_TRAILER[1],
        COLOR_TRAILER[2],
    ]
}
