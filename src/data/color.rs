//! RGB color values and named presets.

use std::fmt;

use crate::error::{Error, Result};

/// A 24-bit RGB color as sent to the bulb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    /// Red channel.
    pub red: u8,
    /// Green channel.
    pub green: u8,
    /// Blue channel.
    pub blue: u8,
}

impl Rgb {
    /// Full red.
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    /// Full green.
    pub const GREEN: Rgb = Rgb::new(0, 255, 0);
    /// Full blue.
    pub const BLUE: Rgb = Rgb::new(0, 0, 255);
    /// Yellow at half brightness.
    pub const YELLOW: Rgb = Rgb::new(127, 127, 0);
    /// Orange.
    pub const ORANGE: Rgb = Rgb::new(127, 35, 0);
    /// Purple.
    pub const PURPLE: Rgb = Rgb::new(127, 0, 127);
    /// Pink.
    pub const PINK: Rgb = Rgb::new(180, 12, 44);
    /// Cyan.
    pub const CYAN: Rgb = Rgb::new(0, 127, 127);
    /// White at half brightness.
    pub const WHITE: Rgb = Rgb::new(127, 127, 127);

    /// All named presets.
    pub const PRESETS: [(&'static str, Rgb); 9] = [
        ("red", Self::RED),
        ("green", Self::GREEN),
        ("blue", Self::BLUE),
        ("yellow", Self::YELLOW),
        ("orange", Self::ORANGE),
        ("purple", Self::PURPLE),
        ("pink", Self::PINK),
        ("cyan", Self::CYAN),
        ("white", Self::WHITE),
    ];

    /// Create a color from its channels.
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Look up a named preset, ignoring case and surrounding whitespace.
    ///
    /// # Example
    ///
    /// ```
    /// use magicblue_rust_ble::Rgb;
    ///
    /// assert_eq!(Rgb::preset("Yellow").unwrap(), Rgb::new(127, 127, 0));
    /// assert!(Rgb::preset("mauve").is_err());
    /// ```
    pub fn preset(name: &str) -> Result<Self> {
        let wanted = name.trim();
        Self::PRESETS
            .iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(wanted))
            .map(|(_, color)| *color)
            .ok_or_else(|| Error::UnknownPreset {
                name: wanted.to_string(),
            })
    }

    /// The channels as a tuple.
    pub fn to_tuple(self) -> (u8, u8, u8) {
        (self.red, self.green, self.blue)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((red, green, blue): (u8, u8, u8)) -> Self {
        Self::new(red, green, blue)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_values() {
        assert_eq!(Rgb::preset("red").unwrap(), Rgb::new(255, 0, 0));
        assert_eq!(Rgb::preset("orange").unwrap(), Rgb::new(127, 35, 0));
        assert_eq!(Rgb::preset("pink").unwrap(), Rgb::new(180, 12, 44));
        assert_eq!(Rgb::preset("white").unwrap(), Rgb::new(127, 127, 127));
    }

    #[test]
    fn test_preset_lookup_is_case_insensitive() {
        assert_eq!(Rgb::preset("  CYAN ").unwrap(), Rgb::CYAN);
        assert_eq!(Rgb::preset("Purple").unwrap(), Rgb::PURPLE);
    }

    #[test]
    fn test_unknown_preset() {
        match Rgb::preset("magenta") {
            Err(Error::UnknownPreset { name }) => assert_eq!(name, "magenta"),
            other => panic!("expected UnknownPreset, got {:?}", other),
        }
    }

    #[test]
    fn test_display_and_tuple() {
        assert_eq!(Rgb::PINK.to_string(), "#B40C2C");
        assert_eq!(Rgb::from((1, 2, 3)).to_tuple(), (1, 2, 3));
    }
}
