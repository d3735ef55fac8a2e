use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Eight-bit RGBA. Purely presentational: the core carries it on a `Body`
/// but never reads it during physics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Color {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self { a, r, g, b }
    }

    pub const OPAQUE_WHITE: Color = Color { a: 255, r: 255, g: 255, b: 255 };

    /// Parses `#AARRGGBB`.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let hex = s.strip_prefix('#').ok_or_else(|| {
            CoreError::InvalidInput(format!("color '{s}' is missing the '#' prefix"))
        })?;
        if hex.len() != 8 {
            return Err(CoreError::InvalidInput(format!(
                "color '{s}' must have exactly 8 hex digits after '#'"
            )));
        }
        let byte = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| CoreError::InvalidInput(format!("color '{s}' has invalid hex digits")))
        };
        Ok(Self {
            a: byte(0..2)?,
            r: byte(2..4)?,
            g: byte(4..6)?,
            b: byte(6..8)?,
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.a, self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::parse(&s).map_err(serde::de::Error::custom)
    }
}
