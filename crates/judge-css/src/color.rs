//! CSS colours
//!
//! Normalises any colour lightningcss understands (names, hex, `rgb()`,
//! `hsl()`, `hwb()`, `lab()`, `oklch()`, `color()`, ...) to sRGB RGBA so
//! that `red`, `#FF0000` and `rgb(255, 0, 0)` compare equal.

use std::fmt;

use lightningcss::traits::Parse;
use lightningcss::values::color::{CssColor, RGBA};

/// RGBA colour, alpha quantised to 8 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse any colour notation; `None` if `value` is not a colour or has
    /// no fixed value (`currentcolor`, system colours, `light-dark()`)
    pub fn parse(value: &str) -> Option<Self> {
        let color = CssColor::parse_string(value.trim()).ok()?;
        Self::from_css(&color)
    }

    /// Convert a parsed lightningcss colour to sRGB
    pub fn from_css(color: &CssColor) -> Option<Self> {
        let rgba = RGBA::try_from(color).ok()?;
        Some(Self::rgba(rgba.red, rgba.green, rgba.blue, rgba.alpha))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}
