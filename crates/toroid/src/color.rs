use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
pub const RED: Color = Color::rgba(255, 0, 0, 255);
pub const GREEN: Color = Color::rgba(0, 255, 0, 255);
pub const BLUE: Color = Color::rgba(0, 0, 255, 255);
pub const YELLOW: Color = Color::rgba(255, 255, 0, 255);

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn from_rgba(rgba: [u8; 4]) -> Self {
        Self::rgba(rgba[0], rgba[1], rgba[2], rgba[3])
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("hitbox colors must be fully opaque, got alpha {alpha}")]
    Translucent { alpha: u8 },
}

/// Identity color stamped into the hit surface. Alpha is always 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitboxColor(Color);

impl HitboxColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(Color::rgba(r, g, b, 255))
    }

    pub const fn color(self) -> Color {
        self.0
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        self.0.to_rgba()
    }

    pub fn matches(self, pixel: Color) -> bool {
        self.0 == pixel
    }
}

impl TryFrom<Color> for HitboxColor {
    type Error = ColorError;

    fn try_from(color: Color) -> Result<Self, Self::Error> {
        if color.a != 255 {
            return Err(ColorError::Translucent { alpha: color.a });
        }
        Ok(Self(color))
    }
}

impl From<HitboxColor> for Color {
    fn from(color: HitboxColor) -> Self {
        color.0
    }
}

impl fmt::Display for HitboxColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
