//! Plain RGBA color for collision group and hull display

use serde::{Deserialize, Serialize};

/// Simple RGBA color (no Bevy dependency)
///
/// Components are linear 0-1 floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Build a color from 8-bit channels
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Convert to 8-bit channels, clamping out-of-range components
    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), channel(self.a)]
    }

    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);
    /// Color of hulls whose tile has no collision group
    pub const UNASSIGNED: Self = Self::rgb(0.75, 0.75, 0.75);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[cfg(feature = "bevy")]
impl From<Color> for bevy::color::Color {
    fn from(color: Color) -> Self {
        bevy::color::Color::linear_rgba(color.r, color.g, color.b, color.a)
    }
}
