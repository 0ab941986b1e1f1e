//! RGB colors, blacklist exclusion ranges and constrained sampling.

pub mod blacklist;
pub mod sampler;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use blacklist::{Blacklist, BlacklistEntry, ExclusionRange, Tolerance};
pub use sampler::{sample_color, ColorSampler};

/// An 8-bit-per-channel RGB color.
///
/// Serialized as the packed `0xRRGGBB` integer the transport uses for role
/// colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Packed value 0: roles with this color are displayed uncolored.
    pub const UNSET: Color = Color { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build from a packed `0xRRGGBB` value. Bits above 24 are ignored.
    pub const fn from_u32(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn channels(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }
}

impl From<u32> for Color {
    fn from(packed: u32) -> Self {
        Self::from_u32(packed)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.to_u32()
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x} ({}, {}, {})", self.r, self.g, self.b, self.r, self.g, self.b)
    }
}
