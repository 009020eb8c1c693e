//! RGB colour

use crate::pbrt::*;
use std::fmt;
use std::ops::{Add, AddAssign, Mul};

/// An RGB colour with unbounded floating point channels. Channels are only
/// clamped when quantized to bytes.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color {
    /// Red.
    pub r: Float,

    /// Green.
    pub g: Float,

    /// Blue.
    pub b: Float,
}

/// Returned for rays that escape the scene.
pub const BACKGROUND: Color = Color::new(0.0, 0.0, 0.0);

/// Black.
pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

/// Added in place of a reflection once the recursion limit is reached.
pub const GRAY: Color = Color::new(0.5, 0.5, 0.5);

/// White.
pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);

impl Color {
    /// Create a new colour.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub const fn new(r: Float, g: Float, b: Float) -> Self {
        Self { r, g, b }
    }

    /// Returns the largest channel value.
    pub fn max_component(&self) -> Float {
        max(self.r, max(self.g, self.b))
    }

    /// Returns true if any channel is NaN.
    pub fn has_nans(&self) -> bool {
        self.r.is_nan() || self.g.is_nan() || self.b.is_nan()
    }

    /// Clamps each channel to [0, 1] and quantizes to bytes.
    pub fn to_bytes(&self) -> [u8; 3] {
        [
            channel_to_byte(self.r),
            channel_to_byte(self.g),
            channel_to_byte(self.b),
        ]
    }
}

impl Add for Color {
    type Output = Self;

    /// Adds the given colour and returns the result.
    ///
    /// * `other` - The colour to add.
    fn add(self, other: Self) -> Self::Output {
        Self::new(self.r + other.r, self.g + other.g, self.b + other.b)
    }
}

impl AddAssign for Color {
    /// Performs the `+=` operation.
    ///
    /// * `other` - The colour to add.
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Mul for Color {
    type Output = Self;

    /// Multiplies channel by channel.
    ///
    /// * `other` - The other colour.
    fn mul(self, other: Self) -> Self::Output {
        Self::new(self.r * other.r, self.g * other.g, self.b * other.b)
    }
}

impl Mul<Float> for Color {
    type Output = Self;

    /// Scales every channel.
    ///
    /// * `f` - The scaling factor.
    fn mul(self, f: Float) -> Self::Output {
        Self::new(self.r * f, self.g * f, self.b * f)
    }
}

impl Mul<Color> for Float {
    type Output = Color;

    /// Scales every channel.
    ///
    /// * `c` - The colour.
    fn mul(self, c: Color) -> Color {
        c * self
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.r, self.g, self.b)
    }
}
