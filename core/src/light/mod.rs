//! Light

use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;

/// A point light source.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Light {
    /// Position.
    pub pos: Vector3f,

    /// Colour.
    pub color: Color,
}

impl Light {
    /// Create a new point light.
    ///
    /// * `pos`   - Position.
    /// * `color` - Colour.
    pub fn new(pos: Vector3f, color: Color) -> Self {
        Self { pos, color }
    }

    /// Create a light from scene file values. The colour is divided by its
    /// largest channel when that exceeds 1 so that no channel is above 1.
    ///
    /// * `pos`   - Position.
    /// * `color` - Unnormalized colour.
    pub fn from_scene_values(pos: Vector3f, color: Color) -> Self {
        let n = max(color.max_component(), 1.0);
        Self::new(pos, color * (1.0 / n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bright_colours_are_normalized() {
        let l = Light::from_scene_values(Vector3f::zero(), Color::new(2.0, 1.0, 0.5));
        assert_eq!(l.color, Color::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn dim_colours_are_kept() {
        let c = Color::new(0.49, 0.07, 0.07);
        let l = Light::from_scene_values(Vector3f::new(1.0, 2.0, 3.0), c);
        assert_eq!(l.color, c);
        assert_eq!(l.pos, Vector3f::new(1.0, 2.0, 3.0));
    }
}
