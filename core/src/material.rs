//! Material

use crate::geometry::*;
use crate::pbrt::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Surface trait describes how a point on a shape responds to light.
pub trait Surface {
    /// Returns the diffuse colour at a point.
    ///
    /// * `p` - Point on the surface.
    fn diffuse(&self, p: &Vector3f) -> Color;

    /// Returns the specular colour at a point.
    ///
    /// * `p` - Point on the surface.
    fn specular(&self, p: &Vector3f) -> Color;

    /// Returns the reflectivity at a point.
    ///
    /// * `p` - Point on the surface.
    fn reflect(&self, p: &Vector3f) -> Float;

    /// Returns the specular exponent.
    fn roughness(&self) -> Float;
}

/// Atomic reference counted `Surface`.
pub type ArcSurface = Arc<dyn Surface + Send + Sync>;

/// A surface with the same properties everywhere.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UniformSurface {
    /// Diffuse colour.
    pub diffuse: Color,

    /// Specular colour.
    pub specular: Color,

    /// Reflectivity.
    pub reflect: Float,

    /// Specular exponent.
    pub roughness: Float,
}

impl UniformSurface {
    /// Scene files specify roughness as a factor of this exponent.
    pub const ROUGHNESS_SCALE: Float = 200.0;

    /// Returns the surface described by a scene file object: the given
    /// diffuse colour, a half-strength gray specular and a roughness factor
    /// scaled by `ROUGHNESS_SCALE`.
    ///
    /// * `diffuse`          - Diffuse colour.
    /// * `reflect`          - Reflectivity.
    /// * `roughness_factor` - Roughness factor.
    pub fn from_scene_values(diffuse: Color, reflect: Float, roughness_factor: Float) -> Self {
        Self {
            diffuse,
            specular: GRAY,
            reflect,
            roughness: Self::ROUGHNESS_SCALE * roughness_factor,
        }
    }

    /// The built-in "shiny" material.
    pub fn shiny() -> Self {
        Self {
            diffuse: WHITE,
            specular: GRAY,
            reflect: 0.6,
            roughness: 50.0,
        }
    }
}

impl Surface for UniformSurface {
    fn diffuse(&self, _p: &Vector3f) -> Color {
        self.diffuse
    }

    fn specular(&self, _p: &Vector3f) -> Color {
        self.specular
    }

    fn reflect(&self, _p: &Vector3f) -> Float {
        self.reflect
    }

    fn roughness(&self) -> Float {
        self.roughness
    }
}

/// The built-in "checkerboard" material. Squares are unit sized in the X-Z
/// plane, so it only looks right on planes facing up or down.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CheckerBoard;

impl CheckerBoard {
    /// Returns true for the white squares.
    ///
    /// * `p` - Point on the surface.
    fn is_odd(p: &Vector3f) -> bool {
        (p.z.floor() + p.x.floor()) % 2.0 != 0.0
    }
}

impl Surface for CheckerBoard {
    fn diffuse(&self, p: &Vector3f) -> Color {
        if Self::is_odd(p) {
            WHITE
        } else {
            BLACK
        }
    }

    fn specular(&self, _p: &Vector3f) -> Color {
        WHITE
    }

    fn reflect(&self, p: &Vector3f) -> Float {
        if Self::is_odd(p) {
            0.1
        } else {
            0.7
        }
    }

    fn roughness(&self) -> Float {
        150.0
    }
}

/// Returns a built-in material by name.
///
/// * `name` - Material name.
pub fn named_surface(name: &str) -> Option<ArcSurface> {
    match name {
        "checkerboard" => Some(Arc::new(CheckerBoard)),
        "shiny" => Some(Arc::new(UniformSurface::shiny())),
        _ => None,
    }
}
