//! Spheres

use rayfarm_core::geometry::*;
use rayfarm_core::material::*;
use rayfarm_core::pbrt::*;

/// A sphere.
#[derive(Clone)]
pub struct Sphere {
    /// Centre of sphere.
    pub center: Vector3f,

    /// Radius of sphere.
    pub radius: Float,

    /// Surface description.
    pub surface: ArcSurface,
}

impl Sphere {
    /// Create a new sphere.
    ///
    /// * `center`  - Centre of sphere.
    /// * `radius`  - Radius of sphere.
    /// * `surface` - Surface description.
    pub fn new(center: Vector3f, radius: Float, surface: ArcSurface) -> Self {
        Self {
            center,
            radius,
            surface,
        }
    }
}

impl Shape for Sphere {
    fn get_type(&self) -> &'static str {
        "sphere"
    }

    /// Returns the distance to the near side of the sphere. Spheres centred
    /// behind the ray origin are never hit.
    ///
    /// * `r` - The ray. The direction is expected to be normalized.
    fn intersect(&self, r: &Ray) -> Option<Float> {
        let eo = self.center - r.o;
        let v = eo.dot(&r.d);
        if v < 0.0 {
            return None;
        }

        let disc = self.radius * self.radius - (eo.dot(&eo) - v * v);
        if disc < 0.0 {
            return None;
        }

        let dist = v - disc.sqrt();
        if dist == 0.0 {
            None
        } else {
            Some(dist)
        }
    }

    fn normal(&self, p: &Vector3f) -> Vector3f {
        (*p - self.center).normalize()
    }

    fn surface(&self) -> &ArcSurface {
        &self.surface
    }
}
