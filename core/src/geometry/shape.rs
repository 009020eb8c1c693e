//! Shapes

use super::{Ray, Vector3f};
use crate::material::*;
use crate::pbrt::*;
use std::sync::Arc;

/// Shape common functions
pub trait Shape {
    /// Returns the shape type. Usually these are behind `ArcShape` and harder
    /// to debug. So this will be helpful.
    fn get_type(&self) -> &'static str;

    /// Returns the distance along the ray to the first surface point, or
    /// `None` if the ray misses. A distance of exactly 0 counts as a miss.
    ///
    /// * `r` - The ray.
    fn intersect(&self, r: &Ray) -> Option<Float>;

    /// Returns the unit surface normal at a point on the shape.
    ///
    /// * `p` - Point on the surface.
    fn normal(&self, p: &Vector3f) -> Vector3f;

    /// Returns the surface description used for shading.
    fn surface(&self) -> &ArcSurface;
}

/// Atomic reference counted `Shape`.
pub type ArcShape = Arc<dyn Shape + Send + Sync>;

/// Records the nearest hit of a ray.
#[derive(Clone)]
pub struct Intersection<'a> {
    /// The shape that was hit.
    pub shape: &'a ArcShape,

    /// The ray.
    pub ray: Ray,

    /// Distance along the ray.
    pub dist: Float,
}

impl<'a> Intersection<'a> {
    /// Returns the hit position.
    pub fn position(&self) -> Vector3f {
        self.ray.at(self.dist)
    }
}
