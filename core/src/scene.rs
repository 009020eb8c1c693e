//! Scene

use crate::camera::*;
use crate::geometry::*;
use crate::light::*;
use crate::pbrt::*;

/// A fully assembled scene. Built once per job and immutable thereafter.
#[derive(Clone, Default)]
pub struct Scene {
    /// Surface objects.
    pub shapes: Vec<ArcShape>,

    /// Point lights.
    pub lights: Vec<Light>,

    /// The camera.
    pub camera: Camera,

    /// Image resolution.
    pub view: View,
}

impl Scene {
    /// Creates a new `Scene`.
    ///
    /// * `shapes` - Surface objects.
    /// * `lights` - Point lights.
    /// * `camera` - The camera.
    /// * `view`   - Image resolution.
    pub fn new(shapes: Vec<ArcShape>, lights: Vec<Light>, camera: Camera, view: View) -> Self {
        Self {
            shapes,
            lights,
            camera,
            view,
        }
    }

    /// Traces the ray into the scene and returns the nearest intersection
    /// with a strictly positive distance. Ties keep the first shape.
    ///
    /// * `ray` - The ray to trace.
    pub fn intersect(&self, ray: &Ray) -> Option<Intersection> {
        let mut nearest: Option<Intersection> = None;
        for shape in self.shapes.iter() {
            if let Some(dist) = shape.intersect(ray) {
                if dist > 0.0 && nearest.as_ref().map_or(true, |n| dist < n.dist) {
                    nearest = Some(Intersection {
                        shape,
                        ray: *ray,
                        dist,
                    });
                }
            }
        }
        nearest
    }

    /// Returns the distance to the nearest intersection or 0 if there is
    /// none.
    ///
    /// * `ray` - The ray to trace.
    pub fn test_ray(&self, ray: &Ray) -> Float {
        self.intersect(ray).map_or(0.0, |isect| isect.dist)
    }

    /// Returns a copy of the scene rendered at a different resolution.
    ///
    /// * `view` - Image resolution.
    pub fn with_view(&self, view: View) -> Self {
        Self {
            view,
            ..self.clone()
        }
    }
}
