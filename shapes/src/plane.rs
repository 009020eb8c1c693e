//! Planes

use rayfarm_core::geometry::*;
use rayfarm_core::material::*;
use rayfarm_core::pbrt::*;

/// An infinite plane of points `p` satisfying `norm . p + offset = 0`.
#[derive(Clone)]
pub struct Plane {
    /// Unit normal.
    pub norm: Vector3f,

    /// Offset along the normal.
    pub offset: Float,

    /// Surface description.
    pub surface: ArcSurface,
}

impl Plane {
    /// Create a new plane.
    ///
    /// * `norm`    - Plane normal.
    /// * `offset`  - Offset along the normal.
    /// * `surface` - Surface description.
    pub fn new(norm: Vector3f, offset: Float, surface: ArcSurface) -> Self {
        Self {
            norm,
            offset,
            surface,
        }
    }
}

impl Shape for Plane {
    fn get_type(&self) -> &'static str {
        "plane"
    }

    /// Planes are one sided; rays travelling along the normal never hit.
    ///
    /// * `r` - The ray.
    fn intersect(&self, r: &Ray) -> Option<Float> {
        let denom = self.norm.dot(&r.d);
        if denom > 0.0 {
            return None;
        }
        Some((self.norm.dot(&r.o) + self.offset) / (-denom))
    }

    fn normal(&self, _p: &Vector3f) -> Vector3f {
        self.norm
    }

    fn surface(&self) -> &ArcSurface {
        &self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn floor() -> Plane {
        Plane::new(Vector3f::new(0.0, 1.0, 0.0), 0.0, Arc::new(CheckerBoard))
    }

    #[test]
    fn ray_pointing_down_hits() {
        let r = Ray::new(Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(0.0, -1.0, 0.0));
        assert_eq!(floor().intersect(&r), Some(2.0));
    }

    #[test]
    fn ray_pointing_up_misses() {
        let r = Ray::new(Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(floor().intersect(&r), None);
    }

    #[test]
    fn offset_moves_plane() {
        let p = Plane::new(Vector3f::new(0.0, 1.0, 0.0), 1.0, Arc::new(CheckerBoard));
        let r = Ray::new(Vector3f::new(0.0, 2.0, 0.0), Vector3f::new(0.0, -1.0, 0.0));
        // norm . p = -1  =>  y = -1.
        assert_eq!(p.intersect(&r), Some(3.0));
    }

    #[test]
    fn normal_is_constant() {
        let p = floor();
        assert_eq!(p.normal(&Vector3f::new(5.0, 0.0, -3.0)), Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(p.get_type(), "plane");
    }
}
