//! Rays

use super::Vector3f;
use crate::pbrt::*;
use std::fmt;

/// A semi-infinite line specified by its origin and direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin.
    pub o: Vector3f,

    /// Direction. Not necessarily normalized.
    pub d: Vector3f,
}

impl Ray {
    /// Returns a new ray.
    ///
    /// * `o` - Origin.
    /// * `d` - Direction.
    pub fn new(o: Vector3f, d: Vector3f) -> Self {
        Self { o, d }
    }

    /// Returns the position along the ray at distance `t`.
    ///
    /// * `t` - The parameter.
    pub fn at(&self, t: Float) -> Vector3f {
        self.o + self.d * t
    }

    /// Returns true if the ray has NaN components.
    pub fn has_nans(&self) -> bool {
        self.o.has_nans() || self.d.has_nans()
    }
}

impl fmt::Display for Ray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[o=({}, {}, {}), d=({}, {}, {})]",
            self.o.x, self.o.y, self.o.z, self.d.x, self.d.y, self.d.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_nans() {
        let nan = Vector3f::new(f64::NAN, f64::NAN, f64::NAN);
        let o = Vector3f::zero();
        let d = Vector3f::new(1.0, 0.0, 0.0);

        assert!(Ray::new(nan, d).has_nans());
        assert!(Ray::new(o, nan).has_nans());
        assert!(!Ray::new(o, d).has_nans());
    }

    #[test]
    fn at() {
        let o = Vector3f::zero();
        let d = Vector3f::new(1.0, 1.0, 1.0);
        let r = Ray::new(o, d);
        assert!(r.at(0.0) == o);
        assert!(r.at(1.0) == d);
        assert!(r.at(2.5) == Vector3f::new(2.5, 2.5, 2.5));
    }

    #[test]
    fn display() {
        let r = Ray::new(Vector3f::zero(), Vector3f::new(0.0, 1.0, 0.0));
        assert_eq!(format!("{r}"), "[o=(0, 0, 0), d=(0, 1, 0)]");
    }
}
