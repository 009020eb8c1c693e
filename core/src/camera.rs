//! Camera

use crate::geometry::*;
use crate::pbrt::*;

/// Half-width of the view frustum relative to the focal distance.
const FOV_SCALE: Float = 1.5;

/// A pinhole camera described by its position and an orthogonal frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Camera {
    /// Eye position.
    pub pos: Vector3f,

    /// Unit view direction.
    pub forward: Vector3f,

    /// Screen up axis, scaled by the field of view.
    pub up: Vector3f,

    /// Screen right axis, scaled by the field of view.
    pub right: Vector3f,
}

impl Camera {
    /// Create a camera at `pos` looking at `look_at`. World "down" is -Y.
    ///
    /// * `pos`     - Eye position.
    /// * `look_at` - Point to look at.
    pub fn new(pos: Vector3f, look_at: Vector3f) -> Self {
        let forward = (look_at - pos).normalize();
        let down = Vector3f::new(0.0, -1.0, 0.0);
        let right = FOV_SCALE * forward.cross(&down).normalize();
        let up = FOV_SCALE * forward.cross(&right).normalize();
        Self {
            pos,
            forward,
            up,
            right,
        }
    }

    /// Returns the ray through the centre of a pixel.
    ///
    /// * `view` - Image resolution.
    /// * `x`    - Pixel column.
    /// * `y`    - Pixel row.
    pub fn generate_ray(&self, view: &View, x: u32, y: u32) -> Ray {
        let w = view.width as Float;
        let h = view.height as Float;
        let rx = (x as Float - w / 2.0) / (2.0 * w);
        let ry = -(y as Float - h / 2.0) / (2.0 * h);
        let d = (self.forward + (self.right * rx + self.up * ry)).normalize();
        Ray::new(self.pos, d)
    }
}

impl Default for Camera {
    /// Camera used when a scene does not specify one.
    fn default() -> Self {
        Self::new(Vector3f::new(3.0, 2.0, 4.0), Vector3f::new(-1.0, 0.5, 0.0))
    }
}

/// Image resolution.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct View {
    /// Width in pixels.
    pub width: u32,

    /// Height in pixels.
    pub height: u32,
}

impl View {
    /// Create a new view.
    ///
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns true if the pixel lies inside the image.
    ///
    /// * `x` - Pixel column.
    /// * `y` - Pixel row.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }
}

impl Default for View {
    fn default() -> Self {
        Self::new(600, 600)
    }
}
