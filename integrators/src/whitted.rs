//! Whitted Integrator

use rayfarm_core::camera::*;
use rayfarm_core::film::*;
use rayfarm_core::geometry::*;
use rayfarm_core::pbrt::*;
use rayfarm_core::scene::*;
use rayfarm_core::spectrum::*;
use std::thread;

/// Default maximum recursion depth.
pub const MAX_DEPTH: usize = 5;

/// Reflected rays start this far along the mirror direction.
pub const REFLECTION_OFFSET: Float = 0.001;

/// Implements Whitted's ray tracing algorithm: direct lighting from point
/// lights with hard shadows plus perfect mirror reflection.
#[derive(Copy, Clone, Debug)]
pub struct WhittedIntegrator {
    /// Maximum recursion depth.
    max_depth: usize,
}

impl Default for WhittedIntegrator {
    fn default() -> Self {
        Self::new(MAX_DEPTH)
    }
}

impl WhittedIntegrator {
    /// Create a new `WhittedIntegrator`.
    ///
    /// * `max_depth` - Maximum recursion depth.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Returns the colour seen along a ray.
    ///
    /// * `ray`   - The ray.
    /// * `scene` - The scene.
    /// * `depth` - The recursion depth.
    pub fn li(&self, ray: &Ray, scene: &Scene, depth: usize) -> Color {
        match scene.intersect(ray) {
            Some(isect) => self.shade(&isect, scene, depth),
            None => BACKGROUND,
        }
    }

    /// Returns the colour at an intersection. Once `depth` reaches the
    /// maximum a flat gray is added instead of tracing the reflection.
    ///
    /// * `isect` - The intersection.
    /// * `scene` - The scene.
    /// * `depth` - The recursion depth.
    fn shade(&self, isect: &Intersection, scene: &Scene, depth: usize) -> Color {
        let d = isect.ray.d;
        let pos = isect.position();
        let n = isect.shape.normal(&pos);
        let reflect_dir = d - n * (2.0 * n.dot(&d));

        let l = self.natural_color(isect.shape, &pos, &n, &reflect_dir, scene);
        if depth >= self.max_depth {
            return l + GRAY;
        }
        l + self.reflection_color(isect.shape, &(pos + reflect_dir * REFLECTION_OFFSET), &reflect_dir, scene, depth)
    }

    /// Sums the diffuse and specular contributions of every light that is
    /// not blocked by another object.
    ///
    /// * `shape`       - The shape that was hit.
    /// * `pos`         - Hit position.
    /// * `n`           - Surface normal at `pos`.
    /// * `reflect_dir` - Mirror direction at `pos`.
    /// * `scene`       - The scene.
    fn natural_color(
        &self,
        shape: &ArcShape,
        pos: &Vector3f,
        n: &Vector3f,
        reflect_dir: &Vector3f,
        scene: &Scene,
    ) -> Color {
        let surface = shape.surface();
        let mut l = BLACK;

        for light in scene.lights.iter() {
            let ldis = light.pos - *pos;
            let livec = ldis.normalize();
            if Self::in_shadow(scene, pos, &livec, ldis.length()) {
                trace!("Light at ({}, {}, {}) is occluded", light.pos.x, light.pos.y, light.pos.z);
                continue;
            }

            let illum = livec.dot(n);
            let lcolor = if illum > 0.0 { illum * light.color } else { BLACK };

            let specular = livec.dot(&reflect_dir.normalize());
            let scolor = if specular > 0.0 {
                specular.powf(surface.roughness()) * light.color
            } else {
                BLACK
            };

            l += surface.diffuse(pos) * lcolor + surface.specular(pos) * scolor;
        }

        l
    }

    /// Returns true if something lies between `pos` and a light.
    ///
    /// * `scene`    - The scene.
    /// * `pos`      - Shaded position.
    /// * `livec`    - Unit vector towards the light.
    /// * `distance` - Distance to the light.
    fn in_shadow(scene: &Scene, pos: &Vector3f, livec: &Vector3f, distance: Float) -> bool {
        let shadow_ray = Ray::new(*pos + *livec * SHADOW_EPSILON, *livec);
        let t = scene.test_ray(&shadow_ray);
        t != 0.0 && t <= distance
    }

    /// Returns the reflected colour scaled by the surface reflectivity.
    ///
    /// * `shape`       - The shape that was hit.
    /// * `pos`         - Offset hit position.
    /// * `reflect_dir` - Mirror direction.
    /// * `scene`       - The scene.
    /// * `depth`       - The recursion depth.
    fn reflection_color(
        &self,
        shape: &ArcShape,
        pos: &Vector3f,
        reflect_dir: &Vector3f,
        scene: &Scene,
        depth: usize,
    ) -> Color {
        shape.surface().reflect(pos) * self.li(&Ray::new(*pos, *reflect_dir), scene, depth + 1)
    }

    /// Returns the quantized colour of one pixel.
    ///
    /// * `scene` - The scene.
    /// * `x`     - Pixel column.
    /// * `y`     - Pixel row.
    pub fn render_pixel(&self, scene: &Scene, x: u32, y: u32) -> [u8; 3] {
        let ray = scene.camera.generate_ray(&scene.view, x, y);
        let mut l = self.li(&ray, scene, 0);
        if l.has_nans() {
            error!("Not-a-number radiance value returned for pixel ({x}, {y}). Setting to black.");
            l = BLACK;
        }
        l.to_bytes()
    }

    /// Returns the quantized colours of a whole row, three bytes per pixel.
    ///
    /// * `scene` - The scene.
    /// * `y`     - Pixel row.
    pub fn render_row(&self, scene: &Scene, y: u32) -> Vec<u8> {
        let mut row = Vec::with_capacity(scene.view.width as usize * CHANNELS);
        for x in 0..scene.view.width {
            row.extend_from_slice(&self.render_pixel(scene, x, y));
        }
        row
    }

    /// Renders the whole image on `n_threads` threads without any network.
    ///
    /// * `scene`     - The scene.
    /// * `n_threads` - Number of rendering threads.
    pub fn render(&self, scene: &Scene, n_threads: usize) -> PixelBuffer {
        let View { width, height } = scene.view;
        let n_threads = max(n_threads, 1);
        info!("Rendering {width}x{height} image on {n_threads} threads");

        let mut pixels = PixelBuffer::new(scene.view);
        thread::scope(|scope| {
            let (tx_worker, rx_worker) = crossbeam_channel::bounded::<u32>(n_threads);
            let (tx_collector, rx_collector) = crossbeam_channel::bounded::<(u32, Vec<u8>)>(n_threads);

            // Spawn worker threads.
            for _ in 0..n_threads {
                let rx_worker = rx_worker.clone();
                let tx_collector = tx_collector.clone();
                scope.spawn(move || {
                    for y in rx_worker.iter() {
                        if tx_collector.send((y, self.render_row(scene, y))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(rx_worker); // Drop extra since we've cloned one for each worker.
            drop(tx_collector);

            // Send work from its own thread so the collector below can drain.
            scope.spawn(move || {
                for y in 0..height {
                    if tx_worker.send(y).is_err() {
                        break;
                    }
                }
            });

            for (y, row) in rx_collector.iter() {
                pixels.set_row(y, &row);
                debug!("Finished row {y}");
            }
        });

        info!("Rendering finished.");
        pixels
    }
}
