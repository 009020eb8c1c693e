//! Common

use crate::SceneError;
use rayfarm_core::camera::*;
use rayfarm_core::geometry::*;
use rayfarm_core::light::*;
use rayfarm_core::material::*;
use rayfarm_core::pbrt::*;
use rayfarm_core::scene::*;
use rayfarm_core::spectrum::*;
use rayfarm_shapes::*;
use std::sync::Arc;

/// Number of values in a fully numeric `sphere` or `plane` directive.
const SURFACE_VALUES: usize = 9;

/// Number of values in a `sphere` or `plane` directive that names a material.
const NAMED_SURFACE_VALUES: usize = 4;

/// One recognized line of a scene file.
pub enum Directive {
    Camera(Camera), // camera eyeX eyeY eyeZ lookX lookY lookZ
    View(View),     // view width height
    Light(Light),   // light x y z r g b
    Shape(ArcShape), // sphere ... | plane ...
}

impl Directive {
    /// Parse one line. Returns `None` for blank lines, comments and unknown
    /// directives.
    ///
    /// * `line`    - Scene text.
    /// * `line_no` - 1-based line number for error messages.
    pub fn parse(line: &str, line_no: usize) -> Result<Option<Self>, SceneError> {
        let mut tokens = line.split([' ', '\t']).filter(|t| !t.is_empty());
        let keyword = match tokens.next() {
            Some(keyword) => keyword,
            None => return Ok(None),
        };
        let args: Vec<&str> = tokens.collect();

        match keyword {
            k if k.starts_with('#') => Ok(None),
            "camera" => read_camera(&args, line_no).map(|c| Some(Self::Camera(c))),
            "view" => read_view(&args, line_no).map(|v| Some(Self::View(v))),
            "light" => read_light(&args, line_no).map(|l| Some(Self::Light(l))),
            "sphere" => read_sphere(&args, line_no).map(|s| Some(Self::Shape(s))),
            "plane" => read_plane(&args, line_no).map(|s| Some(Self::Shape(s))),
            _ => {
                debug!("Skipping unknown directive '{keyword}' on line {line_no}");
                Ok(None)
            }
        }
    }
}

/// Accumulates directives into a `Scene`.
pub struct SceneBuilder {
    shapes: Vec<ArcShape>,
    lights: Vec<Light>,
    camera: Camera,
    view: View,
}

impl Default for SceneBuilder {
    fn default() -> Self {
        Self {
            shapes: vec![],
            lights: vec![],
            camera: Camera::default(),
            view: View::default(),
        }
    }
}

impl SceneBuilder {
    /// Apply a directive. Later `camera` and `view` directives replace
    /// earlier ones; shapes and lights accumulate.
    ///
    /// * `directive` - The directive.
    pub fn apply(&mut self, directive: Directive) {
        match directive {
            Directive::Camera(camera) => self.camera = camera,
            Directive::View(view) => self.view = view,
            Directive::Light(light) => self.lights.push(light),
            Directive::Shape(shape) => self.shapes.push(shape),
        }
    }

    /// Returns the assembled scene.
    pub fn build(self) -> Scene {
        Scene::new(self.shapes, self.lights, self.camera, self.view)
    }
}

/// Returns every token that parses as a number, skipping the rest.
///
/// * `args` - Directive arguments.
fn numbers(args: &[&str]) -> Vec<Float> {
    args.iter().filter_map(|t| t.parse::<Float>().ok()).collect()
}

/// Fails unless at least `expected` values were found.
fn require(directive: &'static str, expected: usize, found: usize, line: usize) -> Result<(), SceneError> {
    if found < expected {
        Err(SceneError::MissingValues {
            directive,
            expected,
            found,
            line,
        })
    } else {
        Ok(())
    }
}

fn read_camera(args: &[&str], line: usize) -> Result<Camera, SceneError> {
    let vs = numbers(args);
    require("camera", 6, vs.len(), line)?;
    Ok(Camera::new(
        Vector3f::new(vs[0], vs[1], vs[2]),
        Vector3f::new(vs[3], vs[4], vs[5]),
    ))
}

fn read_view(args: &[&str], line: usize) -> Result<View, SceneError> {
    let vs: Vec<i64> = args.iter().filter_map(|t| t.parse::<i64>().ok()).collect();
    require("view", 2, vs.len(), line)?;

    let dimension = |v: i64| match u32::try_from(v) {
        Ok(d) if d > 0 => Ok(d),
        _ => Err(SceneError::InvalidNumber {
            directive: "view",
            value: v.to_string(),
            line,
        }),
    };
    Ok(View::new(dimension(vs[0])?, dimension(vs[1])?))
}

fn read_light(args: &[&str], line: usize) -> Result<Light, SceneError> {
    let vs = numbers(args);
    require("light", 6, vs.len(), line)?;
    Ok(Light::from_scene_values(
        Vector3f::new(vs[0], vs[1], vs[2]),
        Color::new(vs[3], vs[4], vs[5]),
    ))
}

/// Returns the surface of a `sphere` or `plane`: either the numeric form
/// `r g b reflect roughness` after the four geometry values, or a named
/// material.
///
/// * `directive` - Directive name.
/// * `vs`        - Numeric values.
/// * `args`      - All arguments.
/// * `line`      - Line number.
fn read_surface(directive: &'static str, vs: &[Float], args: &[&str], line: usize) -> Result<ArcSurface, SceneError> {
    if vs.len() >= SURFACE_VALUES {
        return Ok(Arc::new(UniformSurface::from_scene_values(
            Color::new(vs[4], vs[5], vs[6]),
            vs[7],
            vs[8],
        )));
    }

    if vs.len() >= NAMED_SURFACE_VALUES {
        if let Some(surface) = args.iter().find_map(|t| named_surface(t)) {
            return Ok(surface);
        }
    }

    Err(SceneError::MissingValues {
        directive,
        expected: SURFACE_VALUES,
        found: vs.len(),
        line,
    })
}

fn read_sphere(args: &[&str], line: usize) -> Result<ArcShape, SceneError> {
    let vs = numbers(args);
    let surface = read_surface("sphere", &vs, args, line)?;
    Ok(Arc::new(Sphere::new(Vector3f::new(vs[0], vs[1], vs[2]), vs[3], surface)))
}

fn read_plane(args: &[&str], line: usize) -> Result<ArcShape, SceneError> {
    let vs = numbers(args);
    let surface = read_surface("plane", &vs, args, line)?;
    Ok(Arc::new(Plane::new(Vector3f::new(vs[0], vs[1], vs[2]), vs[3], surface)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Option<Directive> {
        Directive::parse(line, 1).expect("valid directive")
    }

    #[test]
    fn skips_comments_blank_and_unknown() {
        assert!(parse("").is_none());
        assert!(parse("   \t ").is_none());
        assert!(parse("# sphere 0 0 0 1").is_none());
        assert!(parse("#comment").is_none());
        assert!(parse("triangle 0 0 0").is_none());
    }

    #[test]
    fn camera() {
        match parse("camera 3 2 4 -1 0.5 0") {
            Some(Directive::Camera(c)) => assert_eq!(c, Camera::default()),
            _ => panic!("expected camera"),
        }
    }

    #[test]
    fn view_with_tabs() {
        match parse("view\t320\t200") {
            Some(Directive::View(v)) => assert_eq!(v, View::new(320, 200)),
            _ => panic!("expected view"),
        }
    }

    #[test]
    fn view_rejects_zero_and_negative() {
        assert!(matches!(
            Directive::parse("view 0 10", 3),
            Err(SceneError::InvalidNumber { line: 3, .. })
        ));
        assert!(matches!(
            Directive::parse("view 10 -2", 3),
            Err(SceneError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn light_is_normalized() {
        match parse("light 0 5 0 4 2 1") {
            Some(Directive::Light(l)) => {
                assert_eq!(l.pos, Vector3f::new(0.0, 5.0, 0.0));
                assert_eq!(l.color, Color::new(1.0, 0.5, 0.25));
            }
            _ => panic!("expected light"),
        }
    }

    #[test]
    fn sphere_skips_non_numeric_tokens() {
        match parse("sphere at 0 1 0 radius 1 color 1 0 0 0.5 0.25") {
            Some(Directive::Shape(s)) => {
                assert_eq!(s.get_type(), "sphere");
                let p = Vector3f::new(0.0, 1.0, 0.0);
                assert_eq!(s.surface().diffuse(&p), Color::new(1.0, 0.0, 0.0));
                assert_eq!(s.surface().reflect(&p), 0.5);
                assert_eq!(s.surface().roughness(), 50.0);
            }
            _ => panic!("expected sphere"),
        }
    }

    #[test]
    fn named_material() {
        match parse("plane 0 1 0 0 checkerboard") {
            Some(Directive::Shape(s)) => {
                assert_eq!(s.get_type(), "plane");
                assert_eq!(s.surface().roughness(), 150.0);
            }
            _ => panic!("expected plane"),
        }
    }

    #[test]
    fn missing_values_are_fatal() {
        match Directive::parse("sphere 0 1 0 1 1 0 0", 7) {
            Err(SceneError::MissingValues {
                directive,
                expected,
                found,
                line,
            }) => {
                assert_eq!(directive, "sphere");
                assert_eq!(expected, 9);
                assert_eq!(found, 7);
                assert_eq!(line, 7);
            }
            _ => panic!("expected missing values"),
        }
        assert!(Directive::parse("light 1 2 3", 1).is_err());
        assert!(Directive::parse("camera 1 2 3 4 5", 1).is_err());
        assert!(Directive::parse("view 100", 1).is_err());
        assert!(Directive::parse("plane 0 1 0 marble", 1).is_err());
        assert!(Directive::parse("sphere 0 1 0 unknown", 1).is_err());
    }

    #[test]
    fn builder_replaces_camera_and_view() {
        let mut builder = SceneBuilder::default();
        builder.apply(Directive::View(View::new(10, 10)));
        builder.apply(Directive::View(View::new(20, 5)));
        builder.apply(Directive::Light(Light::new(Vector3f::zero(), WHITE)));
        builder.apply(Directive::Light(Light::new(Vector3f::zero(), BLACK)));
        let scene = builder.build();
        assert_eq!(scene.view, View::new(20, 5));
        assert_eq!(scene.lights.len(), 2);
        assert_eq!(scene.camera, Camera::default());
    }
}
