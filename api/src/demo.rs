//! Demo scene

/// Scene text of the built-in demo scene.
pub const DEMO_SCENE: &str = "\
# Checkerboard floor with two shiny spheres and four coloured lights.
camera 3 2 4 -1 0.5 0
view 600 600
plane 0 1 0 0 checkerboard
sphere 0 1 0 1 shiny
sphere -1 0.5 1.5 0.5 shiny
light -2 2.5 0 0.49 0.07 0.07
light 1.5 2.5 1.5 0.07 0.07 0.49
light 1.5 2.5 -1.5 0.07 0.49 0.071
light 0 3.5 0 0.21 0.21 0.35
";

/// Returns the demo scene text as lines.
pub fn demo_scene_lines() -> Vec<String> {
    DEMO_SCENE.lines().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::*;
    use rayfarm_core::camera::*;
    use rayfarm_core::geometry::*;
    use rayfarm_core::light::*;
    use rayfarm_core::spectrum::*;

    #[test]
    fn demo_scene_parses() {
        let scene = parse_scene(demo_scene_lines().iter().map(String::as_str)).expect("valid demo scene");

        assert_eq!(scene.camera, Camera::default());
        assert_eq!(scene.view, View::default());
        assert_eq!(
            scene.lights.first(),
            Some(&Light::new(Vector3f::new(-2.0, 2.5, 0.0), Color::new(0.49, 0.07, 0.07)))
        );
        assert_eq!(scene.lights.len(), 4);

        let types: Vec<_> = scene.shapes.iter().map(|s| s.get_type()).collect();
        assert_eq!(types, vec!["plane", "sphere", "sphere"]);
    }

    #[test]
    fn lines() {
        let lines = demo_scene_lines();
        assert_eq!(lines.len(), 10);
        assert!(lines.iter().all(|l| !l.contains('~')));
    }
}
