//! Scene parser

mod common;

use crate::SceneError;
use rayfarm_core::scene::*;
use std::fs;

pub use common::*;

/// Parse scene text into a `Scene`. The first malformed directive aborts.
///
/// * `lines` - Scene text, one directive per line.
pub fn parse_scene<'a, I>(lines: I) -> Result<Scene, SceneError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut builder = SceneBuilder::default();
    for (i, line) in lines.into_iter().enumerate() {
        if let Some(directive) = Directive::parse(line, i + 1)? {
            builder.apply(directive);
        }
    }

    let scene = builder.build();
    debug!(
        "Parsed scene with {} shapes and {} lights at {}x{}",
        scene.shapes.len(),
        scene.lights.len(),
        scene.view.width,
        scene.view.height
    );
    Ok(scene)
}

/// Reads a scene file and returns its lines.
///
/// * `path` - Scene file path.
pub fn read_scene_lines(path: &str) -> Result<Vec<String>, SceneError> {
    info!("Reading scene file {path}");
    let text = fs::read_to_string(path)?;
    Ok(text.lines().map(String::from).collect())
}

/// Reads and parses a scene file. Returns the lines alongside the scene so
/// they can be shipped to workers verbatim.
///
/// * `path` - Scene file path.
pub fn parse_file(path: &str) -> Result<(Vec<String>, Scene), SceneError> {
    let lines = read_scene_lines(path)?;
    let scene = parse_scene(lines.iter().map(String::as_str))?;
    Ok((lines, scene))
}
