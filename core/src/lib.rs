//! Core

#[macro_use]
extern crate hexf;
#[macro_use]
extern crate log;

// Re-export.
pub mod app;
pub mod camera;
pub mod film;
pub mod geometry;
pub mod image_io;
pub mod light;
pub mod material;
pub mod pbrt;
pub mod rng;
pub mod scene;
pub mod spectrum;
