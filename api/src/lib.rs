//! The API

#[macro_use]
extern crate log;

mod demo;
mod error;

pub mod parser;

pub use demo::*;
pub use error::*;
