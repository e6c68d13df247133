//! Spritely Core
//!
//! Math, geometry, transforms and process setup shared by the Spritely crates.

pub mod collections;
pub mod config;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;
pub mod transform;

pub use config::{BenchmarkMode, Config};
pub use transform::Transform2D;

/// Apply `config`: install logging and start profiling if requested.
pub fn init(config: &Config) {
    config.apply();
}
