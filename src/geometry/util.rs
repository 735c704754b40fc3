//! Geometric utility functions: element measures and structured grid generation.

pub mod grid_generation;
pub mod measures;

pub use grid_generation::*;
pub use measures::*;
