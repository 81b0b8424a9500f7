pub mod camera;
pub mod core;
pub mod math;
pub mod parser;
pub mod sphere;

pub use math::*;
