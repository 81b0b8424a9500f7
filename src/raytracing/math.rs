pub mod color;
pub mod ray;
pub mod vec3;

pub use color::*;
pub use ray::*;
pub use vec3::*;
