//! Sphere ray tracer whose image is split into row bands, rendered as
//! independent fragments on any number of nodes, and merged back in order.

pub mod distributed;
pub mod error;
pub mod logger;
pub mod raytracing;

pub use error::{RenderError, RenderResult};
