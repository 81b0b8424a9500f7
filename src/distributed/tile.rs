//! Identities of work units and the pixel buffers they produce.

use std::fmt;

use crate::error::{RenderError, RenderResult};
use crate::raytracing::Rgb;

/// Identity of an ordinary tile: the node it belongs to and its position
/// among that node's tiles (ascending row order).
///
/// Ordering is by node, then index, which is also top-to-bottom image order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TileId {
    pub node: usize,
    pub index: usize,
}

impl TileId {
    pub fn new(node: usize, index: usize) -> TileId {
        TileId { node, index }
    }

    /// File name for the partial bitmap written by this tile.
    pub fn artifact_name(&self) -> String {
        format!("{}.{}.0.bmp", self.node, self.index)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.node, self.index)
    }
}

/// Identity of any fragment. The merge unit is its own variant rather than a
/// reserved tile number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentId {
    Tile(TileId),
    Boundary,
}

impl From<TileId> for FragmentId {
    fn from(value: TileId) -> Self {
        FragmentId::Tile(value)
    }
}

impl fmt::Display for FragmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FragmentId::Tile(id) => write!(f, "tile {}", id),
            FragmentId::Boundary => write!(f, "boundary"),
        }
    }
}

/// Dense row-major pixel buffer: pixel `(x, y)` is at `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl TileImage {
    pub fn new(width: usize, height: usize, pixels: Vec<Rgb>) -> RenderResult<TileImage> {
        if pixels.len() != width * height {
            return Err(RenderError::Codec(format!(
                "{} pixels do not fill a {}x{} image",
                pixels.len(),
                width,
                height
            )));
        }
        Ok(TileImage {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    pub fn into_pixels(self) -> Vec<Rgb> {
        self.pixels
    }
}
