//! Error type shared by the tracer and the fragment machinery.

use thiserror::Error;

use crate::distributed::{FragmentId, TileId};
use crate::raytracing::parser::ParserError;

/// Errors surfaced to whoever drives the renderer (the executor or the
/// binary). None of them are retried internally.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("degenerate ray: direction has zero length")]
    DegenerateRay,

    #[error("invalid camera: {0}")]
    InvalidCamera(String),

    #[error("invalid region [{x0}, {x1}) x [{y0}, {y1}) for a {width}x{height} image")]
    InvalidRegion {
        x0: usize,
        x1: usize,
        y0: usize,
        y1: usize,
        width: usize,
        height: usize,
    },

    #[error("invalid partition: {0}")]
    InvalidPartition(String),

    #[error("invalid preview width {width} for tiles {source_width} pixels wide")]
    InvalidPreview { width: usize, source_width: usize },

    #[error("a {height}-row tile is shorter than one {cell}-pixel preview cell")]
    PreviewTooCoarse { height: usize, cell: usize },

    #[error("refusing to write empty image {0}")]
    EmptyImage(String),

    #[error("fragment {0} has no camera bound")]
    Unbound(FragmentId),

    #[error("fragment {0} was already executed")]
    AlreadyExecuted(FragmentId),

    #[error("fragment {0} has not reported a result yet")]
    NotReported(FragmentId),

    #[error("merge is missing the result of tile {0}")]
    MissingDependency(TileId),

    #[error("tile {id} is {found} pixels wide, expected {expected}")]
    TileWidthMismatch {
        id: TileId,
        expected: usize,
        found: usize,
    },

    #[error("malformed payload: {0}")]
    Codec(String),

    #[error("scene file error: {0}")]
    Parse(#[from] ParserError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

pub type RenderResult<T> = Result<T, RenderError>;
