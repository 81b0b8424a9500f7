//! Work units handed to the executor.
//!
//! A fragment is either an ordinary tile bound to a [`Camera`] over a band of
//! rows, or the single boundary fragment that waits on every tile and glues
//! their buffers into the final image.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::error::{RenderError, RenderResult};
use crate::raytracing::camera::{Camera, Region};

use super::downsample::downsample;
use super::output::ImageSink;
use super::reduce::ReduceData;
use super::tile::{FragmentId, TileId, TileImage};

/// Lifecycle of a fragment. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentState {
    /// Placeholder known only by identity.
    Created,
    /// Has a camera (tile) or a dependency list (boundary) and can run.
    Bound,
    /// Pixels rendered, not yet post-processed.
    Executed,
    /// Final pixels available.
    Reported,
}

/// What a tile does with its pixels once rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileOptions {
    /// Down-sample every tile to this many columns.
    pub preview_width: Option<usize>,
    /// Write each tile to its own bitmap as well.
    pub save_partial: bool,
}

impl TileOptions {
    /// Width of the buffers tiles report, given the full image width.
    pub fn result_width(&self, image_width: usize) -> usize {
        self.preview_width.unwrap_or(image_width)
    }

    /// Fail before rendering when a band of `rows` rows cannot produce at
    /// least one preview row.
    pub fn check_rows(&self, image_width: usize, rows: usize) -> RenderResult<()> {
        let Some(preview_width) = self.preview_width else {
            return Ok(());
        };
        if preview_width == 0 || preview_width > image_width {
            return Err(RenderError::InvalidPreview {
                width: preview_width,
                source_width: image_width,
            });
        }
        let cell = image_width / preview_width;
        if rows < cell {
            return Err(RenderError::PreviewTooCoarse { height: rows, cell });
        }
        Ok(())
    }
}

enum Work {
    None,
    Tile(Camera),
    Merge {
        dependencies: Vec<TileId>,
        artifact: String,
    },
}

pub struct Fragment {
    id: FragmentId,
    state: FragmentState,
    work: Work,
    options: TileOptions,
    result: Option<TileImage>,
}

impl Fragment {
    /// Empty placeholder, e.g. the target of a deserialization.
    pub fn gap(id: FragmentId) -> Fragment {
        Fragment {
            id,
            state: FragmentState::Created,
            work: Work::None,
            options: TileOptions::default(),
            result: None,
        }
    }

    /// Ordinary tile rendering the camera's region.
    pub fn tile(id: TileId, camera: Camera, options: TileOptions) -> Fragment {
        Fragment {
            id: id.into(),
            state: FragmentState::Bound,
            work: Work::Tile(camera),
            options,
            result: None,
        }
    }

    /// The merge unit. `dependencies` must be in top-to-bottom order, as
    /// produced by [`super::partition::fan_out`].
    pub fn boundary(dependencies: Vec<TileId>, artifact: impl Into<String>) -> Fragment {
        Fragment {
            id: FragmentId::Boundary,
            state: FragmentState::Bound,
            work: Work::Merge {
                dependencies,
                artifact: artifact.into(),
            },
            options: TileOptions::default(),
            result: None,
        }
    }

    pub fn id(&self) -> FragmentId {
        self.id
    }

    pub fn state(&self) -> FragmentState {
        self.state
    }

    pub fn result(&self) -> Option<&TileImage> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> RenderResult<TileImage> {
        self.result.ok_or(RenderError::NotReported(self.id))
    }

    /// Region of a tile that has not run yet.
    pub fn region(&self) -> Option<Region> {
        match &self.work {
            Work::Tile(camera) => Some(camera.region()),
            _ => None,
        }
    }

    /// Tiles the boundary fragment waits on; empty for ordinary tiles.
    pub fn dependencies(&self) -> &[TileId] {
        match &self.work {
            Work::Merge { dependencies, .. } => dependencies,
            _ => &[],
        }
    }

    /// Fill a placeholder with pixels computed elsewhere.
    pub fn restore(&mut self, image: TileImage) -> RenderResult<()> {
        if self.state != FragmentState::Created {
            return Err(RenderError::AlreadyExecuted(self.id));
        }
        self.result = Some(image);
        self.state = FragmentState::Reported;
        Ok(())
    }

    /// Run the fragment once. Tiles ignore `peers`; the boundary fragment
    /// merges them.
    pub fn run_step(&mut self, peers: &[Fragment], sink: &dyn ImageSink) -> RenderResult<()> {
        match self.state {
            FragmentState::Created => return Err(RenderError::Unbound(self.id)),
            FragmentState::Executed | FragmentState::Reported => {
                return Err(RenderError::AlreadyExecuted(self.id))
            }
            FragmentState::Bound => {}
        }

        match &self.work {
            Work::Tile(camera) => {
                // a failed render leaves the camera bound for another attempt
                let image = self.render(camera)?;
                self.work = Work::None;
                self.state = FragmentState::Executed;
                self.report(image, sink)
            }
            Work::Merge {
                dependencies,
                artifact,
            } => {
                let merged = merge(dependencies, peers)?;
                self.state = FragmentState::Executed;
                info!(
                    "merged {} tiles into a {}x{} image",
                    dependencies.len(),
                    merged.width(),
                    merged.height()
                );
                sink.write(artifact, &merged)?;
                self.result = Some(merged);
                self.state = FragmentState::Reported;
                Ok(())
            }
            Work::None => Err(RenderError::Unbound(self.id)),
        }
    }

    fn render(&self, camera: &Camera) -> RenderResult<TileImage> {
        let region = camera.region();
        let pixels = camera.run()?;
        debug!(
            "{} rendered {}x{}",
            self.id,
            region.width(),
            region.height()
        );
        TileImage::new(region.width(), region.height(), pixels)
    }

    fn report(&mut self, mut image: TileImage, sink: &dyn ImageSink) -> RenderResult<()> {
        if let Some(preview_width) = self.options.preview_width {
            image = downsample(&image, preview_width)?;
        }
        if self.options.save_partial {
            if let FragmentId::Tile(id) = self.id {
                sink.write(&id.artifact_name(), &image)?;
            }
        }
        self.result = Some(image);
        self.state = FragmentState::Reported;
        Ok(())
    }

    /// Auxiliary data for the executor's reduction; carries nothing.
    pub fn reduce(&self) -> ReduceData {
        ReduceData
    }

    pub fn reduce_step(&mut self, _data: ReduceData) {}

    /// Lightweight copy holding only the identity and the reported pixels,
    /// the shape shipped to the boundary fragment.
    pub fn boundary_copy(&self) -> RenderResult<Fragment> {
        let image = self
            .result
            .clone()
            .ok_or(RenderError::NotReported(self.id))?;
        let mut copy = Fragment::gap(self.id);
        copy.restore(image)?;
        Ok(copy)
    }
}

/// Stack the reported buffers of `dependencies` top to bottom. Peers that
/// are not dependencies are ignored.
fn merge(dependencies: &[TileId], peers: &[Fragment]) -> RenderResult<TileImage> {
    let peers: BTreeMap<TileId, &Fragment> = peers
        .iter()
        .filter_map(|peer| match peer.id {
            FragmentId::Tile(id) => Some((id, peer)),
            FragmentId::Boundary => None,
        })
        .collect();

    let mut width = None;
    let mut height = 0;
    let mut pixels = Vec::new();
    for id in dependencies {
        let peer = peers.get(id).ok_or(RenderError::MissingDependency(*id))?;
        let image = peer.result().ok_or(RenderError::NotReported(peer.id))?;
        let expected = *width.get_or_insert(image.width());
        if image.width() != expected {
            return Err(RenderError::TileWidthMismatch {
                id: *id,
                expected,
                found: image.width(),
            });
        }
        height += image.height();
        pixels.extend_from_slice(image.pixels());
    }
    TileImage::new(width.unwrap_or(0), height, pixels)
}
