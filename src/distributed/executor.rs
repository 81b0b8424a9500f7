//! Scheduling fragments across nodes.
//!
//! [`RenderJob::plan`] is what every node runs against the real executor:
//! it builds that node's tiles, and on node 0 the boundary fragment.
//! [`LocalCluster`] plays the executor for all nodes inside one process.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, info};
use rayon::prelude::*;

use crate::error::{RenderError, RenderResult};
use crate::raytracing::camera::{Camera, CameraSettings, Region};
use crate::raytracing::core::Scene;

use super::codec::FragmentTools;
use super::fragment::{Fragment, TileOptions};
use super::output::ImageSink;
use super::partition::{fan_out, sub_ranges};
use super::reduce::{ReduceData, ReduceDataTools};
use super::tile::{FragmentId, TileId, TileImage};

/// Default name of the merged bitmap.
pub const DEFAULT_ARTIFACT: &str = "result.bmp";

/// What the distributed runtime tells a node about its place in the cluster.
pub trait Executor {
    fn node_count(&self) -> usize;
    fn node_index(&self) -> usize;
}

/// One render, split over the cluster.
#[derive(Clone)]
pub struct RenderJob {
    pub camera: CameraSettings,
    pub scene: Arc<Scene>,
    pub fragments_per_node: usize,
    pub options: TileOptions,
    pub artifact: String,
}

/// Fragments a single node registers with the executor.
pub struct NodePlan {
    pub tiles: Vec<Fragment>,
    /// Only node 0 owns the boundary fragment.
    pub boundary: Option<Fragment>,
}

impl RenderJob {
    pub fn new(camera: CameraSettings, scene: Arc<Scene>) -> RenderJob {
        RenderJob {
            camera,
            scene,
            fragments_per_node: 1,
            options: TileOptions::default(),
            artifact: DEFAULT_ARTIFACT.to_string(),
        }
    }

    pub fn tools(&self) -> FragmentTools {
        FragmentTools::new(self.camera, self.scene.clone(), self.options)
    }

    pub fn plan(&self, executor: &impl Executor) -> RenderResult<NodePlan> {
        self.camera.validate()?;
        let node_count = executor.node_count();
        let node = executor.node_index();
        let ranges = sub_ranges(node_count, node, self.camera.height, self.fragments_per_node)?;

        let mut tiles = Vec::with_capacity(ranges.len());
        for (index, rows) in ranges.into_iter().enumerate() {
            self.options.check_rows(self.camera.width, rows.len())?;
            let region = Region::rows(self.camera.width, rows.start, rows.end);
            let camera = Camera::new(self.camera, self.scene.clone(), region)?;
            tiles.push(Fragment::tile(TileId::new(node, index), camera, self.options));
        }

        let boundary = if node == 0 {
            let dependencies = fan_out(node_count, self.camera.height, self.fragments_per_node)?;
            Some(Fragment::boundary(dependencies, self.artifact.clone()))
        } else {
            None
        };
        debug!("node {} planned {} tiles", node, tiles.len());
        Ok(NodePlan { tiles, boundary })
    }
}

struct LocalNode {
    index: usize,
    count: usize,
}

impl Executor for LocalNode {
    fn node_count(&self) -> usize {
        self.count
    }

    fn node_index(&self) -> usize {
        self.index
    }
}

/// In-process stand-in for the distributed runtime.
///
/// Every fragment still crosses the same serialization hooks a remote node
/// would use: tiles are shipped to the worker pool as region payloads and
/// their results come back to node 0 as pixel payloads.
pub struct LocalCluster {
    node_count: usize,
}

impl LocalCluster {
    pub fn new(node_count: usize) -> RenderResult<LocalCluster> {
        if node_count == 0 {
            return Err(RenderError::InvalidPartition(
                "at least one node is needed".to_string(),
            ));
        }
        Ok(LocalCluster { node_count })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Render the job and return the merged image written by the boundary
    /// fragment.
    pub fn run(&self, job: &RenderJob, sink: &dyn ImageSink) -> RenderResult<TileImage> {
        let start = Instant::now();
        let tools = job.tools();

        let mut boundary = None;
        let mut tiles = Vec::new();
        for index in 0..self.node_count {
            let node = LocalNode {
                index,
                count: self.node_count,
            };
            let plan = job.plan(&node)?;
            boundary = boundary.or(plan.boundary);
            for tile in plan.tiles {
                tiles.push(ship_unrun(&tools, tile)?);
            }
        }
        let mut boundary =
            boundary.ok_or_else(|| RenderError::InvalidPartition("no boundary fragment".to_string()))?;
        info!(
            "rendering {}x{} over {} nodes, {} tiles",
            job.camera.width,
            job.camera.height,
            self.node_count,
            tiles.len()
        );

        // fragments run in parallel, each one single-threaded
        tiles
            .par_iter_mut()
            .try_for_each(|tile| tile.run_step(&[], sink))?;

        let reducer = ReduceDataTools;
        let reduced = tiles
            .iter()
            .map(Fragment::reduce)
            .fold(ReduceData, |left, right| reducer.reduce(left, right));

        let peers = tiles
            .iter()
            .map(|tile| ship_result(&tools, tile))
            .collect::<RenderResult<Vec<_>>>()?;

        // join barrier: every dependency has reported by now
        boundary.run_step(&peers, sink)?;
        boundary.reduce_step(reduced);
        info!("render finished in {:?}", start.elapsed());
        boundary.into_result()
    }
}

fn ship_unrun(tools: &FragmentTools, tile: Fragment) -> RenderResult<Fragment> {
    let FragmentId::Tile(id) = tile.id() else {
        return Ok(tile);
    };
    let mut bytes = Vec::new();
    tools.serialize_fragment(&tile, &mut bytes)?;
    tools.deserialize_fragment(id, &bytes)
}

fn ship_result(tools: &FragmentTools, tile: &Fragment) -> RenderResult<Fragment> {
    let copy = tile.boundary_copy()?;
    let mut bytes = Vec::new();
    tools.serialize_boundary(&copy, &mut bytes)?;
    tools.deserialize_boundary(copy.id(), &bytes)
}
