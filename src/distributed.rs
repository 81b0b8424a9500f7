pub mod codec;
pub mod downsample;
pub mod executor;
pub mod fragment;
pub mod output;
pub mod partition;
pub mod reduce;
pub mod tile;

pub use fragment::{Fragment, FragmentState, TileOptions};
pub use tile::{FragmentId, TileId, TileImage};
