//! Byte payloads exchanged with the executor.
//!
//! Pixel payload: `u64` pixel count, then `red, green, blue` as `f64` per
//! pixel in buffer order. Region payload: `x0, x1, y0, y1` as `u32`. All
//! values little-endian.

use std::sync::Arc;

use log::trace;

use crate::error::{RenderError, RenderResult};
use crate::raytracing::camera::{Camera, CameraSettings, Region};
use crate::raytracing::core::Scene;
use crate::raytracing::Rgb;

use super::fragment::{Fragment, TileOptions};
use super::tile::{FragmentId, TileId, TileImage};

struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take<const N: usize>(&mut self) -> RenderResult<[u8; N]> {
        if self.bytes.len() < N {
            return Err(RenderError::Codec(format!(
                "expected {} more bytes, {} left",
                N,
                self.bytes.len()
            )));
        }
        let (head, rest) = self.bytes.split_at(N);
        self.bytes = rest;
        let mut out = [0u8; N];
        out.copy_from_slice(head);
        Ok(out)
    }

    fn u64(&mut self) -> RenderResult<u64> {
        Ok(u64::from_le_bytes(self.take()?))
    }

    fn u32(&mut self) -> RenderResult<u32> {
        Ok(u32::from_le_bytes(self.take()?))
    }

    fn f64(&mut self) -> RenderResult<f64> {
        Ok(f64::from_le_bytes(self.take()?))
    }

    fn finish(self) -> RenderResult<()> {
        if self.bytes.is_empty() {
            Ok(())
        } else {
            Err(RenderError::Codec(format!(
                "{} trailing bytes",
                self.bytes.len()
            )))
        }
    }
}

pub fn encode_pixels(pixels: &[Rgb], out: &mut Vec<u8>) {
    out.reserve(8 + pixels.len() * 24);
    out.extend_from_slice(&(pixels.len() as u64).to_le_bytes());
    for pixel in pixels {
        out.extend_from_slice(&pixel.red.to_le_bytes());
        out.extend_from_slice(&pixel.green.to_le_bytes());
        out.extend_from_slice(&pixel.blue.to_le_bytes());
    }
}

pub fn decode_pixels(bytes: &[u8]) -> RenderResult<Vec<Rgb>> {
    let mut reader = Reader { bytes };
    let count = reader.u64()? as usize;
    if reader.bytes.len() / 24 < count {
        return Err(RenderError::Codec(format!(
            "payload announces {} pixels but holds {} bytes",
            count,
            reader.bytes.len()
        )));
    }
    let mut pixels = Vec::with_capacity(count);
    for _ in 0..count {
        let red = reader.f64()?;
        let green = reader.f64()?;
        let blue = reader.f64()?;
        pixels.push(Rgb::new(red, green, blue));
    }
    reader.finish()?;
    Ok(pixels)
}

pub fn encode_region(region: Region, out: &mut Vec<u8>) -> RenderResult<()> {
    for value in [region.x0, region.x1, region.y0, region.y1] {
        let value = u32::try_from(value)
            .map_err(|_| RenderError::Codec(format!("coordinate {} does not fit u32", value)))?;
        out.extend_from_slice(&value.to_le_bytes());
    }
    Ok(())
}

pub fn decode_region(bytes: &[u8]) -> RenderResult<Region> {
    let mut reader = Reader { bytes };
    let x0 = reader.u32()? as usize;
    let x1 = reader.u32()? as usize;
    let y0 = reader.u32()? as usize;
    let y1 = reader.u32()? as usize;
    reader.finish()?;
    Ok(Region::new(x0, x1, y0, y1))
}

/// Serialization hooks and placeholder factory the executor calls back into.
///
/// Holds what a remote node needs to rebuild a fragment from a payload: the
/// shared camera settings, the scene, and the tile options.
#[derive(Clone)]
pub struct FragmentTools {
    settings: CameraSettings,
    scene: Arc<Scene>,
    options: TileOptions,
}

impl FragmentTools {
    pub fn new(settings: CameraSettings, scene: Arc<Scene>, options: TileOptions) -> FragmentTools {
        FragmentTools {
            settings,
            scene,
            options,
        }
    }

    pub fn create_gap(&self, id: FragmentId) -> Fragment {
        Fragment::gap(id)
    }

    /// Pixel payload of a reported fragment.
    pub fn serialize_boundary(&self, fragment: &Fragment, out: &mut Vec<u8>) -> RenderResult<()> {
        let image = fragment
            .result()
            .ok_or(RenderError::NotReported(fragment.id()))?;
        encode_pixels(image.pixels(), out);
        trace!("{} serialized into {} bytes", fragment.id(), out.len());
        Ok(())
    }

    /// Rebuild a reported fragment from its pixel payload.
    pub fn deserialize_boundary(&self, id: FragmentId, bytes: &[u8]) -> RenderResult<Fragment> {
        let pixels = decode_pixels(bytes)?;
        let width = self.options.result_width(self.settings.width);
        if width == 0 || pixels.len() % width != 0 {
            return Err(RenderError::Codec(format!(
                "{} pixels are not whole rows of {}",
                pixels.len(),
                width
            )));
        }
        let image = TileImage::new(width, pixels.len() / width, pixels)?;
        let mut fragment = self.create_gap(id);
        fragment.restore(image)?;
        Ok(fragment)
    }

    /// Region payload of a tile that has not run yet.
    pub fn serialize_fragment(&self, fragment: &Fragment, out: &mut Vec<u8>) -> RenderResult<()> {
        let region = fragment.region().ok_or(RenderError::Unbound(fragment.id()))?;
        encode_region(region, out)
    }

    /// Rebuild a runnable tile from its region payload.
    pub fn deserialize_fragment(&self, id: TileId, bytes: &[u8]) -> RenderResult<Fragment> {
        let region = decode_region(bytes)?;
        let camera = Camera::new(self.settings, self.scene.clone(), region)?;
        Ok(Fragment::tile(id, camera, self.options))
    }
}
