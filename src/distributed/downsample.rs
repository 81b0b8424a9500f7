//! Coarse preview of a rendered tile.

use log::warn;

use crate::error::{RenderError, RenderResult};
use crate::raytracing::Rgb;

use super::tile::TileImage;

/// Shrink `source` to `target_width` columns with square cells of
/// `delta = width / target_width` pixels.
///
/// Each output pixel starts from the source pixel nearest its cell center and
/// folds in the rest of the `delta x delta` neighborhood one pixel at a time
/// with [`Rgb::realmix`], scanning rows top to bottom. Successive halving
/// weights later pixels less than earlier ones, so this is only close to a
/// box average; previews depend on that exact weighting.
pub fn downsample(source: &TileImage, target_width: usize) -> RenderResult<TileImage> {
    let width = source.width();
    let height = source.height();
    if target_width == 0 || target_width > width {
        return Err(RenderError::InvalidPreview {
            width: target_width,
            source_width: width,
        });
    }

    let delta = width / target_width;
    let target_height = height / delta;
    if target_height == 0 {
        return Err(RenderError::PreviewTooCoarse {
            height,
            cell: delta,
        });
    }
    if height % delta != 0 {
        warn!(
            "dropping the last {} rows of a {}x{} tile from the preview",
            height % delta,
            width,
            height
        );
    }

    let half = (delta / 2) as isize;
    let mut pixels = Vec::with_capacity(target_width * target_height);
    for ty in 0..target_height {
        for tx in 0..target_width {
            let cx = (tx * delta + delta / 2) as isize;
            let cy = (ty * delta + delta / 2) as isize;
            let mut color = source.pixel(cx as usize, cy as usize);
            for dy in 0..delta as isize {
                for dx in 0..delta as isize {
                    let sx = cx - half + dx;
                    let sy = cy - half + dy;
                    if (sx, sy) == (cx, cy) {
                        continue;
                    }
                    if sx < 0 || sy < 0 || sx >= width as isize || sy >= height as isize {
                        continue;
                    }
                    color = color.realmix(source.pixel(sx as usize, sy as usize));
                }
            }
            pixels.push(color);
        }
    }
    TileImage::new(target_width, target_height, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: usize, height: usize) -> TileImage {
        let pixels = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| {
                    Rgb::new(x as f64 / width as f64, y as f64 / height as f64, 0.5)
                })
            })
            .collect();
        TileImage::new(width, height, pixels).unwrap()
    }

    #[test]
    fn test_identity_when_target_matches_width() {
        let source = gradient(6, 4);
        assert_eq!(downsample(&source, 6).unwrap(), source);
    }

    #[test]
    fn test_output_size() {
        let preview = downsample(&gradient(10, 7), 5).unwrap();
        assert_eq!(preview.width(), 5);
        // delta = 2, the odd last row is dropped
        assert_eq!(preview.height(), 3);
        assert_eq!(preview.pixels().len(), 15);
    }

    #[test]
    fn test_uniform_tile_stays_uniform() {
        let color = Rgb::new(0.25, 0.5, 0.75);
        let source = TileImage::new(8, 8, vec![color; 64]).unwrap();
        let preview = downsample(&source, 2).unwrap();
        assert!(preview.pixels().iter().all(|p| *p == color));
    }

    #[test]
    fn test_pairwise_halving_order() {
        // one 2x2 cell: center is (1, 1), then (0,0), (1,0), (0,1) fold in
        let a = Rgb::new(1.0, 0.0, 0.0);
        let b = Rgb::new(0.0, 1.0, 0.0);
        let c = Rgb::new(0.0, 0.0, 1.0);
        let d = Rgb::new(1.0, 1.0, 1.0);
        let source = TileImage::new(2, 2, vec![a, b, c, d]).unwrap();
        let preview = downsample(&source, 1).unwrap();
        let expected = d.realmix(a).realmix(b).realmix(c);
        assert_eq!(preview.pixels(), &[expected]);
    }

    #[test]
    fn test_deterministic() {
        let source = gradient(30, 12);
        let first = downsample(&source, 7).unwrap();
        let second = downsample(&source, 7).unwrap();
        let bytes = |image: &TileImage| -> Vec<u64> {
            image
                .pixels()
                .iter()
                .flat_map(|p| [p.red.to_bits(), p.green.to_bits(), p.blue.to_bits()])
                .collect()
        };
        assert_eq!(bytes(&first), bytes(&second));
    }

    #[test]
    fn test_invalid_preview_width() {
        let source = gradient(4, 4);
        assert!(downsample(&source, 0).is_err());
        assert!(downsample(&source, 5).is_err());
    }

    #[test]
    fn test_tile_shorter_than_a_cell_is_rejected() {
        // delta = 10 but only 7 rows
        let source = gradient(20, 7);
        assert!(matches!(
            downsample(&source, 2),
            Err(RenderError::PreviewTooCoarse { height: 7, cell: 10 })
        ));
        assert_eq!(downsample(&gradient(20, 10), 2).unwrap().height(), 1);
    }
}
