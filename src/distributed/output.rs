//! Where finished images go.

use std::path::PathBuf;
use std::sync::Mutex;

use image::{ImageBuffer, Rgb};
use log::info;

use crate::error::{RenderError, RenderResult};

use super::tile::TileImage;

/// Destination for partial and merged images. Tiles may write concurrently.
pub trait ImageSink: Send + Sync {
    fn write(&self, name: &str, image: &TileImage) -> RenderResult<()>;
}

/// Writes 8-bit bitmaps into a directory.
pub struct BitmapSink {
    directory: PathBuf,
}

impl BitmapSink {
    pub fn new(directory: impl Into<PathBuf>) -> BitmapSink {
        BitmapSink {
            directory: directory.into(),
        }
    }
}

impl ImageSink for BitmapSink {
    fn write(&self, name: &str, image: &TileImage) -> RenderResult<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(RenderError::EmptyImage(name.to_string()));
        }
        let buffer: ImageBuffer<Rgb<u8>, Vec<_>> =
            ImageBuffer::from_fn(image.width() as u32, image.height() as u32, |x, y| {
                image.pixel(x as usize, y as usize).into()
            });
        let path = self.directory.join(name);
        buffer.save(&path)?;
        info!("saved {}", path.display());
        Ok(())
    }
}

/// Discards everything.
pub struct NullSink;

impl ImageSink for NullSink {
    fn write(&self, _name: &str, _image: &TileImage) -> RenderResult<()> {
        Ok(())
    }
}

/// Keeps written images in memory, in write order.
#[derive(Default)]
pub struct MemorySink {
    images: Mutex<Vec<(String, TileImage)>>,
}

impl MemorySink {
    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<TileImage> {
        self.lock()
            .iter()
            .find(|(written, _)| written == name)
            .map(|(_, image)| image.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(String, TileImage)>> {
        // a panicking writer cannot leave the vector half-updated
        self.images.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ImageSink for MemorySink {
    fn write(&self, name: &str, image: &TileImage) -> RenderResult<()> {
        self.lock().push((name.to_string(), image.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracing::Rgb as Color;

    #[test]
    fn test_bitmap_round_trip() {
        let directory = std::env::temp_dir().join(format!("bitmap-sink-{}", std::process::id()));
        std::fs::create_dir_all(&directory).unwrap();
        let pixels = vec![
            Color::new(1.0, 0.0, 0.0),
            Color::new(0.0, 2.0, 0.0),
            Color::new(0.0, 0.0, 0.5),
            Color::new(0.1, 0.1, 0.1),
        ];
        let image = TileImage::new(2, 2, pixels).unwrap();
        BitmapSink::new(&directory).write("tile.bmp", &image).unwrap();

        let loaded = image::open(directory.join("tile.bmp")).unwrap().to_rgb8();
        assert_eq!(loaded.dimensions(), (2, 2));
        assert_eq!(loaded.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(loaded.get_pixel(1, 0).0, [0, 255, 0]);
        assert_eq!(loaded.get_pixel(0, 1).0, [0, 0, 128]);
        assert_eq!(loaded.get_pixel(1, 1).0, [26, 26, 26]);
        std::fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn test_empty_bitmap_is_an_error() {
        let directory = std::env::temp_dir().join(format!("bitmap-empty-{}", std::process::id()));
        std::fs::create_dir_all(&directory).unwrap();
        let image = TileImage::new(4, 0, Vec::new()).unwrap();
        assert!(matches!(
            BitmapSink::new(&directory).write("empty.bmp", &image),
            Err(RenderError::EmptyImage(_))
        ));
        assert!(!directory.join("empty.bmp").exists());
        std::fs::remove_dir_all(&directory).unwrap();
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::default();
        let image = TileImage::new(1, 1, vec![Color::black()]).unwrap();
        sink.write("b", &image).unwrap();
        sink.write("a", &image).unwrap();
        assert_eq!(sink.names(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(sink.get("a"), Some(image));
    }
}
