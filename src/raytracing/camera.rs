use std::sync::Arc;

use crate::error::{RenderError, RenderResult};

use super::core::Scene;
use super::{Ray, Rgb, Vec3};

/// Pixel rectangle `[x0, x1) x [y0, y1)` of the full image.
///
/// Buffers covering a region are row-major by output row: pixel `(x, y)`
/// lives at `(y - y0) * width + (x - x0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x0: usize,
    pub x1: usize,
    pub y0: usize,
    pub y1: usize,
}

impl Region {
    pub fn new(x0: usize, x1: usize, y0: usize, y1: usize) -> Region {
        Region { x0, x1, y0, y1 }
    }

    /// Full-width band of rows `[begin, end)`.
    pub fn rows(width: usize, begin: usize, end: usize) -> Region {
        Region::new(0, width, begin, end)
    }

    pub fn width(&self) -> usize {
        self.x1 - self.x0
    }

    pub fn height(&self) -> usize {
        self.y1 - self.y0
    }

    pub fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    pub fn index_of(&self, x: usize, y: usize) -> usize {
        (y - self.y0) * self.width() + (x - self.x0)
    }
}

/// Static camera description shared by every fragment of a render.
///
/// The camera always looks down +y; the image plane spans x horizontally and
/// z vertically. Its extent is the background size scaled down to the image
/// plane distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraSettings {
    pub viewpoint: Vec3,
    pub background_size_x: f64,
    pub background_size_z: f64,
    pub background_distance: f64,
    pub image_plane_distance: f64,
    pub width: usize,
    pub height: usize,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            viewpoint: Vec3::zero(),
            background_size_x: 4.0,
            background_size_z: 4.0,
            background_distance: 15.0,
            image_plane_distance: 5.0,
            width: 100,
            height: 100,
        }
    }
}

impl CameraSettings {
    pub fn with_resolution(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_viewpoint(mut self, viewpoint: Vec3) -> Self {
        self.viewpoint = viewpoint;
        self
    }

    pub fn image_plane_size_x(&self) -> f64 {
        self.background_size_x * self.image_plane_distance / self.background_distance
    }

    pub fn image_plane_size_z(&self) -> f64 {
        self.background_size_z * self.image_plane_distance / self.background_distance
    }

    pub fn full_region(&self) -> Region {
        Region::new(0, self.width, 0, self.height)
    }

    pub fn validate(&self) -> RenderResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidCamera(format!(
                "resolution {}x{} is empty",
                self.width, self.height
            )));
        }
        if !(self.background_distance > 0.0) {
            return Err(RenderError::InvalidCamera(
                "background distance must be positive".to_string(),
            ));
        }
        if !(self.image_plane_distance > 0.0) {
            return Err(RenderError::InvalidCamera(
                "image plane distance must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn check_region(&self, region: Region) -> RenderResult<()> {
        if region.x0 < region.x1
            && region.x1 <= self.width
            && region.y0 < region.y1
            && region.y1 <= self.height
        {
            Ok(())
        } else {
            Err(RenderError::InvalidRegion {
                x0: region.x0,
                x1: region.x1,
                y0: region.y0,
                y1: region.y1,
                width: self.width,
                height: self.height,
            })
        }
    }
}

/// Renders one region of the image from the configured viewpoint.
#[derive(Clone)]
pub struct Camera {
    settings: CameraSettings,
    region: Region,
    scene: Arc<Scene>,
}

impl Camera {
    pub fn new(settings: CameraSettings, scene: Arc<Scene>, region: Region) -> RenderResult<Self> {
        settings.validate()?;
        settings.check_region(region)?;
        Ok(Self {
            settings,
            region,
            scene,
        })
    }

    /// Camera covering the whole image.
    pub fn full(settings: CameraSettings, scene: Arc<Scene>) -> RenderResult<Self> {
        Self::new(settings, scene, settings.full_region())
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Ray from the viewpoint through pixel `(x, y)` of the image plane.
    pub fn shoot_to(&self, x: usize, y: usize) -> RenderResult<Ray> {
        let size_x = self.settings.image_plane_size_x();
        let size_z = self.settings.image_plane_size_z();
        let direction = Vec3::new(
            x as f64 * size_x / self.settings.width as f64 - size_x / 2.0,
            self.settings.image_plane_distance,
            y as f64 * size_z / self.settings.height as f64 - size_z / 2.0,
        );
        let direction = direction
            .try_normalize()
            .ok_or(RenderError::DegenerateRay)?;
        Ok(Ray::new(self.settings.viewpoint, direction))
    }

    /// Render the region, row by row, channels capped at 1.
    pub fn run(&self) -> RenderResult<Vec<Rgb>> {
        let mut pixels = Vec::with_capacity(self.region.pixel_count());
        for y in self.region.y0..self.region.y1 {
            for x in self.region.x0..self.region.x1 {
                let ray = self.shoot_to(x, y)?;
                pixels.push(self.scene.color(&ray)?.clamp_high());
            }
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raytracing::core::Light;
    use crate::raytracing::sphere::Sphere;

    fn single_sphere_scene() -> Arc<Scene> {
        let mut scene = Scene::new(1);
        scene.add_object(Sphere::new(Vec3::new(0.0, 7.0, 2.0), 1.0, Rgb::new(1.0, 0.3, 0.3)));
        scene.add_light(Light::new(Vec3::new(-15.0, -15.0, 0.0), Rgb::new(0.5, 0.5, 0.5)));
        Arc::new(scene)
    }

    #[test]
    fn test_region_rejects_out_of_bounds() {
        let settings = CameraSettings::default().with_resolution(10, 10);
        let scene = single_sphere_scene();
        assert!(Camera::new(settings, scene.clone(), Region::new(0, 11, 0, 10)).is_err());
        assert!(Camera::new(settings, scene.clone(), Region::new(0, 10, 4, 4)).is_err());
        assert!(Camera::new(settings, scene, Region::new(2, 5, 0, 10)).is_ok());
    }

    #[test]
    fn test_zero_plane_distance_is_rejected() {
        let mut settings = CameraSettings::default();
        settings.image_plane_distance = 0.0;
        assert!(Camera::full(settings, single_sphere_scene()).is_err());
    }

    #[test]
    fn test_run_is_deterministic() {
        let settings = CameraSettings::default().with_resolution(10, 10);
        let camera = Camera::full(settings, single_sphere_scene()).unwrap();
        let first = camera.run().unwrap();
        let second = camera.run().unwrap();
        assert_eq!(first.len(), 100);
        assert_eq!(first, second);
        assert!(first.iter().all(|p| p.red <= 1.0 && p.green <= 1.0 && p.blue <= 1.0));
    }

    #[test]
    fn test_sub_region_matches_full_render_indexing() {
        let settings = CameraSettings::default()
            .with_resolution(12, 9)
            .with_viewpoint(Vec3::new(0.0, -20.0, 0.0));
        let scene = single_sphere_scene();
        let full_region = settings.full_region();
        let full = Camera::full(settings, scene.clone()).unwrap().run().unwrap();
        let region = Region::new(3, 10, 2, 7);
        let part = Camera::new(settings, scene, region).unwrap().run().unwrap();
        assert_eq!(part.len(), region.pixel_count());
        for y in region.y0..region.y1 {
            for x in region.x0..region.x1 {
                assert_eq!(part[region.index_of(x, y)], full[full_region.index_of(x, y)]);
            }
        }
    }

    #[test]
    fn test_sphere_is_visible_from_demo_viewpoint() {
        let settings = CameraSettings::default()
            .with_resolution(20, 20)
            .with_viewpoint(Vec3::new(0.0, -20.0, 0.0));
        let pixels = Camera::full(settings, single_sphere_scene())
            .unwrap()
            .run()
            .unwrap();
        assert!(pixels.iter().any(|p| *p != Rgb::black()));
        assert!(pixels.iter().any(|p| *p == Rgb::black()));
    }
}
