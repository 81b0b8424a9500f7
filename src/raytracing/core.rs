use crate::error::{RenderError, RenderResult};

use super::{Ray, Rgb, Vec3};

/// Ambient light added to every lit surface, before the object color.
const AMBIENT: Rgb = Rgb {
    red: 0.1,
    green: 0.1,
    blue: 0.1,
};

/// Anything a ray can hit.
///
/// Objects are shared read-only between the fragments rendering on the same
/// node, hence the `Send + Sync` bound.
pub trait SceneObject: Send + Sync {
    /// Nearest hit point in front of the ray origin, if any.
    fn intersect(&self, ray: &Ray) -> Option<Vec3>;
    /// Point the surface normal is measured from (the center for a sphere).
    fn anchor(&self) -> Vec3;
    fn color(&self) -> Rgb;
}

#[derive(Debug, Clone, Copy)]
pub struct Light {
    pub position: Vec3,
    pub color: Rgb,
}

impl Light {
    pub fn new(position: Vec3, color: Rgb) -> Light {
        Light { position, color }
    }
}

pub struct Hit<'a> {
    pub object: &'a dyn SceneObject,
    pub point: Vec3,
}

pub struct Scene {
    objects: Vec<Box<dyn SceneObject>>,
    lights: Vec<Light>,
    iterations: u32,
}

impl Scene {
    /// Empty scene whose reflections recurse at most `iterations` times.
    pub fn new(iterations: u32) -> Scene {
        Scene {
            objects: Vec::new(),
            lights: Vec::new(),
            iterations,
        }
    }

    pub fn add_object(&mut self, object: impl SceneObject + 'static) {
        self.objects.push(Box::new(object));
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn objects(&self) -> &[Box<dyn SceneObject>] {
        &self.objects
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: u32) {
        self.iterations = iterations;
    }

    /// Closest object along the ray. On equal distances the object added
    /// first wins.
    pub fn intersect(&self, ray: &Ray) -> Option<Hit<'_>> {
        let mut closest_distance = f64::INFINITY;
        let mut closest = None;
        for object in &self.objects {
            if let Some(point) = object.intersect(ray) {
                let distance = point.squared_distance(ray.origin);
                if distance < closest_distance {
                    closest_distance = distance;
                    closest = Some(Hit {
                        object: object.as_ref(),
                        point,
                    });
                }
            }
        }
        closest
    }

    /// Color seen along `ray` from a viewpoint.
    pub fn color(&self, ray: &Ray) -> RenderResult<Rgb> {
        self.illumination(ray, 0)
    }

    /// Whitted-style shading: shadowed point lights, an ambient term, and a
    /// mirror bounce while `depth` has not reached the scene's iteration
    /// limit. The result is not clamped.
    pub fn illumination(&self, ray: &Ray, depth: u32) -> RenderResult<Rgb> {
        let Some(hit) = self.intersect(ray) else {
            return Ok(Rgb::black());
        };
        let point = hit.point;
        let object_color = hit.object.color();
        let normal = (point - hit.object.anchor()).normalize();
        let reflected = ray.direction.reflect(normal);

        let mut color = Rgb::black();
        for light in &self.lights {
            let to_light = light.position - point;
            let light_direction = to_light
                .try_normalize()
                .ok_or(RenderError::DegenerateRay)?;
            let light_distance = to_light.squared_len();

            let shadow_ray = Ray::new(point, light_direction);
            if let Some(obstacle) = self.intersect(&shadow_ray) {
                if obstacle.point.squared_distance(point) < light_distance {
                    continue;
                }
            }

            let cosine = reflected.dot(light_direction).max(0.0);
            color += light.color.mix(object_color.coef(cosine));
        }
        color += AMBIENT.mix(object_color);

        if depth < self.iterations {
            let bounce = Ray::new(point, reflected.normalize());
            let reflection = self.illumination(&bounce, depth + 1)?;
            color += reflection.mix(object_color);
        }

        Ok(color)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::raytracing::sphere::Sphere;

    fn assert_rgb_eq(a: Rgb, b: Rgb) {
        assert!(
            (a.red - b.red).abs() < 1e-12
                && (a.green - b.green).abs() < 1e-12
                && (a.blue - b.blue).abs() < 1e-12,
            "{:?} != {:?}",
            a,
            b
        );
    }

    /// Wraps a sphere and counts how many times the scene asks it for a hit.
    struct CountingSphere {
        sphere: Sphere,
        calls: Arc<AtomicUsize>,
    }

    impl SceneObject for CountingSphere {
        fn intersect(&self, ray: &Ray) -> Option<Vec3> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sphere.intersect(ray)
        }

        fn anchor(&self) -> Vec3 {
            self.sphere.anchor()
        }

        fn color(&self) -> Rgb {
            self.sphere.color()
        }
    }

    #[test]
    fn test_miss_is_black() {
        let mut scene = Scene::new(3);
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, Rgb::new(1.0, 1.0, 1.0)));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, -1.0, 0.0));
        assert!(scene.intersect(&ray).is_none());
        assert_eq!(scene.color(&ray).unwrap(), Rgb::black());
    }

    #[test]
    fn test_nearest_object_wins() {
        let mut scene = Scene::new(0);
        scene.add_object(Sphere::new(Vec3::new(0.0, 10.0, 0.0), 1.0, Rgb::new(0.0, 0.0, 1.0)));
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, Rgb::new(1.0, 0.0, 0.0)));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        let hit = scene.intersect(&ray).unwrap();
        assert_eq!(hit.object.color(), Rgb::new(1.0, 0.0, 0.0));
        assert!((hit.point.y - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_equal_distance_keeps_first_object() {
        let mut scene = Scene::new(0);
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, Rgb::new(0.0, 1.0, 0.0)));
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, Rgb::new(1.0, 0.0, 0.0)));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(
            scene.intersect(&ray).unwrap().object.color(),
            Rgb::new(0.0, 1.0, 0.0)
        );
    }

    #[test]
    fn test_no_lights_gives_ambient_only() {
        let color = Rgb::new(1.0, 0.3, 0.3);
        let mut scene = Scene::new(0);
        scene.add_object(Sphere::new(Vec3::new(0.0, 7.0, 0.0), 1.0, color));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(
            scene.illumination(&ray, 0).unwrap(),
            Rgb::new(0.1, 0.1, 0.1).mix(color)
        );
    }

    #[test]
    fn test_light_behind_viewer_adds_mirror_term() {
        let color = Rgb::new(1.0, 0.5, 0.25);
        let mut scene = Scene::new(0);
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, color));
        scene.add_light(Light::new(Vec3::new(0.0, -10.0, 0.0), Rgb::new(0.5, 0.5, 0.5)));
        // head-on: the mirrored view ray points straight at the light
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        let expected = Rgb::new(0.5, 0.5, 0.5).mix(color) + AMBIENT.mix(color);
        assert_rgb_eq(scene.illumination(&ray, 0).unwrap(), expected);
    }

    #[test]
    fn test_occluded_light_is_skipped() {
        let color = Rgb::new(1.0, 1.0, 1.0);
        let mut scene = Scene::new(0);
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, color));
        // blocker sits between the hit point (0, 4, 0) and the light
        scene.add_object(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5, color));
        scene.add_light(Light::new(Vec3::new(0.0, -10.0, 0.0), Rgb::new(0.5, 0.5, 0.5)));
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_rgb_eq(scene.illumination(&ray, 0).unwrap(), AMBIENT);
    }

    #[test]
    fn test_obstacle_beyond_light_does_not_shadow() {
        let color = Rgb::new(1.0, 1.0, 1.0);
        let mut scene = Scene::new(0);
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, color));
        scene.add_object(Sphere::new(Vec3::new(0.0, -20.0, 0.0), 1.0, color));
        scene.add_light(Light::new(Vec3::new(0.0, -10.0, 0.0), Rgb::new(0.5, 0.5, 0.5)));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        let expected = Rgb::new(0.5, 0.5, 0.5) + AMBIENT;
        assert_rgb_eq(scene.illumination(&ray, 0).unwrap(), expected);
    }

    #[test]
    fn test_light_on_surface_is_degenerate() {
        let mut scene = Scene::new(0);
        scene.add_object(Sphere::new(Vec3::new(0.0, 5.0, 0.0), 1.0, Rgb::new(1.0, 1.0, 1.0)));
        scene.add_light(Light::new(Vec3::new(0.0, 4.0, 0.0), Rgb::new(1.0, 1.0, 1.0)));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
        assert!(matches!(
            scene.illumination(&ray, 0),
            Err(RenderError::DegenerateRay)
        ));
    }

    #[test]
    fn test_recursion_is_bounded_between_mirrors() {
        for iterations in [0u32, 1, 4, 25] {
            let calls = Arc::new(AtomicUsize::new(0));
            let mut scene = Scene::new(iterations);
            for y in [-5.0, 5.0] {
                scene.add_object(CountingSphere {
                    sphere: Sphere::new(Vec3::new(0.0, y, 0.0), 1.0, Rgb::new(0.9, 0.9, 0.9)),
                    calls: calls.clone(),
                });
            }
            // bounces back and forth on the y axis forever without the limit
            let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 1.0, 0.0));
            scene.illumination(&ray, 0).unwrap();
            // no lights: one intersection query (two objects) per call
            let depth = calls.load(Ordering::SeqCst) / 2;
            assert_eq!(depth, iterations as usize + 1);
        }
    }
}
