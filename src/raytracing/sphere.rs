use super::core::SceneObject;
use super::{Ray, Rgb, Vec3};

/// Hits closer than this along the ray are ignored so a ray leaving a
/// surface does not immediately hit it again (shadow acne).
const EPSILON: f64 = 1e-5;

#[derive(Debug, Clone)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f64,
    pub color: Rgb,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f64, color: Rgb) -> Sphere {
        Sphere {
            center,
            radius,
            color,
        }
    }
}

impl SceneObject for Sphere {
    fn intersect(&self, ray: &Ray) -> Option<Vec3> {
        // the direction is unit length, so the quadratic has a = 1
        let oc = ray.origin - self.center;
        let b = oc.dot(ray.direction);
        let discriminant = b * b - (oc.squared_len() - self.radius * self.radius);
        if discriminant < 0.0 {
            return None;
        }

        let root = discriminant.sqrt();
        let far = -b + root;
        let near = -b - root;
        let t = match (near >= EPSILON, far >= EPSILON) {
            (true, _) => near,
            (false, true) => far,
            (false, false) => return None,
        };
        Some(ray.at(t))
    }

    fn anchor(&self) -> Vec3 {
        self.center
    }

    fn color(&self) -> Rgb {
        self.color
    }
}
