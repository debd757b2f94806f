// Math types shared by the proxies and the native adapter

use glam::Vec2;

/// Rigid transform: translation plus rotation angle (radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec2,
    pub angle: f32,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec2::ZERO,
        angle: 0.0,
    };

    pub fn new(position: Vec2, angle: f32) -> Self {
        Self { position, angle }
    }

    /// Unit rotation vector `(cos, sin)`
    pub fn rotation(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    /// Transform a body-local point into world space
    pub fn mul_point(&self, local: Vec2) -> Vec2 {
        self.position + self.rotation().rotate(local)
    }

    /// Rotate a body-local vector into world space
    pub fn mul_vector(&self, local: Vec2) -> Vec2 {
        self.rotation().rotate(local)
    }

    /// Transform a world point into body-local space
    pub fn inv_mul_point(&self, world: Vec2) -> Vec2 {
        self.inv_mul_vector(world - self.position)
    }

    /// Rotate a world vector into body-local space
    pub fn inv_mul_vector(&self, world: Vec2) -> Vec2 {
        let r = self.rotation();
        Vec2::new(r.x * world.x + r.y * world.y, -r.y * world.x + r.x * world.y)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub lower: Vec2,
    pub upper: Vec2,
}

impl Aabb {
    /// Create a box from two corners (order does not matter)
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            lower: a.min(b),
            upper: a.max(b),
        }
    }

    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Self {
            lower: center - half,
            upper: center + half,
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.lower + self.upper) * 0.5
    }

    pub fn extents(&self) -> Vec2 {
        (self.upper - self.lower) * 0.5
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.lower.x && p.x <= self.upper.x && p.y >= self.lower.y && p.y <= self.upper.y
    }

    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.lower.x <= other.upper.x
            && other.lower.x <= self.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.y <= self.upper.y
    }
}

/// Check if two f32 values are approximately equal
pub fn approx_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_transform_roundtrip_point() {
        let xf = Transform::new(Vec2::new(3.0, -1.0), FRAC_PI_2);
        let world = xf.mul_point(Vec2::new(1.0, 0.0));

        assert_relative_eq!(world.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(world.y, 0.0, epsilon = 1e-5);

        let local = xf.inv_mul_point(world);
        assert_relative_eq!(local.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(local.y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_aabb_normalizes_corners() {
        let aabb = Aabb::new(Vec2::new(2.0, 5.0), Vec2::new(-1.0, 1.0));
        assert_eq!(aabb.lower, Vec2::new(-1.0, 1.0));
        assert_eq!(aabb.upper, Vec2::new(2.0, 5.0));
        assert!(aabb.contains_point(Vec2::new(0.0, 3.0)));
    }

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::from_center(Vec2::ZERO, Vec2::splat(1.0));
        let b = Aabb::from_center(Vec2::new(1.5, 0.0), Vec2::splat(1.0));
        let c = Aabb::from_center(Vec2::new(5.0, 0.0), Vec2::splat(1.0));

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_approx_equal() {
        assert!(approx_equal(1.0, 1.00001, 0.0001));
        assert!(!approx_equal(1.0, 1.1, 0.01));
    }
}
