//! Axis-aligned bounding boxes.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bound {
    /// An empty box that contains nothing.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// A cube of edge `2 * half_extent` centred on `center`.
    pub fn from_center(center: Vec3, half_extent: f32) -> Self {
        Self::new(center - Vec3::splat(half_extent), center + Vec3::splat(half_extent))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn union(&self, other: &Bound) -> Bound {
        Bound::new(self.min.min(other.min), self.max.max(other.max))
    }

    /// Transforms all eight corners and returns their bounding box.
    pub fn transform(&self, m: &Mat4) -> Bound {
        if self.is_empty() {
            return *self;
        }
        let mut result = Bound::EMPTY;
        for i in 0..8 {
            let corner = Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            );
            let p = m.transform_point3(corner);
            result.min = result.min.min(p);
            result.max = result.max.max(p);
        }
        result
    }
}

impl Default for Bound {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bound() {
        assert!(Bound::EMPTY.is_empty());
        assert!(!Bound::from_center(Vec3::ZERO, 1.0).is_empty());
    }

    #[test]
    fn test_transform_translates_box() {
        let b = Bound::from_center(Vec3::ZERO, 1.0);
        let moved = b.transform(&Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert!(moved.center().abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
    }
}
