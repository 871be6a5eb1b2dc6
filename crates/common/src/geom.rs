//! Axis-aligned geometry used for colliders and terrain tests.

use std::ops::Add;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One of the three world axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

/// An axis-aligned bounding box.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Creates a box from two opposite corners in any order.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The unit cube occupying the block cell whose minimum corner is `origin`.
    pub fn unit(origin: Vec3) -> Self {
        Self {
            min: origin,
            max: origin + Vec3::ONE,
        }
    }

    pub fn size(self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(self) -> Vec3 {
        (self.min + self.max) / 2.
    }

    /// Returns the penetration depth along each axis if the two boxes
    /// overlap with nonzero volume. Boxes which merely touch do not overlap.
    pub fn overlap(self, other: Aabb) -> Option<Vec3> {
        let depth = self.max.min(other.max) - self.min.max(other.min);
        if depth.x > 0. && depth.y > 0. && depth.z > 0. {
            Some(depth)
        } else {
            None
        }
    }

    pub fn intersects(self, other: Aabb) -> bool {
        self.overlap(other).is_some()
    }

    /// Whether the projections of the two boxes onto `axis` are disjoint
    /// or only touch.
    pub fn separated_on(self, other: Aabb, axis: Axis) -> bool {
        let i = axis.index();
        self.max[i] <= other.min[i] || self.min[i] >= other.max[i]
    }
}

impl Add<Vec3> for Aabb {
    type Output = Self;

    fn add(self, rhs: Vec3) -> Self::Output {
        Self {
            min: self.min + rhs,
            max: self.max + rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn new_orders_corners() {
        let aabb = Aabb::new(vec3(1., -2., 3.), vec3(-1., 2., 0.));
        assert_eq!(aabb.min, vec3(-1., -2., 0.));
        assert_eq!(aabb.max, vec3(1., 2., 3.));
        assert_eq!(aabb.size(), vec3(2., 4., 3.));
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = Aabb::unit(Vec3::ZERO);
        let b = Aabb::unit(vec3(1., 0., 0.));
        assert_eq!(a.overlap(b), None);
    }

    #[test]
    fn overlap_depths() {
        let a = Aabb::new(vec3(-0.3, 0.9, -0.3), vec3(0.3, 2.7, 0.3));
        let ground = Aabb::unit(vec3(0., 0., 0.));
        let depth = a.overlap(ground).unwrap();
        assert!((depth.x - 0.3).abs() < 1e-6);
        assert!((depth.y - 0.1).abs() < 1e-6);
        assert!((depth.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn separation_per_axis() {
        let block = Aabb::unit(Vec3::ZERO);
        let above = Aabb::new(vec3(0.9, 1., 0.2), vec3(1.5, 2.8, 0.8));
        assert!(above.separated_on(block, Axis::Y));
        assert!(!above.separated_on(block, Axis::X));
        assert!(!above.separated_on(block, Axis::Z));
        assert!((above + vec3(0.2, 0., 0.)).separated_on(block, Axis::X));
    }

    #[test]
    fn translate() {
        let a = Aabb::unit(Vec3::ZERO) + vec3(2., 3., 4.);
        assert_eq!(a.min, vec3(2., 3., 4.));
        assert_eq!(a.center(), vec3(2.5, 3.5, 4.5));
    }
}
