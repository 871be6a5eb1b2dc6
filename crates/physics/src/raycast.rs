//! Ray traversal through the block grid, used to find the block an
//! entity is looking at.

use common::BlockPos;
use glam::Vec3;

/// A face of a block, named by the direction its normal points.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BlockFace {
    PosX,
    NegX,
    Top,
    Bottom,
    PosZ,
    NegZ,
}

impl BlockFace {
    /// The face a ray crosses when stepping along `axis` in direction `step`.
    fn entered(axis: usize, step: i32) -> Self {
        match (axis, step > 0) {
            (0, true) => BlockFace::NegX,
            (0, false) => BlockFace::PosX,
            (1, true) => BlockFace::Bottom,
            (1, false) => BlockFace::Top,
            (_, true) => BlockFace::NegZ,
            (_, false) => BlockFace::PosZ,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RayHit {
    pub pos: BlockPos,
    /// The face through which the ray entered the block.
    pub face: BlockFace,
    pub distance: f32,
}

/// Traces a ray through the block grid and returns the first block for
/// which `is_solid` returns true, or `None` if the ray travels
/// `max_distance` without finding one. Non-finite input never hits.
///
/// Based on "A Fast Voxel Traversal Algorithm for Ray Tracing"
/// by John Amanatides and Andrew Woo.
pub fn raycast(
    origin: Vec3,
    dir: Vec3,
    max_distance: f32,
    mut is_solid: impl FnMut(BlockPos) -> bool,
) -> Option<RayHit> {
    if !origin.is_finite() || !max_distance.is_finite() {
        return None;
    }
    let dir = dir.try_normalize()?;

    let mut current = [
        origin.x.floor() as i32,
        origin.y.floor() as i32,
        origin.z.floor() as i32,
    ];
    let mut step = [0; 3];
    // Distance along the ray between successive boundaries on each axis.
    let mut delta = [f32::INFINITY; 3];
    // Distance along the ray to the next boundary on each axis.
    let mut next = [f32::INFINITY; 3];

    for axis in 0..3 {
        let (o, d) = (origin[axis], dir[axis]);
        if d > 0. {
            step[axis] = 1;
            delta[axis] = 1. / d;
            next[axis] = (o.floor() + 1. - o) / d;
        } else if d < 0. {
            step[axis] = -1;
            delta[axis] = -1. / d;
            next[axis] = (o - o.floor()) / -d;
        }
    }

    // A ray starting inside a block hits the face opposite its main direction.
    let main_axis = if dir.x.abs() >= dir.y.abs() && dir.x.abs() >= dir.z.abs() {
        0
    } else if dir.y.abs() >= dir.z.abs() {
        1
    } else {
        2
    };
    let mut face = BlockFace::entered(main_axis, step[main_axis]);
    let mut distance = 0.;

    loop {
        let pos = BlockPos::new(current[0], current[1], current[2]);
        if is_solid(pos) {
            return Some(RayHit {
                pos,
                face,
                distance,
            });
        }

        let axis = if next[0] < next[1] {
            if next[0] < next[2] {
                0
            } else {
                2
            }
        } else if next[1] < next[2] {
            1
        } else {
            2
        };

        distance = next[axis];
        if !(distance <= max_distance) {
            return None;
        }
        next[axis] += delta[axis];
        current[axis] += step[axis];
        face = BlockFace::entered(axis, step[axis]);
    }
}

#[cfg(test)]
mod tests {
    use glam::vec3;

    use super::*;

    #[test]
    fn raytrace_empty() {
        let hit = raycast(Vec3::ZERO, Vec3::Y, 100., |_| false);
        assert_eq!(hit, None);
    }

    #[test]
    fn zero_direction() {
        assert_eq!(raycast(Vec3::ZERO, Vec3::ZERO, 100., |_| true), None);
    }

    #[test]
    fn non_finite_input_misses() {
        assert_eq!(raycast(Vec3::ZERO, Vec3::Y, f32::INFINITY, |_| false), None);
        assert_eq!(raycast(Vec3::ZERO, Vec3::Y, f32::NAN, |_| false), None);
        assert_eq!(raycast(Vec3::ZERO, vec3(f32::NAN, 1., 0.), 10., |_| false), None);
        assert_eq!(raycast(vec3(0., f32::INFINITY, 0.), Vec3::Y, 10., |_| true), None);
    }

    #[test]
    fn raytrace_to_block() {
        let hit = raycast(vec3(0.5, 0., 0.5), Vec3::Y, 100., |pos| pos.y == 2).unwrap();
        assert_eq!(hit.pos, BlockPos::new(0, 2, 0));
        assert_eq!(hit.face, BlockFace::Bottom);
        assert_eq!(hit.distance, 2.);
    }

    #[test]
    fn raytrace_down_hits_top() {
        let hit = raycast(vec3(3.5, 2.62, -0.5), -Vec3::Y, 10., |pos| pos.y == 0).unwrap();
        assert_eq!(hit.pos, BlockPos::new(3, 0, -1));
        assert_eq!(hit.face, BlockFace::Top);
        assert!((hit.distance - 1.62).abs() < 1e-5);
    }

    #[test]
    fn raytrace_diagonal() {
        let hit = raycast(vec3(0.5, 0.5, 0.5), vec3(1., 0., 1.), 10., |pos| pos.x == 3).unwrap();
        assert_eq!(hit.pos.x, 3);
        assert_eq!(hit.face, BlockFace::NegX);
    }

    #[test]
    fn raytrace_out_of_reach() {
        let hit = raycast(vec3(0.5, 0.5, 0.5), Vec3::X, 4., |pos| pos.x == 6);
        assert_eq!(hit, None);
    }
}
