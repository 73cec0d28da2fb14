//! Parallel-array pose container.
//!
//! A `Pose` stores per-bone local transforms decomposed into position,
//! rotation (kept both as a quaternion and as Euler angles in degrees) and
//! scale. All arrays are indexed by bind index and always have equal length.
//! Poses are allocated once and mutated in place each frame.

use serde::{Deserialize, Serialize};

use crate::skeleton::Skeleton;

/// Identity quaternion (x, y, z, w).
pub const QUAT_IDENTITY: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Pose {
    pub positions: Vec<[f32; 3]>,
    /// Quaternions (x, y, z, w), used for spherical blending.
    pub rotations: Vec<[f32; 4]>,
    /// Euler angles in degrees, used for angle-wise blending.
    pub eulers: Vec<[f32; 3]>,
    pub scales: Vec<[f32; 3]>,
}

impl Pose {
    /// Identity pose sized against `skeleton`.
    pub fn new(skeleton: &Skeleton) -> Self {
        Self::with_bone_count(skeleton.bone_count())
    }

    pub fn with_bone_count(count: usize) -> Self {
        Self {
            positions: vec![[0.0; 3]; count],
            rotations: vec![QUAT_IDENTITY; count],
            eulers: vec![[0.0; 3]; count],
            scales: vec![[1.0; 3]; count],
        }
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        debug_assert!(
            self.positions.len() == self.rotations.len()
                && self.positions.len() == self.eulers.len()
                && self.positions.len() == self.scales.len(),
            "pose arrays must have equal length"
        );
        self.positions.len()
    }

    /// Overwrite this pose with `other`'s transforms. Both poses must be
    /// sized against the same skeleton.
    pub fn copy_from(&mut self, other: &Pose) {
        debug_assert_eq!(self.bone_count(), other.bone_count());
        self.positions.copy_from_slice(&other.positions);
        self.rotations.copy_from_slice(&other.rotations);
        self.eulers.copy_from_slice(&other.eulers);
        self.scales.copy_from_slice(&other.scales);
    }

    /// Reset to the identity pose without reallocating.
    pub fn reset(&mut self) {
        for p in &mut self.positions {
            *p = [0.0; 3];
        }
        for r in &mut self.rotations {
            *r = QUAT_IDENTITY;
        }
        for e in &mut self.eulers {
            *e = [0.0; 3];
        }
        for s in &mut self.scales {
            *s = [1.0; 3];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_pose_sized_from_skeleton() {
        let skeleton = Skeleton::with_bone_count(3);
        let pose = Pose::new(&skeleton);
        assert_eq!(pose.bone_count(), 3);
        assert_eq!(pose.rotations[1], QUAT_IDENTITY);
        assert_eq!(pose.scales[2], [1.0; 3]);
    }

    #[test]
    fn copy_from_overwrites_in_place() {
        let skeleton = Skeleton::with_bone_count(2);
        let mut a = Pose::new(&skeleton);
        let mut b = Pose::new(&skeleton);
        b.positions[0] = [1.0, 2.0, 3.0];
        b.eulers[1] = [0.0, 90.0, 0.0];
        a.copy_from(&b);
        assert_eq!(a, b);
        a.reset();
        assert_eq!(a.positions[0], [0.0; 3]);
    }
}
