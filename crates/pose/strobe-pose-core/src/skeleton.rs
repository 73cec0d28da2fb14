//! Skeleton description used to size poses.

use serde::{Deserialize, Serialize};

/// Bone list for a rig. Poses are sized against a skeleton and remain valid
/// only for skeletons with the same bone count.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Skeleton {
    /// Bone names in bind order; index into this list is the bind index used
    /// by all pose arrays.
    pub bone_names: Vec<String>,
}

impl Skeleton {
    pub fn new(bone_names: Vec<String>) -> Self {
        Self { bone_names }
    }

    /// Convenience constructor for rigs where only the bone count matters.
    pub fn with_bone_count(count: usize) -> Self {
        Self {
            bone_names: (0..count).map(|i| format!("bone_{i}")).collect(),
        }
    }

    #[inline]
    pub fn bone_count(&self) -> usize {
        self.bone_names.len()
    }

    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_names.iter().position(|n| n == name)
    }
}
