//! External clip resources consumed by clip nodes.
//!
//! The runtime treats clip data as an opaque provider: anything that can
//! report a duration and write a pose for a point in time. Hosts register
//! clips against integer slots referenced by clip assets.

use std::fmt;
use std::sync::Arc;

use strobe_pose_core::Pose;

/// A sampled animation resource.
pub trait AnimationClip: Send + Sync {
    /// Natural length of the clip in seconds.
    fn duration(&self) -> f32;

    /// Write the clip's pose at `time` (seconds) into `pose`, mutating it in
    /// place. Sampling past the end is up to the resource; the runtime does
    /// not clamp non-looping time.
    fn sample(&self, time: f32, pose: &mut Pose);
}

/// Slot-indexed clip table owned by a graph instance.
#[derive(Clone, Default)]
pub struct GraphDataSet {
    clips: Vec<Option<Arc<dyn AnimationClip>>>,
}

impl GraphDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `clip` at `slot`, growing the table as needed.
    pub fn set_clip(&mut self, slot: u32, clip: Arc<dyn AnimationClip>) {
        let slot = slot as usize;
        if self.clips.len() <= slot {
            self.clips.resize_with(slot + 1, || None);
        }
        self.clips[slot] = Some(clip);
    }

    /// Resolve the clip at `slot`. A missing slot is not an error; the
    /// referencing clip node degrades to a no-op.
    pub fn clip(&self, slot: u32) -> Option<Arc<dyn AnimationClip>> {
        self.clips.get(slot as usize).and_then(|c| c.clone())
    }
}

impl fmt::Debug for GraphDataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphDataSet")
            .field("slots", &self.clips.len())
            .finish()
    }
}
