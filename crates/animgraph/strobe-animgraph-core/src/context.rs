//! Per-evaluation environment threaded through the whole graph walk.

use std::sync::Arc;

use strobe_pose_core::Skeleton;

/// Whether the branch currently being evaluated may arm new transitions.
///
/// A transition forces its source subtree to `Inactive` while fading it out;
/// nested state machines must not start transitions of their own during that
/// window.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BranchState {
    Active,
    Inactive,
}

/// Shared evaluation context. A single mutable instance is passed by
/// reference through every node of a tick.
#[derive(Clone, Debug)]
pub struct GraphContext {
    /// Seconds elapsed since the previous tick, supplied by the caller.
    pub delta_time: f32,
    /// Monotonic per-evaluation counter; equality with a node's stored id
    /// means "already evaluated this frame".
    pub update_id: u64,
    pub branch_state: BranchState,
    /// Rig reference used to size scratch poses.
    pub skeleton: Arc<Skeleton>,
}

impl GraphContext {
    pub fn new(skeleton: Arc<Skeleton>) -> Self {
        Self {
            delta_time: 0.0,
            update_id: 0,
            branch_state: BranchState::Active,
            skeleton,
        }
    }

    /// Run `f` with `branch_state` overridden, restoring the previous value
    /// on every exit path. All branch-state overrides must go through here.
    pub fn with_branch_state<R>(
        &mut self,
        state: BranchState,
        f: impl FnOnce(&mut GraphContext) -> R,
    ) -> R {
        let prev = self.branch_state;
        self.branch_state = state;
        let out = f(self);
        self.branch_state = prev;
        out
    }
}
