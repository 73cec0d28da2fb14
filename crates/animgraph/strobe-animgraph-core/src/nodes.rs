//! Runtime node state: lifecycle bookkeeping plus one closed variant per
//! node kind.
//!
//! Static wiring (child indices, constants, transition tables) stays in the
//! immutable [`GraphDefinition`](crate::spec::GraphDefinition); the structs
//! here hold only what mutates at runtime. Shared scheduling metadata
//! ([`PoseTiming`]) is embedded in each pose-producing variant.

use std::sync::Arc;

use strobe_pose_core::{Pose, Skeleton};

use crate::dataset::AnimationClip;
use crate::spec::NodeIndex;

/// Wrapper owning exactly one pose, used as a node's scratch or output
/// buffer. Allocated once and mutated in place every frame.
#[derive(Clone, Debug)]
pub struct PoseResult {
    pub pose: Pose,
}

impl PoseResult {
    pub fn new(skeleton: &Skeleton) -> Self {
        Self {
            pose: Pose::new(skeleton),
        }
    }

    pub fn copy_from(&mut self, other: &PoseResult) {
        self.pose.copy_from(&other.pose);
    }
}

/// Reference-counted initialize/shutdown state plus the per-frame active
/// marker. The counter is owned here; variant-specific first-init and
/// last-shutdown hooks live in the evaluation dispatch layer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NodeLifecycle {
    pub init_count: u32,
    last_update: Option<u64>,
}

impl NodeLifecycle {
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.init_count > 0
    }

    /// Record that this node took part in the evaluation identified by
    /// `update_id`.
    #[inline]
    pub fn mark_active(&mut self, update_id: u64) {
        self.last_update = Some(update_id);
    }

    /// True iff the node was marked active for `update_id`. Lets diamond
    /// topologies recognize an already-evaluated node within a frame.
    #[inline]
    pub fn is_active(&self, update_id: u64) -> bool {
        self.last_update == Some(update_id)
    }
}

/// Exposed scheduling metadata of a pose-producing node. Downstream
/// "on completion" consumers read these; blend math does not.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PoseTiming {
    pub previous_time: f32,
    pub current_time: f32,
    pub duration: f32,
}

impl PoseTiming {
    #[inline]
    pub fn reset(&mut self) {
        *self = PoseTiming::default();
    }
}

/// Transition bookkeeping on a state node, set by the owning transition or
/// state machine. Guards re-entrant transitions into the same state.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum TransitionPhase {
    #[default]
    None,
    In,
    Out,
}

impl TransitionPhase {
    #[inline]
    pub fn is_transitioning(self) -> bool {
        self != TransitionPhase::None
    }
}

/// Clip node: local time accumulator plus the resolved clip resource.
#[derive(Clone)]
pub struct ClipState {
    pub time: f32,
    /// Resolved at instantiation; `None` degrades sampling to a no-op.
    pub clip: Option<Arc<dyn AnimationClip>>,
    pub timing: PoseTiming,
}

impl std::fmt::Debug for ClipState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipState")
            .field("time", &self.time)
            .field("bound", &self.clip.is_some())
            .field("timing", &self.timing)
            .finish()
    }
}

/// Float control parameter value, owned by the instance's runtime. Survives
/// condition-node lifecycle churn: it is seeded at instantiation, not reset
/// on re-initialization.
#[derive(Clone, Copy, Debug)]
pub struct ParameterFloatState {
    pub value: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct ParameterBoolState {
    pub value: bool,
}

/// Blend node scratch: one result per input, allocated at first init.
#[derive(Clone, Debug, Default)]
pub struct Blend1dState {
    pub source0_result: Option<PoseResult>,
    pub source1_result: Option<PoseResult>,
    pub timing: PoseTiming,
}

/// State node: elapsed time in state plus the transition phase flag.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateNodeState {
    pub elapsed_time_in_state: f32,
    pub phase: TransitionPhase,
    pub timing: PoseTiming,
}

/// What a transition fades out from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransitionSource {
    State(NodeIndex),
    Transition(NodeIndex),
}

impl TransitionSource {
    #[inline]
    pub fn index(self) -> NodeIndex {
        match self {
            TransitionSource::State(i) | TransitionSource::Transition(i) => i,
        }
    }
}

/// Cross-fade executor state. `source`/`target` are wired by the two-phase
/// startup calls, not at initialization.
#[derive(Clone, Debug, Default)]
pub struct TransitionState {
    /// Normalized progress of the cross-fade, monotone in [0, 1].
    pub progress: f32,
    /// Derived from progress; 1 immediately for zero-length transitions.
    pub blend_weight: f32,
    /// Weight-lerped blend of the source and target durations, the timeline
    /// the normalized playback clock advances against.
    pub blended_duration: f32,
    pub source: Option<TransitionSource>,
    /// Always a state node once wired.
    pub target: Option<NodeIndex>,
    pub source_result: Option<PoseResult>,
    pub target_result: Option<PoseResult>,
    pub timing: PoseTiming,
}

/// State machine orchestrator state. Exactly one of `active_transition`
/// (set) or plain `active_state` drives evaluation at any time; the active
/// state index itself always stays valid while initialized.
#[derive(Clone, Copy, Debug, Default)]
pub struct StateMachineState {
    pub active_state: Option<usize>,
    pub active_transition: Option<NodeIndex>,
    pub timing: PoseTiming,
}

/// Closed sum of runtime node kinds, mirroring the asset table.
#[derive(Clone, Debug)]
pub enum NodeKind {
    Clip(ClipState),
    ConstFloat,
    ConstBool,
    ParameterFloat(ParameterFloatState),
    ParameterBool(ParameterBoolState),
    Blend1d(Blend1dState),
    State(StateNodeState),
    Transition(TransitionState),
    StateMachine(StateMachineState),
}

impl NodeKind {
    /// Scheduling metadata, present on pose-producing kinds only.
    pub fn timing(&self) -> Option<&PoseTiming> {
        match self {
            NodeKind::Clip(s) => Some(&s.timing),
            NodeKind::Blend1d(s) => Some(&s.timing),
            NodeKind::State(s) => Some(&s.timing),
            NodeKind::Transition(s) => Some(&s.timing),
            NodeKind::StateMachine(s) => Some(&s.timing),
            _ => None,
        }
    }

    pub fn is_pose_node(&self) -> bool {
        self.timing().is_some()
    }
}

/// One runtime node: generic lifecycle wrapper plus the kind-specific state.
#[derive(Clone, Debug)]
pub struct GraphNode {
    pub lifecycle: NodeLifecycle,
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            lifecycle: NodeLifecycle::default(),
            kind,
        }
    }
}
