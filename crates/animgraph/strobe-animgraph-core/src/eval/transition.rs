//! Cross-fade engine between two evaluated pose streams.
//!
//! A transition is wired in two phases: `first_init` resets progress and
//! allocates scratch, then one of the `start_from_*` calls binds the source
//! (a state or a superseded transition) and the target state, initializes
//! the target and produces the first blended frame. From then on
//! [`evaluate`] advances the fade each tick until the owning state machine
//! observes [`is_complete`] and shuts the transition down.

use strobe_pose_core::{lerp, local_blend};

use crate::context::{BranchState, GraphContext};
use crate::error::GraphError;
use crate::nodes::{NodeKind, PoseResult, TransitionPhase, TransitionSource, TransitionState};
use crate::runtime::GraphRuntime;
use crate::spec::{GraphDefinition, NodeAssetData, NodeIndex};

use super::{evaluate_pose, fmod, initialize_node, pose_timing, shutdown_node, state_node};

pub(crate) fn first_init(ctx: &GraphContext, state: &mut TransitionState) {
    state.progress = 0.0;
    state.blend_weight = 0.0;
    state.blended_duration = 0.0;
    state.source = None;
    state.target = None;
    state.timing.reset();
    state.source_result = Some(PoseResult::new(&ctx.skeleton));
    state.target_result = Some(PoseResult::new(&ctx.skeleton));
}

/// Read the fade length from the transition's asset.
pub(crate) fn transition_length(
    def: &GraphDefinition,
    index: NodeIndex,
) -> Result<f32, GraphError> {
    match def.asset(index).map(|a| &a.data) {
        Some(NodeAssetData::Transition { duration }) => Ok(*duration),
        Some(_) => Err(GraphError::KindMismatch {
            index,
            expected: "transition",
        }),
        None => Err(GraphError::MissingNode(index)),
    }
}

/// Start the transition at `index` fading out from a plain state.
/// On entry `out` holds the source's pose for this frame.
pub(crate) fn start_from_state(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    source_state: NodeIndex,
    target_state: NodeIndex,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    start(
        def,
        rt,
        ctx,
        index,
        TransitionSource::State(source_state),
        target_state,
        out,
    )
}

/// Start the transition at `index` fading out from a superseded transition,
/// enabling transition-during-transition chaining.
/// On entry `out` holds the source's pose for this frame.
pub(crate) fn start_from_transition(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    source_transition: NodeIndex,
    target_state: NodeIndex,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    start(
        def,
        rt,
        ctx,
        index,
        TransitionSource::Transition(source_transition),
        target_state,
        out,
    )
}

fn start(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    source: TransitionSource,
    target: NodeIndex,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    let length = transition_length(def, index)?;
    let mut node = rt.take(index)?;
    node.lifecycle.mark_active(ctx.update_id);
    let res = match &mut node.kind {
        NodeKind::Transition(state) => {
            state.source = Some(source);
            state.target = Some(target);
            init_target_and_update(def, rt, ctx, index, state, length, out)
        }
        _ => Err(GraphError::KindMismatch {
            index,
            expected: "transition",
        }),
    };
    rt.put(index, node);
    res
}

/// Second startup phase: flag the endpoints, bring the target up, and
/// produce the first blended frame.
fn init_target_and_update(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    state: &mut TransitionState,
    length: f32,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    let source = state.source.ok_or(GraphError::TransitionNotStarted(index))?;
    let target = state.target.ok_or(GraphError::TransitionNotStarted(index))?;

    if let TransitionSource::State(src) = source {
        state_node::set_phase(rt, src, TransitionPhase::Out)?;
    }
    initialize_node(def, rt, ctx, target)?;
    state_node::set_phase(rt, target, TransitionPhase::In)?;

    let (Some(src_res), Some(tgt_res)) = (
        state.source_result.as_mut(),
        state.target_result.as_mut(),
    ) else {
        return Err(GraphError::NotInitialized(index));
    };

    src_res.pose.copy_from(&out.pose);
    evaluate_pose(def, rt, ctx, target, tgt_res)?;

    state.blend_weight = if length <= 0.0 {
        1.0
    } else {
        state.progress.clamp(0.0, 1.0)
    };
    local_blend(&src_res.pose, &tgt_res.pose, state.blend_weight, &mut out.pose);

    let source_duration = pose_timing(rt, source.index()).map(|t| t.duration).unwrap_or(0.0);
    let target_duration = pose_timing(rt, target).map(|t| t.duration).unwrap_or(0.0);
    state.blended_duration = lerp(source_duration, target_duration, state.blend_weight);

    state.timing.previous_time = 0.0;
    state.timing.current_time = 0.0;
    // Completion observers measure against the target's natural length, not
    // the fade's own length.
    state.timing.duration = target_duration;
    Ok(())
}

/// Advance and apply the cross-fade for one tick.
pub(crate) fn evaluate(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    state: &mut TransitionState,
    length: f32,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    let source = state.source.ok_or(GraphError::TransitionNotStarted(index))?;
    let target = state.target.ok_or(GraphError::TransitionNotStarted(index))?;

    if length > 0.0 {
        state.progress = (state.progress + ctx.delta_time / length).clamp(0.0, 1.0);
        // Linear cross-fade, no easing.
        state.blend_weight = state.progress;
    } else {
        state.progress = 1.0;
        state.blend_weight = 1.0;
    }

    let (Some(src_res), Some(tgt_res)) = (
        state.source_result.as_mut(),
        state.target_result.as_mut(),
    ) else {
        return Err(GraphError::NotInitialized(index));
    };

    // The source is being faded out; nested state machines inside it must
    // not arm new transitions while that happens.
    ctx.with_branch_state(BranchState::Inactive, |ctx| {
        evaluate_pose(def, rt, ctx, source.index(), src_res)
    })?;
    evaluate_pose(def, rt, ctx, target, tgt_res)?;

    local_blend(&src_res.pose, &tgt_res.pose, state.blend_weight, &mut out.pose);

    let source_duration = pose_timing(rt, source.index()).map(|t| t.duration).unwrap_or(0.0);
    let target_duration = pose_timing(rt, target).map(|t| t.duration).unwrap_or(0.0);
    state.blended_duration = lerp(source_duration, target_duration, state.blend_weight);

    if state.blended_duration > 0.0 {
        // Normalized playback position across the blended timeline.
        state.timing.previous_time = state.timing.current_time;
        state.timing.current_time = fmod(
            state.timing.current_time + ctx.delta_time / state.blended_duration,
            1.0,
        );
    } else {
        state.timing.previous_time = 1.0;
        state.timing.current_time = 1.0;
    }
    state.timing.duration = target_duration;
    Ok(())
}

/// Completion is detected at the boundary: true when the *next* step's
/// projected progress would reach 1, not after progress has already
/// crossed it.
pub(crate) fn is_complete(ctx: &GraphContext, state: &TransitionState, length: f32) -> bool {
    length <= 0.0 || state.progress + ctx.delta_time / length >= 1.0
}

/// Hook invoked on a transition about to be superseded by a new transition
/// chained from it. Deliberately a no-op: the seam exists so a superseded
/// fade can adjust its own blend toward the new target.
pub(crate) fn notify_new_transition_starting(
    rt: &mut GraphRuntime,
    index: NodeIndex,
    _new_target: NodeIndex,
) -> Result<(), GraphError> {
    match rt.get_mut(index).map(|n| &mut n.kind) {
        Some(NodeKind::Transition(_)) => Ok(()),
        Some(_) => Err(GraphError::KindMismatch {
            index,
            expected: "transition",
        }),
        None => Err(GraphError::MissingNode(index)),
    }
}

pub(crate) fn last_shutdown(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    state: &mut TransitionState,
) -> Result<(), GraphError> {
    if let Some(target) = state.target.take() {
        state_node::set_phase(rt, target, TransitionPhase::None)?;
    }
    state.timing.current_time = 1.0;
    // Ownership of the source was transferred to this transition at
    // startup; release it here and nowhere else.
    if let Some(source) = state.source.take() {
        shutdown_node(def, rt, ctx, source.index())?;
    }
    state.source_result = None;
    state.target_result = None;
    Ok(())
}
