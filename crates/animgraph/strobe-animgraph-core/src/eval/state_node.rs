//! State wrapper around a child pose node.
//!
//! The wrapper tracks elapsed time in state and the transition phase flag
//! set by the owning transition or state machine; the flag guards
//! re-entrant transitions into the same state during arbitration.

use crate::context::GraphContext;
use crate::error::GraphError;
use crate::nodes::{NodeKind, PoseResult, StateNodeState, TransitionPhase};
use crate::runtime::GraphRuntime;
use crate::spec::{GraphDefinition, NodeIndex};

use super::{evaluate_pose, initialize_node, pose_timing, shutdown_node};

pub(crate) fn first_init(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    state: &mut StateNodeState,
    child: Option<NodeIndex>,
) -> Result<(), GraphError> {
    state.phase = TransitionPhase::None;
    state.elapsed_time_in_state = 0.0;
    state.timing.reset();
    if let Some(child) = child.filter(|i| rt.contains(*i)) {
        initialize_node(def, rt, ctx, child)?;
    }
    Ok(())
}

pub(crate) fn last_shutdown(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    child: Option<NodeIndex>,
) -> Result<(), GraphError> {
    if let Some(child) = child.filter(|i| rt.contains(*i)) {
        shutdown_node(def, rt, ctx, child)?;
    }
    Ok(())
}

/// Delegate to the child (when bound) and lift its timing; elapsed time
/// accumulates either way.
pub(crate) fn evaluate(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    state: &mut StateNodeState,
    child: Option<NodeIndex>,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    if let Some(child) = child.filter(|i| rt.contains(*i)) {
        evaluate_pose(def, rt, ctx, child, out)?;
        state.timing = pose_timing(rt, child).unwrap_or_default();
    }
    state.elapsed_time_in_state += ctx.delta_time;
    Ok(())
}

/// Set the transition phase flag on the state node at `index`.
pub(crate) fn set_phase(
    rt: &mut GraphRuntime,
    index: NodeIndex,
    phase: TransitionPhase,
) -> Result<(), GraphError> {
    match rt.get_mut(index).map(|n| &mut n.kind) {
        Some(NodeKind::State(state)) => {
            state.phase = phase;
            Ok(())
        }
        Some(_) => Err(GraphError::KindMismatch {
            index,
            expected: "state",
        }),
        None => Err(GraphError::MissingNode(index)),
    }
}

/// Whether the state node at `index` is currently part of a transition.
pub(crate) fn is_transitioning(rt: &GraphRuntime, index: NodeIndex) -> Result<bool, GraphError> {
    match rt.get(index).map(|n| &n.kind) {
        Some(NodeKind::State(state)) => Ok(state.phase.is_transitioning()),
        Some(_) => Err(GraphError::KindMismatch {
            index,
            expected: "state",
        }),
        None => Err(GraphError::MissingNode(index)),
    }
}
