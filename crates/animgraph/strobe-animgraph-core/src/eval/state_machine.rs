//! State orchestration and transition arbitration.
//!
//! Exactly one of the active transition or the active state drives
//! evaluation on a given tick. The active state index moves to the target
//! at the moment a transition is armed; the transition owns the blend until
//! it completes and is committed (shut down and cleared).

use crate::context::{BranchState, GraphContext};
use crate::error::GraphError;
use crate::nodes::{GraphNode, NodeKind, PoseResult, StateMachineState};
use crate::runtime::GraphRuntime;
use crate::spec::{GraphDefinition, NodeIndex, StateData};

use super::{
    eval_bool, evaluate_pose, initialize_node, pose_timing, shutdown_node, state_node, transition,
};

pub(crate) fn first_init(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    sm: &mut StateMachineState,
    states: &[StateData],
    default_state: usize,
) -> Result<(), GraphError> {
    let entry = states
        .get(default_state)
        .ok_or(GraphError::InvalidStateIndex(default_state))?;
    sm.active_state = Some(default_state);
    sm.active_transition = None;
    sm.timing.reset();
    initialize_node(def, rt, ctx, entry.state_node)?;
    sm.timing = pose_timing(rt, entry.state_node).unwrap_or_default();
    init_conditions(def, rt, ctx, entry)?;
    Ok(())
}

pub(crate) fn last_shutdown(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    sm: &mut StateMachineState,
    states: &[StateData],
) -> Result<(), GraphError> {
    if let Some(t) = sm.active_transition.take() {
        shutdown_node(def, rt, ctx, t)?;
    }
    if let Some(active) = sm.active_state.take() {
        let entry = states
            .get(active)
            .ok_or(GraphError::InvalidStateIndex(active))?;
        shutdown_conditions(def, rt, ctx, entry)?;
        shutdown_node(def, rt, ctx, entry.state_node)?;
    }
    Ok(())
}

/// Condition nodes are live only while their owning state is active.
fn init_conditions(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    entry: &StateData,
) -> Result<(), GraphError> {
    for t in &entry.transitions {
        if let Some(cond) = t.condition.filter(|i| rt.contains(*i)) {
            initialize_node(def, rt, ctx, cond)?;
        }
    }
    Ok(())
}

fn shutdown_conditions(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    entry: &StateData,
) -> Result<(), GraphError> {
    for t in &entry.transitions {
        if let Some(cond) = t.condition.filter(|i| rt.contains(*i)) {
            shutdown_node(def, rt, ctx, cond)?;
        }
    }
    Ok(())
}

pub(crate) fn evaluate(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    sm: &mut StateMachineState,
    states: &[StateData],
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    // Commit a finished cross-fade: the machine's effective position moves
    // fully to the target.
    if let Some(t_idx) = sm.active_transition {
        let length = transition::transition_length(def, t_idx)?;
        let complete = match rt.get(t_idx).map(|n| &n.kind) {
            Some(NodeKind::Transition(ts)) => transition::is_complete(ctx, ts, length),
            Some(_) => {
                return Err(GraphError::KindMismatch {
                    index: t_idx,
                    expected: "transition",
                })
            }
            None => return Err(GraphError::MissingNode(t_idx)),
        };
        if complete {
            shutdown_node(def, rt, ctx, t_idx)?;
            sm.active_transition = None;
        }
    }

    let active = sm.active_state.ok_or(GraphError::NotInitialized(index))?;
    let entry = states
        .get(active)
        .ok_or(GraphError::InvalidStateIndex(active))?;

    if let Some(t_idx) = sm.active_transition {
        evaluate_pose(def, rt, ctx, t_idx, out)?;
        sm.timing = pose_timing(rt, t_idx).unwrap_or_default();
    } else {
        evaluate_pose(def, rt, ctx, entry.state_node, out)?;
        sm.timing = pose_timing(rt, entry.state_node).unwrap_or_default();
    }

    // Arbitration is suppressed while this machine is itself being faded
    // out as someone else's transition source.
    if ctx.branch_state == BranchState::Active && sm.active_transition.is_none() {
        evaluate_transitions(def, rt, ctx, index, sm, states, out)?;
    }
    Ok(())
}

/// Walk the active state's candidates in declaration order and commit the
/// first viable one. No backtracking, no weighting beyond list order.
fn evaluate_transitions(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    sm: &mut StateMachineState,
    states: &[StateData],
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    let active = sm.active_state.ok_or(GraphError::NotInitialized(index))?;
    let entry = states
        .get(active)
        .ok_or(GraphError::InvalidStateIndex(active))?;

    for candidate in &entry.transitions {
        let target_state = candidate
            .target_state
            .ok_or(GraphError::MissingTransitionTarget { state: active })?;
        let target_entry = states
            .get(target_state)
            .ok_or(GraphError::InvalidStateIndex(target_state))?;

        // A target already mid-transition is not re-entered.
        if state_node::is_transitioning(rt, target_entry.state_node)? {
            continue;
        }
        if let Some(cond) = candidate.condition.filter(|i| rt.contains(*i)) {
            if !eval_bool(def, rt, ctx, cond)? {
                continue;
            }
        }

        let new_transition = candidate.transition_node;
        if let Some(prev) = sm.active_transition {
            // Chain: the superseded transition becomes the new source.
            transition::notify_new_transition_starting(rt, prev, target_entry.state_node)?;
            initialize_node(def, rt, ctx, new_transition)?;
            transition::start_from_transition(
                def,
                rt,
                ctx,
                new_transition,
                prev,
                target_entry.state_node,
                out,
            )?;
        } else {
            initialize_node(def, rt, ctx, new_transition)?;
            transition::start_from_state(
                def,
                rt,
                ctx,
                new_transition,
                entry.state_node,
                target_entry.state_node,
                out,
            )?;
        }
        sm.active_transition = Some(new_transition);

        // Condition liveness follows the active state.
        shutdown_conditions(def, rt, ctx, entry)?;
        sm.active_state = Some(target_state);
        init_conditions(def, rt, ctx, target_entry)?;
        break;
    }
    Ok(())
}

/// Peek helper for drivers and tests: the state machine node's transient
/// orchestration state.
pub fn machine_state(rt: &GraphRuntime, index: NodeIndex) -> Option<&StateMachineState> {
    match rt.get(index) {
        Some(GraphNode {
            kind: NodeKind::StateMachine(sm),
            ..
        }) => Some(sm),
        _ => None,
    }
}
