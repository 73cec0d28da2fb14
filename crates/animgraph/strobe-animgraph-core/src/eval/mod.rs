//! Evaluation pipeline for the animation graph.
//!
//! All per-node behaviour is dispatched from here over the closed
//! [`NodeKind`](crate::nodes::NodeKind) sum, one function per category:
//!
//! - [`initialize_node`] / [`shutdown_node`] — reference-counted lifecycle;
//!   the wrapper owns the counter and only the 0→1 / 1→0 transitions run a
//!   variant's first-init / last-shutdown hook.
//! - [`evaluate_pose`] — pose-producing nodes, writing into a caller-owned
//!   [`PoseResult`](crate::nodes::PoseResult).
//! - [`eval_float`] / [`eval_bool`] — value nodes feeding blend weights and
//!   transition conditions.
//!
//! The submodules hold the per-kind semantics:
//!
//! - [`clip`] — leaf sampler with loop/clamp time handling.
//! - [`blend1d`] — weighted two-input pose blend.
//! - [`state_node`] — state wrapper with transition-phase bookkeeping.
//! - [`transition`] — the cross-fade engine.
//! - [`state_machine`] — transition arbitration and state orchestration.

use crate::context::GraphContext;
use crate::error::GraphError;
use crate::nodes::{GraphNode, NodeKind, PoseResult, PoseTiming};
use crate::runtime::GraphRuntime;
use crate::spec::{GraphDefinition, NodeAssetData, NodeIndex};

pub mod blend1d;
pub mod clip;
pub mod state_machine;
pub mod state_node;
pub mod transition;


/// Euclidean remainder: result has the sign of `b`, zero when `b` is zero.
#[inline]
pub(crate) fn fmod(a: f32, b: f32) -> f32 {
    if b == 0.0 {
        return 0.0;
    }
    let m = a % b;
    if (m < 0.0 && b > 0.0) || (m > 0.0 && b < 0.0) {
        m + b
    } else {
        m
    }
}

/// Copy of a pose node's scheduling metadata, if the node exists and
/// produces poses.
pub(crate) fn pose_timing(rt: &GraphRuntime, index: NodeIndex) -> Option<PoseTiming> {
    rt.get(index).and_then(|n| n.kind.timing().copied())
}

fn asset_data<'a>(
    def: &'a GraphDefinition,
    index: NodeIndex,
) -> Result<&'a NodeAssetData, GraphError> {
    def.asset(index)
        .map(|a| &a.data)
        .ok_or(GraphError::MissingNode(index))
}

/// Increment the node's reference count; only the 0→1 transition runs the
/// variant's first-init hook (timing reset, scratch allocation, child
/// propagation).
pub fn initialize_node(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
) -> Result<(), GraphError> {
    let mut node = rt.take(index)?;
    node.lifecycle.init_count += 1;
    let res = if node.lifecycle.init_count == 1 {
        first_init(def, rt, ctx, index, &mut node)
    } else {
        Ok(())
    };
    rt.put(index, node);
    res
}

/// Decrement the node's reference count; only the 1→0 transition runs the
/// variant's last-shutdown hook. Shutdown without a matching initialize is
/// a contract violation.
pub fn shutdown_node(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
) -> Result<(), GraphError> {
    let mut node = rt.take(index)?;
    if node.lifecycle.init_count == 0 {
        rt.put(index, node);
        return Err(GraphError::NotInitialized(index));
    }
    node.lifecycle.init_count -= 1;
    let res = if node.lifecycle.init_count == 0 {
        last_shutdown(def, rt, ctx, index, &mut node)
    } else {
        Ok(())
    };
    rt.put(index, node);
    res
}

fn first_init(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    node: &mut GraphNode,
) -> Result<(), GraphError> {
    match (asset_data(def, index)?, &mut node.kind) {
        (NodeAssetData::Clip { .. }, NodeKind::Clip(state)) => {
            clip::first_init(state);
            Ok(())
        }
        (NodeAssetData::ConstFloat { .. }, NodeKind::ConstFloat)
        | (NodeAssetData::ConstBool { .. }, NodeKind::ConstBool)
        | (NodeAssetData::ParameterFloat { .. }, NodeKind::ParameterFloat(_))
        | (NodeAssetData::ParameterBool { .. }, NodeKind::ParameterBool(_)) => Ok(()),
        (
            NodeAssetData::Blend1d {
                source0,
                source1,
                weight,
            },
            NodeKind::Blend1d(state),
        ) => blend1d::first_init(def, rt, ctx, state, *source0, *source1, *weight),
        (NodeAssetData::State { child }, NodeKind::State(state)) => {
            state_node::first_init(def, rt, ctx, state, *child)
        }
        (NodeAssetData::Transition { .. }, NodeKind::Transition(state)) => {
            transition::first_init(ctx, state);
            Ok(())
        }
        (
            NodeAssetData::StateMachine {
                states,
                default_state,
            },
            NodeKind::StateMachine(state),
        ) => state_machine::first_init(def, rt, ctx, state, states, *default_state),
        _ => Err(GraphError::KindMismatch {
            index,
            expected: "matching asset",
        }),
    }
}

fn last_shutdown(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    node: &mut GraphNode,
) -> Result<(), GraphError> {
    // Teardown hooks must observe the node already reporting uninitialized.
    if node.lifecycle.is_initialized() {
        return Err(GraphError::StillInitialized(index));
    }
    match (asset_data(def, index)?, &mut node.kind) {
        (NodeAssetData::Clip { .. }, NodeKind::Clip(_))
        | (NodeAssetData::ConstFloat { .. }, NodeKind::ConstFloat)
        | (NodeAssetData::ConstBool { .. }, NodeKind::ConstBool)
        | (NodeAssetData::ParameterFloat { .. }, NodeKind::ParameterFloat(_))
        | (NodeAssetData::ParameterBool { .. }, NodeKind::ParameterBool(_)) => Ok(()),
        (
            NodeAssetData::Blend1d {
                source0,
                source1,
                weight,
            },
            NodeKind::Blend1d(state),
        ) => blend1d::last_shutdown(def, rt, ctx, state, *source0, *source1, *weight),
        (NodeAssetData::State { child }, NodeKind::State(_)) => {
            state_node::last_shutdown(def, rt, ctx, *child)
        }
        (NodeAssetData::Transition { .. }, NodeKind::Transition(state)) => {
            transition::last_shutdown(def, rt, ctx, state)
        }
        (NodeAssetData::StateMachine { states, .. }, NodeKind::StateMachine(state)) => {
            state_machine::last_shutdown(def, rt, ctx, state, states)
        }
        _ => Err(GraphError::KindMismatch {
            index,
            expected: "matching asset",
        }),
    }
}

/// Evaluate a pose-producing node into `out`. The node is marked active for
/// this frame before its variant logic runs.
pub fn evaluate_pose(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    let mut node = rt.take(index)?;
    node.lifecycle.mark_active(ctx.update_id);
    let res = match (asset_data(def, index), &mut node.kind) {
        (Err(e), _) => Err(e),
        (Ok(NodeAssetData::Clip { looping, .. }), NodeKind::Clip(state)) => {
            clip::evaluate(ctx, state, *looping, out);
            Ok(())
        }
        (
            Ok(NodeAssetData::Blend1d {
                source0,
                source1,
                weight,
            }),
            NodeKind::Blend1d(state),
        ) => blend1d::evaluate(def, rt, ctx, index, state, *source0, *source1, *weight, out),
        (Ok(NodeAssetData::State { child }), NodeKind::State(state)) => {
            state_node::evaluate(def, rt, ctx, state, *child, out)
        }
        (Ok(NodeAssetData::Transition { duration }), NodeKind::Transition(state)) => {
            transition::evaluate(def, rt, ctx, index, state, *duration, out)
        }
        (Ok(NodeAssetData::StateMachine { states, .. }), NodeKind::StateMachine(state)) => {
            state_machine::evaluate(def, rt, ctx, index, state, states, out)
        }
        _ => Err(GraphError::KindMismatch {
            index,
            expected: "pose",
        }),
    };
    rt.put(index, node);
    res
}

/// Evaluate a float value node.
pub fn eval_float(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
) -> Result<f32, GraphError> {
    let data = asset_data(def, index)?;
    let node = rt.get_mut(index).ok_or(GraphError::MissingNode(index))?;
    node.lifecycle.mark_active(ctx.update_id);
    match (data, &node.kind) {
        (NodeAssetData::ConstFloat { value }, NodeKind::ConstFloat) => Ok(*value),
        (NodeAssetData::ParameterFloat { .. }, NodeKind::ParameterFloat(state)) => Ok(state.value),
        _ => Err(GraphError::KindMismatch {
            index,
            expected: "float value",
        }),
    }
}

/// Evaluate a boolean value node.
pub fn eval_bool(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
) -> Result<bool, GraphError> {
    let data = asset_data(def, index)?;
    let node = rt.get_mut(index).ok_or(GraphError::MissingNode(index))?;
    node.lifecycle.mark_active(ctx.update_id);
    match (data, &node.kind) {
        (NodeAssetData::ConstBool { value }, NodeKind::ConstBool) => Ok(*value),
        (NodeAssetData::ParameterBool { .. }, NodeKind::ParameterBool(state)) => Ok(state.value),
        _ => Err(GraphError::KindMismatch {
            index,
            expected: "bool value",
        }),
    }
}
