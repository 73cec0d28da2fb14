//! Two-input pose blend driven by a float value node.

use strobe_pose_core::{lerp, local_blend};

use crate::context::GraphContext;
use crate::error::GraphError;
use crate::nodes::{Blend1dState, PoseResult};
use crate::runtime::GraphRuntime;
use crate::spec::{GraphDefinition, NodeIndex};

use super::{eval_float, evaluate_pose, initialize_node, pose_timing, shutdown_node};

pub(crate) fn first_init(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    state: &mut Blend1dState,
    source0: Option<NodeIndex>,
    source1: Option<NodeIndex>,
    weight: Option<NodeIndex>,
) -> Result<(), GraphError> {
    state.timing.reset();
    state.source0_result = Some(PoseResult::new(&ctx.skeleton));
    state.source1_result = Some(PoseResult::new(&ctx.skeleton));
    for child in [source0, source1, weight].into_iter().flatten() {
        if rt.contains(child) {
            initialize_node(def, rt, ctx, child)?;
        }
    }
    Ok(())
}

pub(crate) fn last_shutdown(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    state: &mut Blend1dState,
    source0: Option<NodeIndex>,
    source1: Option<NodeIndex>,
    weight: Option<NodeIndex>,
) -> Result<(), GraphError> {
    for child in [source0, source1, weight].into_iter().flatten() {
        if rt.contains(child) {
            shutdown_node(def, rt, ctx, child)?;
        }
    }
    state.source0_result = None;
    state.source1_result = None;
    Ok(())
}

/// Blend the two child poses at the weight read from the value node.
///
/// Without a bound weight node the result passes through unchanged. With a
/// single bound source the node forwards that source's pose unweighted.
/// The weight is applied as-is; clamping is not this layer's job.
#[allow(clippy::too_many_arguments)]
pub(crate) fn evaluate(
    def: &GraphDefinition,
    rt: &mut GraphRuntime,
    ctx: &mut GraphContext,
    index: NodeIndex,
    state: &mut Blend1dState,
    source0: Option<NodeIndex>,
    source1: Option<NodeIndex>,
    weight: Option<NodeIndex>,
    out: &mut PoseResult,
) -> Result<(), GraphError> {
    let Some(weight_node) = weight.filter(|i| rt.contains(*i)) else {
        return Ok(());
    };
    let blend_weight = eval_float(def, rt, ctx, weight_node)?;

    let source0 = source0.filter(|i| rt.contains(*i));
    let source1 = source1.filter(|i| rt.contains(*i));

    match (source0, source1) {
        (None, _) => Ok(()),
        (Some(s0), None) => {
            evaluate_pose(def, rt, ctx, s0, out)?;
            state.timing = pose_timing(rt, s0).unwrap_or_default();
            Ok(())
        }
        (Some(s0), Some(s1)) => {
            let (Some(r0), Some(r1)) = (
                state.source0_result.as_mut(),
                state.source1_result.as_mut(),
            ) else {
                return Err(GraphError::NotInitialized(index));
            };
            evaluate_pose(def, rt, ctx, s0, r0)?;
            evaluate_pose(def, rt, ctx, s1, r1)?;
            local_blend(&r0.pose, &r1.pose, blend_weight, &mut out.pose);

            let t0 = pose_timing(rt, s0).unwrap_or_default();
            let t1 = pose_timing(rt, s1).unwrap_or_default();
            state.timing.previous_time = t0.previous_time;
            state.timing.current_time = t0.current_time;
            state.timing.duration = lerp(t0.duration, t1.duration, blend_weight);
            Ok(())
        }
    }
}
