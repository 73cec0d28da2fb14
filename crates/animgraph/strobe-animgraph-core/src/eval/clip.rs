//! Leaf pose producer sampling an external clip resource.

use crate::context::GraphContext;
use crate::nodes::{ClipState, PoseResult};

use super::fmod;

pub(crate) fn first_init(state: &mut ClipState) {
    state.time = 0.0;
    state.timing.reset();
}

/// Advance local time and sample the bound clip into `out`.
///
/// Time accumulates even without a bound resource; an unbound clip leaves
/// `out` untouched (the caller pre-seeds a sane default). Looping wraps time
/// into `[0, duration)`; non-looping time runs past the end and clamping is
/// left to the resource's sampler.
pub(crate) fn evaluate(
    ctx: &GraphContext,
    state: &mut ClipState,
    looping: bool,
    out: &mut PoseResult,
) {
    state.time += ctx.delta_time;

    let Some(clip) = state.clip.clone() else {
        return;
    };

    let duration = clip.duration();
    if looping && duration > 0.0 {
        state.time = fmod(state.time, duration);
    }

    state.timing.previous_time = state.timing.current_time;
    state.timing.current_time = state.time;
    state.timing.duration = duration;

    clip.sample(state.time, &mut out.pose);
}
