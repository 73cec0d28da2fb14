//! Blending utilities for poses.
//!
//! - f32 linear interpolation for positions and scales
//! - quaternion slerp (shortest-arc, nlerp fallback for near-parallel inputs)
//! - per-axis Euler blending along the shortest angular path
//! - `local_blend` writing the interpolated transforms into a result pose
//!
//! None of these helpers clamp the blend weight; callers own that invariant.

use crate::pose::Pose;

/// Linear interpolation for f32.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[inline]
pub fn lerp_vec3(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp(a[0], b[0], t),
        lerp(a[1], b[1], t),
        lerp(a[2], b[2], t),
    ]
}

/// Normalize a quaternion represented as [x, y, z, w].
#[inline]
fn normalize_quat(q: [f32; 4]) -> [f32; 4] {
    let mag = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if mag == 0.0 {
        [0.0, 0.0, 0.0, 1.0]
    } else {
        [q[0] / mag, q[1] / mag, q[2] / mag, q[3] / mag]
    }
}

/// Spherical interpolation between two quaternions q1, q2.
///
/// Takes the shortest arc: if the dot product is negative the second
/// quaternion is negated. Near-parallel inputs fall back to a normalized
/// lerp, where slerp's sin terms lose precision.
pub fn slerp(q1: [f32; 4], q2: [f32; 4], t: f32) -> [f32; 4] {
    let qa = normalize_quat(q1);
    let mut qb = normalize_quat(q2);

    let mut dot = qa[0] * qb[0] + qa[1] * qb[1] + qa[2] * qb[2] + qa[3] * qb[3];
    if dot < 0.0 {
        qb = [-qb[0], -qb[1], -qb[2], -qb[3]];
        dot = -dot;
    }

    const DOT_THRESHOLD: f32 = 0.9995;
    if dot > DOT_THRESHOLD {
        let res = [
            lerp(qa[0], qb[0], t),
            lerp(qa[1], qb[1], t),
            lerp(qa[2], qb[2], t),
            lerp(qa[3], qb[3], t),
        ];
        return normalize_quat(res);
    }

    let theta_0 = dot.clamp(-1.0, 1.0).acos();
    let theta = theta_0 * t;
    let sin_theta_0 = theta_0.sin();

    let s0 = (theta_0 - theta).sin() / sin_theta_0;
    let s1 = theta.sin() / sin_theta_0;

    [
        s0 * qa[0] + s1 * qb[0],
        s0 * qa[1] + s1 * qb[1],
        s0 * qa[2] + s1 * qb[2],
        s0 * qa[3] + s1 * qb[3],
    ]
}

/// Normalize an angle in degrees into [0, 360).
#[inline]
pub fn normalize_deg(a: f32) -> f32 {
    let m = a % 360.0;
    if m < 0.0 {
        m + 360.0
    } else {
        m
    }
}

/// Signed shortest angular difference from `a` to `b`, in (-180, 180].
#[inline]
pub fn shortest_angle_diff(a: f32, b: f32) -> f32 {
    let mut d = normalize_deg(b) - normalize_deg(a);
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// Interpolate between two angles (degrees) along the shortest path,
/// wrapping through the 0/360 boundary. Result is normalized into [0, 360).
#[inline]
pub fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    normalize_deg(a + shortest_angle_diff(a, b) * t)
}

/// Per-axis shortest-path interpolation of Euler angles (degrees).
#[inline]
pub fn lerp_euler(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        lerp_angle(a[0], b[0], t),
        lerp_angle(a[1], b[1], t),
        lerp_angle(a[2], b[2], t),
    ]
}

/// Blend `source` and `target` at `weight` into `out`, per bone:
/// positions and scales lerp, quaternions slerp, Euler angles take the
/// shortest angular path. All three poses must share a bone count.
pub fn local_blend(source: &Pose, target: &Pose, weight: f32, out: &mut Pose) {
    let count = out.bone_count();
    debug_assert_eq!(source.bone_count(), count);
    debug_assert_eq!(target.bone_count(), count);

    for i in 0..count {
        out.positions[i] = lerp_vec3(source.positions[i], target.positions[i], weight);
        out.rotations[i] = slerp(source.rotations[i], target.rotations[i], weight);
        out.eulers[i] = lerp_euler(source.eulers[i], target.eulers[i], weight);
        out.scales[i] = lerp_vec3(source.scales[i], target.scales[i], weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Skeleton;

    #[test]
    fn it_should_wrap_angle_interpolation_through_zero() {
        // Shortest path from 350° to 10° passes through 0°, not 180°.
        let mid = lerp_angle(350.0, 10.0, 0.5);
        assert!(mid.abs() < 1e-4, "expected 0°, got {mid}");
    }

    #[test]
    fn it_should_interpolate_angles_without_wraparound() {
        let mid = lerp_angle(10.0, 50.0, 0.25);
        assert!((mid - 20.0).abs() < 1e-4, "expected 20°, got {mid}");
    }

    #[test]
    fn it_should_normalize_negative_angles() {
        assert!((normalize_deg(-30.0) - 330.0).abs() < 1e-4);
        assert!((normalize_deg(720.0)).abs() < 1e-4);
    }

    #[test]
    fn it_should_take_shortest_arc_in_slerp() {
        let a = [0.0, 0.0, 0.0, 1.0];
        // Same orientation expressed with flipped sign; slerp must not swing
        // through the long arc.
        let b = [0.0, 0.0, 0.0, -1.0];
        let q = slerp(a, b, 0.5);
        let dot = q[0] * a[0] + q[1] * a[1] + q[2] * a[2] + q[3] * a[3];
        assert!(dot.abs() > 0.999, "expected identity-equivalent, got {q:?}");
    }

    #[test]
    fn it_should_slerp_halfway_between_distinct_rotations() {
        // 90° about Z and identity; halfway is 45° about Z.
        let half = (std::f32::consts::FRAC_PI_4 / 2.0).sin();
        let expected_w = (std::f32::consts::FRAC_PI_4 / 2.0).cos();
        let a = [0.0, 0.0, 0.0, 1.0];
        let b = [
            0.0,
            0.0,
            std::f32::consts::FRAC_PI_4.sin(),
            std::f32::consts::FRAC_PI_4.cos(),
        ];
        let q = slerp(a, b, 0.5);
        assert!((q[2] - half).abs() < 1e-4);
        assert!((q[3] - expected_w).abs() < 1e-4);
    }

    #[test]
    fn it_should_blend_poses_componentwise() {
        let skeleton = Skeleton::with_bone_count(2);
        let mut source = Pose::new(&skeleton);
        let mut target = Pose::new(&skeleton);
        let mut out = Pose::new(&skeleton);

        source.positions[0] = [0.0, 0.0, 0.0];
        target.positions[0] = [2.0, 4.0, -2.0];
        source.eulers[1] = [350.0, 0.0, 0.0];
        target.eulers[1] = [10.0, 0.0, 0.0];
        source.scales[0] = [1.0, 1.0, 1.0];
        target.scales[0] = [3.0, 1.0, 1.0];

        local_blend(&source, &target, 0.5, &mut out);

        assert_eq!(out.positions[0], [1.0, 2.0, -1.0]);
        assert!(out.eulers[1][0].abs() < 1e-4);
        assert_eq!(out.scales[0], [2.0, 1.0, 1.0]);
    }

    #[test]
    fn it_should_not_clamp_blend_weight() {
        let skeleton = Skeleton::with_bone_count(1);
        let source = Pose::new(&skeleton);
        let mut target = Pose::new(&skeleton);
        target.positions[0] = [1.0, 0.0, 0.0];
        let mut out = Pose::new(&skeleton);
        local_blend(&source, &target, 2.0, &mut out);
        assert_eq!(out.positions[0], [2.0, 0.0, 0.0]);
    }
}
