//! Automatic tangent synthesis for `BezierAuto` keys.
//!
//! Each auto key gets a slope `beta` derived from its neighbors: zero at local
//! extrema (and at the ends of a curve), the neighbor chord slope on monotonic
//! stretches, then scaled down so that the tangent handles never rise above
//! the neighbor values. Handles are one third of the distance to each neighbor.

use crate::data::{ActuatorCurve, Animation};

/// Handle length as a fraction of the distance to the neighbor key.
pub const AUTO_TANGENT_ALPHA: f32 = 1.0 / 3.0;

/// Slope of an auto tangent at (`frame`, `value`) given its neighbors as (frame, value).
/// A missing neighbor means the key is the first (or last) key of its curve.
pub fn auto_tangent_slope(
    frame: i32,
    value: f32,
    left: Option<(i32, f32)>,
    right: Option<(i32, f32)>,
) -> f32 {
    let alpha = AUTO_TANGENT_ALPHA;
    let (Some((left_frame, left_value)), Some((right_frame, right_value))) = (left, right) else {
        return 0.0;
    };
    let between = (value < right_value || value < left_value)
        && (value > right_value || value > left_value);
    if !between || frame < 0 || left_frame < 0 || right_frame < 0 {
        return 0.0;
    }

    let mut beta = (right_value - left_value) / (right_frame - left_frame) as f32;

    // anti-overshoot, right side then left side
    let height = alpha * (right_frame - frame) as f32 * beta;
    if height.abs() > (right_value - value).abs() {
        beta *= (right_value - value) / height;
    }
    let height = alpha * (frame - left_frame) as f32 * beta;
    if height.abs() > (value - left_value).abs() {
        beta *= (value - left_value) / height;
    }
    beta
}

/// Recompute the parameters of every `BezierAuto` tangent on a curve.
/// Keys with explicit tangents only are left untouched.
pub fn resolve_auto_tangents(curve: &mut ActuatorCurve) {
    let alpha = AUTO_TANGENT_ALPHA;
    let samples: Vec<(i32, f32)> = curve.keys.iter().map(|(f, k)| (*f, k.value)).collect();

    for (idx, &(frame, value)) in samples.iter().enumerate() {
        let Some(key) = curve.keys.get_mut(&frame) else {
            continue;
        };
        if !key.has_auto_tangent() {
            continue;
        }
        let left = idx.checked_sub(1).map(|i| samples[i]);
        let right = samples.get(idx + 1).copied();
        let beta = auto_tangent_slope(frame, value, left, right);

        let left_frame = left.map_or(frame, |(f, _)| f);
        let right_frame = right.map_or(frame, |(f, _)| f);

        if key.left.is_auto() {
            let span = (frame - left_frame) as f32;
            key.left.abscissa = -alpha * span;
            key.left.ordinate = -alpha * beta * span;
        }
        if key.right.is_auto() {
            let span = (right_frame - frame) as f32;
            key.right.abscissa = alpha * span;
            key.right.ordinate = alpha * beta * span;
        }
    }
}

/// Resolve auto tangents on every curve of an animation (muted curves included).
pub fn resolve_animation(animation: &mut Animation) {
    for curve in &mut animation.curves {
        resolve_auto_tangents(curve);
    }
}
