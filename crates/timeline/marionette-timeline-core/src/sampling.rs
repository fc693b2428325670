//! Curve sampling for the frame-indexed actuator model.
//!
//! Model:
//! - A frame on or before the first key samples the first key.
//! - A frame on or after the last key samples the last key.
//! - Otherwise the segment between the bounding keys is interpolated
//!   (see `interp::functions`) and the sample at the frame offset is returned.
//!
//! Values come out in curve units; `unit_scale` converts them for the actuator service.

use crate::data::{ActuatorCurve, Unit};
use crate::interp::{sample_segment, SegmentLimits};

/// Actuators whose unspecified unit predates the unit field and means "ratio", not degrees.
const LEGACY_RATIO_ACTUATORS: [&str; 2] = ["LHand", "RHand"];

/// Sample a curve at `frame`. Returns `None` for a curve without keys.
pub fn evaluate_curve(curve: &ActuatorCurve, frame: i32, limits: SegmentLimits) -> Option<f32> {
    let n = curve.neighbors(frame)?;
    if n.is_single() {
        return Some(n.left.value);
    }
    let span = n.right_frame - n.left_frame;
    let offset = (frame - n.left_frame) as usize;
    Some(sample_segment(span, n.left, n.right, limits, offset))
}

/// Factor from curve units to actuator units.
pub fn unit_scale(curve: &ActuatorCurve) -> f32 {
    match curve.unit {
        Unit::Degree => 1f32.to_radians(),
        Unit::Percent => 1.0,
        Unit::Unspecified => {
            if LEGACY_RATIO_ACTUATORS.contains(&curve.actuator.as_str()) {
                1.0
            } else {
                1f32.to_radians()
            }
        }
    }
}

/// Convert a curve value to the value sent to the actuator.
#[inline]
pub fn motion_value(curve: &ActuatorCurve, value: f32) -> f32 {
    value * unit_scale(curve)
}
