//! Segment interpolation:
//! - control polygon from the bounding keys' tangents
//! - x(t) inversion by binary search, y(t) sampled per integer frame
//! - min/max clamp then slew clamp

use crate::data::{Key, Tangent, TangentKind};

/// Output constraints for an interpolated segment.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SegmentLimits {
    pub min: f32,
    pub max: f32,
    /// Largest change allowed between two consecutive frames.
    pub max_step: f32,
}

impl Default for SegmentLimits {
    fn default() -> Self {
        Self {
            min: -f32::MAX,
            max: f32::MAX,
            max_step: f32::MAX,
        }
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Handle leaving the left key, as an offset from it.
fn outgoing_handle(tangent: &Tangent, span: f32, delta: f32) -> (f32, f32) {
    match tangent.kind {
        TangentKind::Linear | TangentKind::Constant => (span / 3.0, delta / 3.0),
        TangentKind::Bezier | TangentKind::BezierAuto => {
            clamp_handle(tangent.abscissa, tangent.ordinate, span)
        }
    }
}

/// Handle arriving at the right key, as an offset from it (abscissa <= 0).
fn incoming_handle(tangent: &Tangent, span: f32, delta: f32) -> (f32, f32) {
    match tangent.kind {
        TangentKind::Linear => (-span / 3.0, -delta / 3.0),
        TangentKind::Constant => (0.0, 0.0),
        TangentKind::Bezier | TangentKind::BezierAuto => {
            let (x, y) = clamp_handle(-tangent.abscissa, -tangent.ordinate, span);
            (-x, -y)
        }
    }
}

/// Keep a handle inside the segment so x(t) stays monotonic; the handle
/// direction is preserved when it has to be shortened.
fn clamp_handle(x: f32, y: f32, span: f32) -> (f32, f32) {
    if x <= 0.0 {
        (0.0, y)
    } else if x > span {
        (span, y * span / x)
    } else {
        (x, y)
    }
}

/// Solve x(t) = x on [0, 1] for a monotonic cubic.
fn solve_t(x: f32, x1: f32, x2: f32, x3: f32) -> f32 {
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = (x / x3).clamp(0.0, 1.0);
    for _ in 0..32 {
        let at = cubic_bezier(0.0, x1, x2, x3, mid);
        if (at - x).abs() < 1e-5 {
            break;
        }
        if at < x {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    mid
}

/// Unclamped Bezier between two keys, sampled at integer frame offsets.
struct Segment {
    /// Index of the right key's sample.
    last: usize,
    v0: f32,
    v3: f32,
    hold: bool,
    x1: f32,
    x2: f32,
    x3: f32,
    y1: f32,
    y2: f32,
}

impl Segment {
    fn new(span: i32, left: &Key, right: &Key) -> Self {
        let s = span as f32;
        let (v0, v3) = (left.value, right.value);
        let delta = v3 - v0;
        let (hx1, hy1) = outgoing_handle(&left.right, s, delta);
        let (hx2, hy2) = incoming_handle(&right.left, s, delta);
        Self {
            last: span as usize,
            v0,
            v3,
            hold: left.right.kind == TangentKind::Constant,
            x1: hx1,
            x2: s + hx2,
            x3: s,
            y1: v0 + hy1,
            y2: v3 + hy2,
        }
    }

    fn raw(&self, i: usize) -> f32 {
        if i == 0 {
            return self.v0;
        }
        if i >= self.last {
            return self.v3;
        }
        if self.hold {
            return self.v0;
        }
        let t = solve_t(i as f32, self.x1, self.x2, self.x3);
        cubic_bezier(self.v0, self.y1, self.y2, self.v3, t)
    }
}

/// `min`/`max` clamp that never panics, even on NaN bounds.
#[inline]
fn clamp_value(v: f32, limits: &SegmentLimits) -> f32 {
    v.max(limits.min).min(limits.max)
}

/// Clamp then slew-limit against the previous output sample.
fn limit_sample(v: f32, prev: Option<f32>, limits: &SegmentLimits) -> f32 {
    let v = clamp_value(v, limits);
    match prev {
        Some(p) if v - p > limits.max_step => p + limits.max_step,
        Some(p) if v - p < -limits.max_step => p - limits.max_step,
        _ => v,
    }
}

/// Sample the segment between two keys `span` frames apart at every integer
/// frame offset `0..=span`. The first sample is the left key's value.
pub fn interpolate_segment(span: i32, left: &Key, right: &Key, limits: SegmentLimits) -> Vec<f32> {
    if span <= 0 {
        return vec![clamp_value(left.value, &limits)];
    }
    let segment = Segment::new(span, left, right);
    let mut prev = None;
    (0..=segment.last)
        .map(|i| {
            let v = limit_sample(segment.raw(i), prev, &limits);
            prev = Some(v);
            v
        })
        .collect()
}

/// Single sample of the same segment at `offset` (clamped to `span`).
/// Without a slew limit only that frame is evaluated; with one, only the
/// frames up to `offset`.
pub fn sample_segment(
    span: i32,
    left: &Key,
    right: &Key,
    limits: SegmentLimits,
    offset: usize,
) -> f32 {
    if span <= 0 {
        return clamp_value(left.value, &limits);
    }
    let segment = Segment::new(span, left, right);
    let offset = offset.min(segment.last);
    if limits.max_step >= f32::MAX {
        return clamp_value(segment.raw(offset), &limits);
    }
    (0..=offset)
        .fold(None, |prev, i| {
            Some(limit_sample(segment.raw(i), prev, &limits))
        })
        .unwrap_or(left.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32, eps: f32) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    #[test]
    fn linear_segment_is_a_straight_line() {
        let out = interpolate_segment(
            10,
            &Key::linear(0.0),
            &Key::linear(90.0),
            SegmentLimits::default(),
        );
        assert_eq!(out.len(), 11);
        for (i, v) in out.iter().enumerate() {
            approx(*v, 9.0 * i as f32, 1e-2);
        }
    }

    #[test]
    fn endpoints_are_exact() {
        let left = Key::new(
            1.25,
            Tangent::linear(),
            Tangent::new(TangentKind::Bezier, 4.0, 10.0),
        );
        let right = Key::new(
            -3.5,
            Tangent::new(TangentKind::Bezier, -2.0, 6.0),
            Tangent::linear(),
        );
        let out = interpolate_segment(7, &left, &right, SegmentLimits::default());
        assert_eq!(out[0], 1.25);
        assert_eq!(out[7], -3.5);
    }

    #[test]
    fn flat_handles_ease_in_and_out() {
        let flat_out = Tangent::new(TangentKind::Bezier, 10.0 / 3.0, 0.0);
        let flat_in = Tangent::new(TangentKind::Bezier, -10.0 / 3.0, 0.0);
        let left = Key::new(0.0, Tangent::linear(), flat_out);
        let right = Key::new(10.0, flat_in, Tangent::linear());
        let out = interpolate_segment(10, &left, &right, SegmentLimits::default());
        // symmetric ease: slow at both ends, midpoint exact
        approx(out[5], 5.0, 1e-3);
        assert!(out[1] < 1.0);
        assert!(out[9] > 9.0);
        assert!(out.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn constant_holds_until_next_key() {
        let mut left = Key::linear(2.0);
        left.right = Tangent::new(TangentKind::Constant, 0.0, 0.0);
        let out = interpolate_segment(4, &left, &Key::linear(8.0), SegmentLimits::default());
        assert_eq!(out, vec![2.0, 2.0, 2.0, 2.0, 8.0]);
    }

    #[test]
    fn slew_limit_caps_each_step() {
        let limits = SegmentLimits {
            max_step: 5.0,
            ..SegmentLimits::default()
        };
        let out = interpolate_segment(4, &Key::linear(0.0), &Key::linear(100.0), limits);
        assert_eq!(out, vec![0.0, 5.0, 10.0, 15.0, 20.0]);
    }

    #[test]
    fn bounds_clamp_values() {
        let limits = SegmentLimits {
            min: 0.0,
            max: 30.0,
            ..SegmentLimits::default()
        };
        let out = interpolate_segment(4, &Key::linear(0.0), &Key::linear(100.0), limits);
        assert!(out.iter().all(|v| (0.0..=30.0).contains(v)));
        assert_eq!(out[4], 30.0);
    }

    #[test]
    fn single_sample_matches_full_segment() {
        let left = Key::new(
            1.25,
            Tangent::linear(),
            Tangent::new(TangentKind::Bezier, 4.0, 10.0),
        );
        let right = Key::new(
            -3.5,
            Tangent::new(TangentKind::Bezier, -2.0, 6.0),
            Tangent::linear(),
        );
        for limits in [
            SegmentLimits::default(),
            SegmentLimits {
                min: -2.0,
                max: 4.0,
                max_step: 0.75,
            },
        ] {
            let full = interpolate_segment(9, &left, &right, limits);
            for (offset, v) in full.iter().enumerate() {
                assert_eq!(sample_segment(9, &left, &right, limits, offset), *v);
            }
            assert_eq!(sample_segment(9, &left, &right, limits, 40), full[9]);
        }
    }

    #[test]
    fn inverted_or_nan_bounds_do_not_panic() {
        let inverted = SegmentLimits {
            min: 10.0,
            max: 0.0,
            ..SegmentLimits::default()
        };
        let out = interpolate_segment(4, &Key::linear(0.0), &Key::linear(8.0), inverted);
        assert_eq!(out.len(), 5);
        let nan = SegmentLimits {
            min: f32::NAN,
            max: f32::NAN,
            ..SegmentLimits::default()
        };
        assert_eq!(sample_segment(4, &Key::linear(0.0), &Key::linear(8.0), nan, 4), 8.0);
    }

    #[test]
    fn oversized_handle_is_shortened() {
        assert_eq!(clamp_handle(20.0, 4.0, 10.0), (10.0, 2.0));
        assert_eq!(clamp_handle(-1.0, 4.0, 10.0), (0.0, 4.0));
        assert_eq!(clamp_handle(3.0, 4.0, 10.0), (3.0, 4.0));
    }
}
