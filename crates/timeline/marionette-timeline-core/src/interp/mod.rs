//! Interpolation helpers.
//!
//! Segments are cubic Bezier curves in (frame, value) space, sampled at every
//! integer frame and then clamped to value bounds and a per-frame slew limit.

pub mod functions;

pub use functions::{interpolate_segment, sample_segment, SegmentLimits};
