//! Core configuration for marionette-timeline-core.

use log::warn;
use serde::{Deserialize, Serialize};

/// Configuration for timeline sessions.
/// Every field has a default, so hosts may deserialize a partial document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Frame rate assumed before any animation is bound (drives the initial tick interval).
    pub default_fps: u32,

    /// Fraction of maximum actuator speed used for single-frame (scrub) moves.
    pub immediate_speed_fraction: f32,

    /// Maximum value change per second, in curve units. `None` disables the slew clamp.
    pub speed_limit: Option<f32>,

    /// Optional clamp applied to interpolated values.
    pub value_min: Option<f32>,
    pub value_max: Option<f32>,

    /// Name of the worker thread spawned by `Timeline::spawn`.
    pub thread_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_fps: 25,
            immediate_speed_fraction: 0.25,
            speed_limit: None,
            value_min: None,
            value_max: None,
            thread_name: "marionette-timeline".to_string(),
        }
    }
}

impl Config {
    /// Per-frame slew limit for the given frame rate.
    pub fn max_step(&self, fps: u32) -> f32 {
        match self.speed_limit {
            Some(limit) if fps > 0 && limit > 0.0 => limit / fps as f32,
            Some(limit) if limit.is_nan() || limit <= 0.0 => {
                warn!("ignoring non-positive speed limit {limit}");
                f32::MAX
            }
            _ => f32::MAX,
        }
    }

    /// Clamp bounds for interpolated values, always with `min <= max`.
    /// A NaN bound is ignored and an inverted pair is swapped.
    pub fn value_bounds(&self) -> (f32, f32) {
        let min = match self.value_min {
            Some(v) if v.is_nan() => {
                warn!("ignoring NaN value_min");
                -f32::MAX
            }
            Some(v) => v,
            None => -f32::MAX,
        };
        let max = match self.value_max {
            Some(v) if v.is_nan() => {
                warn!("ignoring NaN value_max");
                f32::MAX
            }
            Some(v) => v,
            None => f32::MAX,
        };
        if min > max {
            warn!("value_min {min} is above value_max {max}, swapping");
            return (max, min);
        }
        (min, max)
    }
}
