//! Canonical animation data model: animations, actuator curves, keys and tangents.
//!
//! Everything here is read-only once bound to a timeline, except the derived
//! parameters of `BezierAuto` tangents (see `tangents.rs`).

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::error::{LoadError, ValidationError};

/// How a curve leaves (right tangent) or approaches (left tangent) a key.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum TangentKind {
    Constant,
    #[default]
    Linear,
    Bezier,
    BezierAuto,
}

impl TangentKind {
    /// Numeric code forwarded to the actuator service.
    #[inline]
    pub fn code(self) -> u8 {
        match self {
            Self::Constant => 0,
            Self::Linear => 1,
            Self::Bezier => 2,
            Self::BezierAuto => 3,
        }
    }
}

/// Tangent handle. `abscissa` is in frames, `ordinate` in curve units.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Tangent {
    pub kind: TangentKind,
    #[serde(default)]
    pub abscissa: f32,
    #[serde(default)]
    pub ordinate: f32,
}

impl Tangent {
    pub fn new(kind: TangentKind, abscissa: f32, ordinate: f32) -> Self {
        Self {
            kind,
            abscissa,
            ordinate,
        }
    }

    pub fn linear() -> Self {
        Self::new(TangentKind::Linear, 0.0, 0.0)
    }

    pub fn auto() -> Self {
        Self::new(TangentKind::BezierAuto, 0.0, 0.0)
    }

    #[inline]
    pub fn is_auto(&self) -> bool {
        self.kind == TangentKind::BezierAuto
    }
}

/// A single authored sample.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Key {
    pub value: f32,
    #[serde(default)]
    pub left: Tangent,
    #[serde(default)]
    pub right: Tangent,
}

impl Key {
    pub fn new(value: f32, left: Tangent, right: Tangent) -> Self {
        Self { value, left, right }
    }

    /// Key with linear tangents on both sides.
    pub fn linear(value: f32) -> Self {
        Self::new(value, Tangent::linear(), Tangent::linear())
    }

    /// Key whose tangents are both derived from its neighbors.
    pub fn auto(value: f32) -> Self {
        Self::new(value, Tangent::auto(), Tangent::auto())
    }

    #[inline]
    pub fn has_auto_tangent(&self) -> bool {
        self.left.is_auto() || self.right.is_auto()
    }
}

/// Measurement unit of a curve's values.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Unit {
    Degree,
    Percent,
    #[default]
    Unspecified,
}

/// Keyframes for one actuator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ActuatorCurve {
    pub actuator: String,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub mute: bool,
    /// Keys indexed by frame; unique per frame and ordered.
    pub keys: BTreeMap<i32, Key>,
}

/// The keys bounding a frame on a curve.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Neighbors<'a> {
    pub left_frame: i32,
    pub left: &'a Key,
    pub right_frame: i32,
    pub right: &'a Key,
}

impl Neighbors<'_> {
    /// Both sides resolved to the same key: no interpolation needed.
    #[inline]
    pub fn is_single(&self) -> bool {
        self.left_frame == self.right_frame
    }
}

impl ActuatorCurve {
    pub fn new(actuator: impl Into<String>, unit: Unit) -> Self {
        Self {
            actuator: actuator.into(),
            unit,
            mute: false,
            keys: BTreeMap::new(),
        }
    }

    /// Builder-style key insertion (replaces any key already at `frame`).
    pub fn with_key(mut self, frame: i32, key: Key) -> Self {
        self.keys.insert(frame, key);
        self
    }

    pub fn first_key_frame(&self) -> Option<i32> {
        self.keys.keys().next().copied()
    }

    pub fn last_key_frame(&self) -> Option<i32> {
        self.keys.keys().next_back().copied()
    }

    /// Nearest left key (frame <= `frame`) and right key (frame > `frame`).
    /// - At or before the first key, both are the first key.
    /// - After the last key, both are the last key.
    pub fn neighbors(&self, frame: i32) -> Option<Neighbors<'_>> {
        let (&first_frame, first) = self.keys.iter().next()?;
        if frame <= first_frame {
            return Some(Neighbors {
                left_frame: first_frame,
                left: first,
                right_frame: first_frame,
                right: first,
            });
        }
        // A key exists at or below `frame` since frame > first_frame.
        let (&left_frame, left) = self.keys.range(..=frame).next_back()?;
        let (right_frame, right) = self
            .keys
            .range((Bound::Excluded(frame), Bound::Unbounded))
            .next()
            .map(|(f, k)| (*f, k))
            .unwrap_or((left_frame, left));
        Some(Neighbors {
            left_frame,
            left,
            right_frame,
            right,
        })
    }

    /// Keys at or after `frame`, in frame order.
    pub fn keys_from(&self, frame: i32) -> impl Iterator<Item = (i32, &Key)> + '_ {
        self.keys.range(frame..).map(|(f, k)| (*f, k))
    }
}

/// Strategy for actuators already driven by someone else.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ResourcePolicy {
    /// Dispatch unconditionally.
    #[default]
    Passive,
    /// Hold the frame until every actuator is free.
    Waiting,
    /// Preempt whatever is driving a busy actuator, then dispatch.
    Aggressive,
}

/// A motion sequence over a set of actuators.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Animation {
    pub name: String,
    pub fps: u32,
    #[serde(default)]
    pub start_frame: i32,
    /// `None` means unbound: playback ends on the last authored key.
    #[serde(default)]
    pub end_frame: Option<i32>,
    #[serde(default)]
    pub resources: ResourcePolicy,
    #[serde(default)]
    pub curves: Vec<ActuatorCurve>,
}

impl Animation {
    pub fn new(name: impl Into<String>, fps: u32) -> Self {
        Self {
            name: name.into(),
            fps,
            start_frame: 0,
            end_frame: None,
            resources: ResourcePolicy::Passive,
            curves: Vec::new(),
        }
    }

    pub fn with_curve(mut self, curve: ActuatorCurve) -> Self {
        self.curves.push(curve);
        self
    }

    /// Curves that take part in playback.
    pub fn active_curves(&self) -> impl Iterator<Item = &ActuatorCurve> + '_ {
        self.curves.iter().filter(|c| !c.mute)
    }

    /// Highest key frame across non-muted curves (0 when there are none).
    pub fn last_key_frame(&self) -> i32 {
        self.active_curves()
            .filter_map(ActuatorCurve::last_key_frame)
            .fold(0, i32::max)
    }

    /// Validate basic invariants (positive fps, non-negative frames, keys on live curves).
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.fps == 0 {
            return Err(ValidationError::ZeroFps {
                animation: self.name.clone(),
            });
        }
        if self.start_frame < 0 {
            return Err(ValidationError::NegativeStart {
                animation: self.name.clone(),
                frame: self.start_frame,
            });
        }
        if let Some(end) = self.end_frame {
            if end < self.start_frame {
                return Err(ValidationError::EndBeforeStart {
                    animation: self.name.clone(),
                    start: self.start_frame,
                    end,
                });
            }
        }
        for curve in &self.curves {
            if let Some(frame) = curve.first_key_frame().filter(|f| *f < 0) {
                return Err(ValidationError::NegativeKeyFrame {
                    actuator: curve.actuator.clone(),
                    frame,
                });
            }
            if !curve.mute && curve.keys.is_empty() {
                return Err(ValidationError::EmptyCurve {
                    actuator: curve.actuator.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Parse the serde form of [`Animation`] and validate it.
pub fn parse_animation_json(s: &str) -> Result<Animation, LoadError> {
    let animation: Animation = serde_json::from_str(s)?;
    animation.validate()?;
    Ok(animation)
}
