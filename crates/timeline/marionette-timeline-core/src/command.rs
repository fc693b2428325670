//! Motion command building and dispatch.
//!
//! Two modes:
//! - single frame: sample every curve at one frame and move there now (scrubbing)
//! - batched: hand the actuator service every remaining key so it interpolates on its own
//!
//! Batched dispatch goes through the animation's resource policy first.

use log::{debug, error, warn};

use crate::config::Config;
use crate::data::{ActuatorCurve, Key, ResourcePolicy, Tangent};
use crate::interp::SegmentLimits;
use crate::sampling::{evaluate_curve, motion_value, unit_scale};
use crate::services::{
    ActuatorService, BatchedCommand, BatchedKey, CommandToken, TangentParams,
};

/// What a dispatch attempt did.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DispatchOutcome {
    /// A command went out (or failed in the service and was logged).
    /// Batched commands carry their token when the service accepted them.
    Sent(Option<CommandToken>),
    /// Waiting policy and a busy actuator: nothing sent, retry next tick.
    Deferred,
    /// No actuator had anything left to do.
    Nothing,
}

impl DispatchOutcome {
    /// Whether the timeline may move on to the next frame.
    #[inline]
    pub fn advances(&self) -> bool {
        !matches!(self, Self::Deferred)
    }

    #[inline]
    pub fn token(&self) -> Option<CommandToken> {
        match self {
            Self::Sent(token) => *token,
            _ => None,
        }
    }
}

/// Borrowed view over a bound animation, able to build and send its commands.
pub struct CommandBuilder<'a> {
    pub session: &'a str,
    /// Non-muted curves with auto tangents already resolved.
    pub curves: &'a [ActuatorCurve],
    pub fps: u32,
    pub policy: ResourcePolicy,
    pub config: &'a Config,
    pub actuators: &'a dyn ActuatorService,
}

impl<'a> CommandBuilder<'a> {
    fn limits(&self) -> SegmentLimits {
        let (min, max) = self.config.value_bounds();
        SegmentLimits {
            min,
            max,
            max_step: self.config.max_step(self.fps),
        }
    }

    /// Move every actuator to its value at `frame` right away.
    pub fn dispatch_single(&self, frame: i32) -> DispatchOutcome {
        let limits = self.limits();
        let mut names = Vec::with_capacity(self.curves.len());
        let mut values = Vec::with_capacity(self.curves.len());
        for curve in self.curves {
            if let Some(v) = evaluate_curve(curve, frame, limits) {
                names.push(curve.actuator.clone());
                values.push(motion_value(curve, v));
            }
        }
        if names.is_empty() {
            return DispatchOutcome::Nothing;
        }

        if let Err(e) =
            self.actuators
                .dispatch_immediate(&names, &values, self.config.immediate_speed_fraction)
        {
            error!(
                "{}: immediate move to frame {} failed: {}",
                self.session, frame, e
            );
        }
        DispatchOutcome::Sent(None)
    }

    /// Collect the keys at or after `frame` for every curve that still has some.
    /// Curves without remaining keys are left out entirely; `None` when no curve remains.
    pub fn prepare_batched(&self, frame: i32) -> Option<BatchedCommand> {
        if self.fps == 0 {
            return None;
        }
        let fps = self.fps as f32;
        let mut command = BatchedCommand::default();
        for curve in self.curves {
            let scale = unit_scale(curve);
            let (times, keys): (Vec<f32>, Vec<BatchedKey>) = curve
                .keys_from(frame)
                .map(|(key_frame, key)| {
                    (
                        (key_frame - frame) as f32 / fps,
                        batched_key(key, scale, fps),
                    )
                })
                .unzip();
            if keys.is_empty() {
                continue;
            }
            command.push(curve.actuator.clone(), times, keys);
        }
        (!command.is_empty()).then_some(command)
    }

    /// Apply the resource policy, then dispatch.
    pub fn send_batched(&self, command: &BatchedCommand) -> DispatchOutcome {
        if self.policy != ResourcePolicy::Passive {
            match self.actuators.are_resources_available(&command.names) {
                Ok(true) => {}
                Ok(false) if self.policy == ResourcePolicy::Waiting => {
                    debug!("{}: actuators busy, waiting", self.session);
                    return DispatchOutcome::Deferred;
                }
                Ok(false) => {
                    warn!(
                        "{}: preempting tasks on {:?}",
                        self.session, command.names
                    );
                    if let Err(e) = self.actuators.preempt(&command.names) {
                        error!("{}: preempt failed: {}", self.session, e);
                    }
                }
                Err(e) => {
                    // keep reading the timeline without protection
                    error!("{}: resource query failed: {}", self.session, e);
                }
            }
        }

        match self.actuators.dispatch_batched(command) {
            Ok(token) => DispatchOutcome::Sent(Some(token)),
            Err(e) => {
                error!("{}: interpolation command failed: {}", self.session, e);
                DispatchOutcome::Sent(None)
            }
        }
    }

    /// Build and send the batched command for `frame`.
    pub fn dispatch_batched(&self, frame: i32) -> DispatchOutcome {
        match self.prepare_batched(frame) {
            Some(command) => self.send_batched(&command),
            None => DispatchOutcome::Nothing,
        }
    }
}

fn tangent_params(tangent: &Tangent, scale: f32, fps: f32) -> TangentParams {
    TangentParams {
        kind: tangent.kind.code(),
        time: tangent.abscissa / fps,
        value: tangent.ordinate * scale,
    }
}

fn batched_key(key: &Key, scale: f32, fps: f32) -> BatchedKey {
    BatchedKey {
        value: key.value * scale,
        left: tangent_params(&key.left, scale, fps),
        right: tangent_params(&key.right, scale, fps),
    }
}
