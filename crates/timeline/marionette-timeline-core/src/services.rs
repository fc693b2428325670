//! Contracts of the external services a timeline drives.
//!
//! Implementations live outside this crate (actuator control, position
//! broadcast). Every call may fail; the timeline logs failures and keeps going.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame published when a session is named but not playing.
pub const IDLE_FRAME: i32 = -1;

/// Opaque identifier of a batched motion command accepted by the actuator service.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CommandToken(pub u64);

#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("{service} is unavailable")]
    Unavailable { service: String },
    #[error("request rejected: {reason}")]
    Rejected { reason: String },
    #[error("transport error: {0}")]
    Transport(String),
}

/// Tangent of a batched key, in seconds and actuator units.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TangentParams {
    pub kind: u8,
    pub time: f32,
    pub value: f32,
}

/// One key of a batched command.
#[derive(Copy, Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BatchedKey {
    pub value: f32,
    pub left: TangentParams,
    pub right: TangentParams,
}

/// Interpolation command covering the remaining keys of several actuators.
/// `times[i]` and `keys[i]` belong to `names[i]`; times are seconds from now.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct BatchedCommand {
    pub names: Vec<String>,
    pub times: Vec<Vec<f32>>,
    pub keys: Vec<Vec<BatchedKey>>,
}

impl BatchedCommand {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn push(&mut self, name: String, times: Vec<f32>, keys: Vec<BatchedKey>) {
        self.names.push(name);
        self.times.push(times);
        self.keys.push(keys);
    }
}

/// Motion control service.
pub trait ActuatorService: Send + Sync {
    /// Whether nothing else currently drives any of `names`.
    fn are_resources_available(&self, names: &[String]) -> Result<bool, ServiceError>;

    /// Kill whatever task currently drives any of `names`.
    fn preempt(&self, names: &[String]) -> Result<(), ServiceError>;

    /// Move each actuator to its value now, at `speed_fraction` of its maximum speed.
    fn dispatch_immediate(
        &self,
        names: &[String],
        values: &[f32],
        speed_fraction: f32,
    ) -> Result<(), ServiceError>;

    /// Start an interpolation command; the token identifies it until it completes or is cancelled.
    fn dispatch_batched(&self, command: &BatchedCommand) -> Result<CommandToken, ServiceError>;

    fn cancel(&self, token: CommandToken) -> Result<(), ServiceError>;
}

/// Observation channel receiving playback positions, fire-and-forget.
pub trait PositionChannel: Send + Sync {
    fn publish(&self, session: &str, frame: i32) -> Result<(), ServiceError>;
}
