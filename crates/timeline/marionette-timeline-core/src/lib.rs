//! Marionette Timeline Core
//!
//! Frame-clocked playback of keyframed actuator animations. An animation is a
//! set of per-actuator Bezier curves; a timeline turns it into motion commands
//! (one batched interpolation command while playing, immediate moves while
//! scrubbing) and reports its playback position.

pub mod command;
pub mod config;
pub mod data;
pub mod error;
pub mod interp;
pub mod sampling;
pub mod scheduler;
pub mod services;
pub mod tangents;
pub mod timeline;

// Re-exports for hosts
pub use command::{CommandBuilder, DispatchOutcome};
pub use config::Config;
pub use data::{
    parse_animation_json, ActuatorCurve, Animation, Key, ResourcePolicy, Tangent, TangentKind,
    Unit,
};
pub use error::{LoadError, ValidationError};
pub use interp::SegmentLimits;
pub use sampling::evaluate_curve;
pub use scheduler::Timeline;
pub use services::{
    ActuatorService, BatchedCommand, BatchedKey, CommandToken, PositionChannel, ServiceError,
    TangentParams, IDLE_FRAME,
};
pub use tangents::resolve_auto_tangents;
pub use timeline::{PlaybackState, TickOutcome, TimelineSnapshot, TimelineState};
