//! Error types for animation validation and loading.

use thiserror::Error;

/// Broken invariants in an [`Animation`](crate::data::Animation).
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("animation '{animation}' has a zero frame rate")]
    ZeroFps { animation: String },

    #[error("animation '{animation}' starts at negative frame {frame}")]
    NegativeStart { animation: String, frame: i32 },

    #[error("animation '{animation}' ends at frame {end}, before its start frame {start}")]
    EndBeforeStart {
        animation: String,
        start: i32,
        end: i32,
    },

    #[error("curve '{actuator}' has a key at negative frame {frame}")]
    NegativeKeyFrame { actuator: String, frame: i32 },

    #[error("curve '{actuator}' is not muted but has no keys")]
    EmptyCurve { actuator: String },
}

/// Failure to turn a JSON document into a valid animation.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("animation json parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
