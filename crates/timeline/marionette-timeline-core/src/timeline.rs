//! Playback state machine.
//!
//! `TimelineState` owns the playback position of one bound animation and is
//! driven by `update()` once per frame interval. It is a plain owned object:
//! the scheduler (`scheduler.rs`) serializes every call on its worker thread.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::command::{CommandBuilder, DispatchOutcome};
use crate::config::Config;
use crate::data::{ActuatorCurve, Animation, ResourcePolicy};
use crate::services::{ActuatorService, CommandToken, PositionChannel, IDLE_FRAME};
use crate::tangents::resolve_animation;

const DEFAULT_NAME: &str = "Timeline";

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Result of one `update()` call.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TickOutcome {
    /// Keep ticking.
    Continue,
    /// The playback ran off its bounds and rewound; stop ticking.
    Finished,
}

/// Observable state of a timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimelineSnapshot {
    pub name: String,
    pub state: PlaybackState,
    pub enabled: bool,
    pub fps: u32,
    pub start_frame: i32,
    pub end_frame: i32,
    pub current_frame: i32,
    pub pending_command: Option<CommandToken>,
    pub resources: ResourcePolicy,
    pub frame_interval_ms: u64,
}

/// Tick interval for a frame rate (whole milliseconds, at least one).
pub fn frame_interval(fps: u32) -> Duration {
    if fps == 0 {
        return Duration::from_millis(1000);
    }
    Duration::from_millis(u64::from(1000 / fps).max(1))
}

pub struct TimelineState {
    config: Config,
    actuators: Arc<dyn ActuatorService>,
    position: Arc<dyn PositionChannel>,

    name: String,
    /// Non-muted curves of the bound animation, auto tangents resolved.
    curves: Vec<ActuatorCurve>,
    fps: u32,
    enabled: bool,
    start_frame: i32,
    end_frame: i32,
    current_frame: i32,
    resources: ResourcePolicy,
    pending: Option<CommandToken>,
    state: PlaybackState,
    interval: Duration,
}

impl TimelineState {
    pub fn new(
        config: Config,
        actuators: Arc<dyn ActuatorService>,
        position: Arc<dyn PositionChannel>,
    ) -> Self {
        Self {
            interval: frame_interval(config.default_fps),
            config,
            actuators,
            position,
            name: DEFAULT_NAME.to_string(),
            curves: Vec::new(),
            fps: 0,
            enabled: false,
            start_frame: 0,
            end_frame: 0,
            current_frame: 0,
            resources: ResourcePolicy::Passive,
            pending: None,
            state: PlaybackState::Stopped,
        }
    }

    fn builder(&self) -> CommandBuilder<'_> {
        CommandBuilder {
            session: &self.name,
            curves: &self.curves,
            fps: self.fps,
            policy: self.resources,
            config: &self.config,
            actuators: self.actuators.as_ref(),
        }
    }

    /// Cancel the in-flight interpolation command, if any.
    fn kill_motion_orders(&mut self) {
        if let Some(token) = self.pending.take() {
            if let Err(e) = self.actuators.cancel(token) {
                error!("{}: cancelling command {:?} failed: {}", self.name, token, e);
            }
        }
    }

    fn publish(&self, frame: i32) {
        if self.name.is_empty() {
            return;
        }
        if let Err(e) = self.position.publish(&self.name, frame) {
            error!("{}: publishing frame {} failed: {}", self.name, frame, e);
        }
    }

    /// Start (or resume) ticking.
    /// A disabled or zero-fps timeline does not play, but nudges off its start
    /// frame so that a later play is not a no-op.
    pub fn play(&mut self) {
        if !self.enabled || self.fps == 0 {
            if self.current_frame == self.start_frame {
                self.current_frame = self.current_frame.saturating_add(1);
            }
            debug!("{}: play ignored (enabled={}, fps={})", self.name, self.enabled, self.fps);
            return;
        }
        if self.state != PlaybackState::Playing {
            debug!("{}: play from frame {}", self.name, self.current_frame);
            self.state = PlaybackState::Playing;
        }
    }

    pub fn pause(&mut self) {
        debug!("{}: pause at frame {}", self.name, self.current_frame);
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
        self.kill_motion_orders();
    }

    pub fn stop(&mut self) {
        debug!("{}: stop", self.name);
        self.state = PlaybackState::Stopped;
        self.kill_motion_orders();
        self.current_frame = self.start_frame;
    }

    /// Jump to `frame`; the next tick sends a fresh command from there.
    pub fn go_to(&mut self, frame: i32) {
        if !self.enabled {
            return;
        }
        debug!("{}: go to frame {}", self.name, frame);
        self.current_frame = frame;
        self.kill_motion_orders();
    }

    /// Adopt a new animation. Invalid animations are rejected and the
    /// previous one stays bound.
    pub fn bind(&mut self, mut animation: Animation) {
        if let Err(e) = animation.validate() {
            warn!("{}: refusing to bind '{}': {}", self.name, animation.name, e);
            return;
        }
        if self.state != PlaybackState::Stopped {
            self.stop();
        }
        self.kill_motion_orders();
        self.curves.clear();

        resolve_animation(&mut animation);
        let last_key_frame = animation.last_key_frame();

        self.name = animation.name;
        self.fps = animation.fps;
        self.enabled = true;
        self.start_frame = animation.start_frame;
        self.end_frame = animation.end_frame.unwrap_or(last_key_frame);
        self.current_frame = self.start_frame;
        self.interval = frame_interval(self.fps);
        self.resources = animation.resources;
        self.curves = animation.curves.into_iter().filter(|c| !c.mute).collect();

        debug!(
            "{}: bound {} curves, frames {}..{} at {} fps",
            self.name,
            self.curves.len(),
            self.start_frame,
            self.end_frame,
            self.fps
        );
    }

    /// One scheduler tick.
    pub fn update(&mut self) -> TickOutcome {
        if !self.enabled {
            return TickOutcome::Continue;
        }

        if self.current_frame >= self.end_frame || self.current_frame < self.start_frame {
            self.publish(self.current_frame);
            self.current_frame = self.start_frame;
            self.kill_motion_orders();
            self.state = PlaybackState::Stopped;
            debug!("{}: done", self.name);
            return TickOutcome::Finished;
        }

        let playing = self.state.is_playing();
        let advance = match self.pending {
            // the command already in flight covers this frame
            Some(_) => true,
            None => {
                let outcome = if playing {
                    self.builder().dispatch_batched(self.current_frame)
                } else {
                    self.builder().dispatch_single(self.current_frame)
                };
                if let DispatchOutcome::Sent(Some(token)) = outcome {
                    self.pending = Some(token);
                }
                outcome.advances()
            }
        };
        if advance && playing {
            self.current_frame += 1;
        }
        TickOutcome::Continue
    }

    /// Set the session name; a non-empty name is announced as idle.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.publish(IDLE_FRAME);
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.fps = fps;
        if fps > 0 {
            self.interval = frame_interval(fps);
        }
    }

    /// Negative frames are ignored.
    pub fn set_current_frame(&mut self, frame: i32) {
        if frame < 0 {
            return;
        }
        self.current_frame = frame;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn current_frame(&self) -> i32 {
        self.current_frame
    }

    pub fn start_frame(&self) -> i32 {
        self.start_frame
    }

    pub fn end_frame(&self) -> i32 {
        self.end_frame
    }

    /// Number of frames between start and end.
    pub fn size(&self) -> i32 {
        self.end_frame - self.start_frame
    }

    pub fn pending_command(&self) -> Option<CommandToken> {
        self.pending
    }

    pub fn resource_policy(&self) -> ResourcePolicy {
        self.resources
    }

    pub fn frame_interval(&self) -> Duration {
        self.interval
    }

    pub fn curves(&self) -> &[ActuatorCurve] {
        &self.curves
    }

    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            name: self.name.clone(),
            state: self.state,
            enabled: self.enabled,
            fps: self.fps,
            start_frame: self.start_frame,
            end_frame: self.end_frame,
            current_frame: self.current_frame,
            pending_command: self.pending,
            resources: self.resources,
            frame_interval_ms: self.interval.as_millis() as u64,
        }
    }
}

impl Drop for TimelineState {
    fn drop(&mut self) {
        self.kill_motion_orders();
    }
}
