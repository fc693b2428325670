#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use marionette_timeline_core::{
    parse_animation_json, ActuatorService, Animation, BatchedCommand, CommandToken, Config,
    PositionChannel, ServiceError, TimelineState,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Query(Vec<String>),
    Preempt(Vec<String>),
    Immediate {
        names: Vec<String>,
        values: Vec<f32>,
        speed: f32,
    },
    Batched(BatchedCommand),
    Cancel(CommandToken),
}

/// Actuator service double recording every call.
#[derive(Default)]
pub struct RecordingActuators {
    /// Number of upcoming availability queries answering "busy".
    busy_for: AtomicUsize,
    next_token: AtomicU64,
    live: Mutex<HashSet<CommandToken>>,
    overlaps: AtomicUsize,
    fail_preempt: AtomicBool,
    fail_cancel: AtomicBool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingActuators {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn busy_for(queries: usize) -> Arc<Self> {
        let actuators = Self::default();
        actuators.busy_for.store(queries, Ordering::SeqCst);
        Arc::new(actuators)
    }

    /// Make every later `preempt` call fail.
    pub fn fail_preempt(&self) {
        self.fail_preempt.store(true, Ordering::SeqCst);
    }

    /// Make every later `cancel` call fail.
    pub fn fail_cancel(&self) {
        self.fail_cancel.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls").clone()
    }

    pub fn batched(&self) -> Vec<BatchedCommand> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Batched(cmd) => Some(cmd),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<CommandToken> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Cancel(token) => Some(token),
                _ => None,
            })
            .collect()
    }

    pub fn queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Query(_)))
            .count()
    }

    /// Batched commands sent while another one was still live.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("calls").push(call);
    }
}

impl ActuatorService for RecordingActuators {
    fn are_resources_available(&self, names: &[String]) -> Result<bool, ServiceError> {
        self.record(Call::Query(names.to_vec()));
        let busy = self
            .busy_for
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        Ok(!busy)
    }

    fn preempt(&self, names: &[String]) -> Result<(), ServiceError> {
        self.record(Call::Preempt(names.to_vec()));
        if self.fail_preempt.load(Ordering::SeqCst) {
            return Err(ServiceError::Rejected {
                reason: "preemption refused".into(),
            });
        }
        Ok(())
    }

    fn dispatch_immediate(
        &self,
        names: &[String],
        values: &[f32],
        speed_fraction: f32,
    ) -> Result<(), ServiceError> {
        self.record(Call::Immediate {
            names: names.to_vec(),
            values: values.to_vec(),
            speed: speed_fraction,
        });
        Ok(())
    }

    fn dispatch_batched(&self, command: &BatchedCommand) -> Result<CommandToken, ServiceError> {
        self.record(Call::Batched(command.clone()));
        let token = CommandToken(self.next_token.fetch_add(1, Ordering::SeqCst) + 1);
        let mut live = self.live.lock().expect("live");
        if !live.is_empty() {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        live.insert(token);
        Ok(token)
    }

    fn cancel(&self, token: CommandToken) -> Result<(), ServiceError> {
        self.record(Call::Cancel(token));
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(ServiceError::Transport("motion bus down".into()));
        }
        self.live.lock().expect("live").remove(&token);
        Ok(())
    }
}

/// Position channel double.
#[derive(Default)]
pub struct RecordingPositions {
    published: Mutex<Vec<(String, i32)>>,
    fail: AtomicBool,
}

impl RecordingPositions {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every later publish fail (after recording the attempt).
    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(String, i32)> {
        self.published.lock().expect("positions").clone()
    }
}

impl PositionChannel for RecordingPositions {
    fn publish(&self, session: &str, frame: i32) -> Result<(), ServiceError> {
        self.published
            .lock()
            .expect("positions")
            .push((session.to_string(), frame));
        if self.fail.load(Ordering::SeqCst) {
            return Err(ServiceError::Unavailable {
                service: "position channel".into(),
            });
        }
        Ok(())
    }
}

pub fn fixture(name: &str) -> Animation {
    let json = marionette_test_fixtures::animations::json(name).expect("fixture json");
    parse_animation_json(&json).expect("valid fixture")
}

pub fn timeline(
    actuators: &Arc<RecordingActuators>,
    positions: &Arc<RecordingPositions>,
) -> TimelineState {
    TimelineState::new(Config::default(), actuators.clone(), positions.clone())
}

pub fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}
