//! Worker thread driving a [`TimelineState`] at its frame rate.
//!
//! The worker owns the state. Handles talk to it with [`Command`] messages and
//! wait for an acknowledgement, so every handle call returns once the state has
//! settled: after `pause()` returns no tick is running and none will issue a
//! motion command. Ticks come from `crossbeam_channel::tick` while playing and
//! from `never()` otherwise.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, never, tick, unbounded, Receiver, Sender};
use log::{debug, error, warn};

use crate::config::Config;
use crate::data::Animation;
use crate::services::{ActuatorService, PositionChannel};
use crate::timeline::{TickOutcome, TimelineSnapshot, TimelineState};

enum Command {
    Play { resp_tx: Sender<()> },
    Pause { resp_tx: Sender<()> },
    Stop { resp_tx: Sender<()> },
    GoTo { frame: i32, resp_tx: Sender<()> },
    Bind { animation: Box<Animation>, resp_tx: Sender<()> },
    SetName { name: String, resp_tx: Sender<()> },
    SetFps { fps: u32, resp_tx: Sender<()> },
    SetEnabled { enabled: bool, resp_tx: Sender<()> },
    SetCurrentFrame { frame: i32, resp_tx: Sender<()> },
    Step { resp_tx: Sender<TickOutcome> },
    Snapshot { resp_tx: Sender<TimelineSnapshot> },
    WaitForCompletion { resp_tx: Sender<()> },
    Shutdown,
}

struct Worker {
    state: TimelineState,
    ticker: Receiver<Instant>,
    /// Interval of the live ticker, `None` while idle.
    ticking: Option<Duration>,
    waiters: Vec<Sender<()>>,
}

impl Worker {
    fn new(state: TimelineState) -> Self {
        Self {
            state,
            ticker: never(),
            ticking: None,
            waiters: Vec::new(),
        }
    }

    fn run(mut self, cmd_rx: Receiver<Command>) {
        debug!("timeline worker started");
        loop {
            let ticker = self.ticker.clone();
            crossbeam_channel::select! {
                recv(cmd_rx) -> msg => {
                    let Ok(cmd) = msg else { break };
                    if matches!(cmd, Command::Shutdown) {
                        break;
                    }
                    self.handle(cmd);
                }
                recv(ticker) -> _ => {
                    if self.state.update() == TickOutcome::Finished {
                        debug!("{}: playback finished", self.state.name());
                    }
                }
            }
            self.sync();
        }
        self.state.stop();
        self.wake_waiters();
        debug!("timeline worker stopped");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Play { resp_tx } => {
                self.state.play();
                let _ = resp_tx.send(());
            }
            Command::Pause { resp_tx } => {
                self.state.pause();
                let _ = resp_tx.send(());
            }
            Command::Stop { resp_tx } => {
                self.state.stop();
                let _ = resp_tx.send(());
            }
            Command::GoTo { frame, resp_tx } => {
                self.state.go_to(frame);
                let _ = resp_tx.send(());
            }
            Command::Bind { animation, resp_tx } => {
                self.state.bind(*animation);
                let _ = resp_tx.send(());
            }
            Command::SetName { name, resp_tx } => {
                self.state.set_name(name);
                let _ = resp_tx.send(());
            }
            Command::SetFps { fps, resp_tx } => {
                self.state.set_fps(fps);
                let _ = resp_tx.send(());
            }
            Command::SetEnabled { enabled, resp_tx } => {
                self.state.set_enabled(enabled);
                let _ = resp_tx.send(());
            }
            Command::SetCurrentFrame { frame, resp_tx } => {
                self.state.set_current_frame(frame);
                let _ = resp_tx.send(());
            }
            Command::Step { resp_tx } => {
                let outcome = self.state.update();
                let _ = resp_tx.send(outcome);
            }
            Command::Snapshot { resp_tx } => {
                let _ = resp_tx.send(self.state.snapshot());
            }
            Command::WaitForCompletion { resp_tx } => {
                if self.state.state().is_playing() {
                    self.waiters.push(resp_tx);
                } else {
                    let _ = resp_tx.send(());
                }
            }
            Command::Shutdown => {}
        }
    }

    /// Match the ticker to the playback state; release waiters once idle.
    fn sync(&mut self) {
        if self.state.state().is_playing() {
            let interval = self.state.frame_interval();
            if self.ticking != Some(interval) {
                self.ticker = tick(interval);
                self.ticking = Some(interval);
            }
        } else {
            if self.ticking.take().is_some() {
                self.ticker = never();
            }
            self.wake_waiters();
        }
    }

    fn wake_waiters(&mut self) {
        for resp_tx in self.waiters.drain(..) {
            let _ = resp_tx.send(());
        }
    }
}

/// Handle to a timeline running on its own worker thread.
/// Dropping the handle stops playback and joins the worker.
pub struct Timeline {
    cmd_tx: Sender<Command>,
    join: Option<JoinHandle<()>>,
}

impl Timeline {
    pub fn spawn(
        config: Config,
        actuators: Arc<dyn ActuatorService>,
        position: Arc<dyn PositionChannel>,
    ) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = unbounded();
        let thread_name = config.thread_name.clone();
        let state = TimelineState::new(config, actuators, position);
        let join = thread::Builder::new()
            .name(thread_name)
            .spawn(move || Worker::new(state).run(cmd_rx))?;
        Ok(Self {
            cmd_tx,
            join: Some(join),
        })
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> Option<T> {
        let (resp_tx, resp_rx) = bounded(1);
        if self.cmd_tx.send(make(resp_tx)).is_err() {
            warn!("timeline worker is gone");
            return None;
        }
        match resp_rx.recv() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("timeline worker exited before replying");
                None
            }
        }
    }

    pub fn play(&self) {
        self.request(|resp_tx| Command::Play { resp_tx });
    }

    /// Returns once the worker has paused; no motion command is issued afterwards.
    pub fn pause(&self) {
        self.request(|resp_tx| Command::Pause { resp_tx });
    }

    pub fn stop(&self) {
        self.request(|resp_tx| Command::Stop { resp_tx });
    }

    pub fn go_to(&self, frame: i32) {
        self.request(|resp_tx| Command::GoTo { frame, resp_tx });
    }

    pub fn bind(&self, animation: Animation) {
        self.request(|resp_tx| Command::Bind {
            animation: Box::new(animation),
            resp_tx,
        });
    }

    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.request(|resp_tx| Command::SetName { name, resp_tx });
    }

    pub fn set_fps(&self, fps: u32) {
        self.request(|resp_tx| Command::SetFps { fps, resp_tx });
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.request(|resp_tx| Command::SetEnabled { enabled, resp_tx });
    }

    pub fn set_current_frame(&self, frame: i32) {
        self.request(|resp_tx| Command::SetCurrentFrame { frame, resp_tx });
    }

    /// Run one update by hand. While not playing this moves the actuators to
    /// the current frame without advancing it.
    pub fn step(&self) -> TickOutcome {
        self.request(|resp_tx| Command::Step { resp_tx })
            .unwrap_or(TickOutcome::Finished)
    }

    pub fn snapshot(&self) -> Option<TimelineSnapshot> {
        self.request(|resp_tx| Command::Snapshot { resp_tx })
    }

    /// Block until the playback finishes, pauses or stops.
    pub fn wait_for_completion(&self) {
        self.request(|resp_tx| Command::WaitForCompletion { resp_tx });
    }
}

impl Drop for Timeline {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Command::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("timeline worker panicked");
            }
        }
    }
}
