//! Frame and spawn trigger ownership
//!
//! The simulation never touches timers. A [`Controller`] sits between it and
//! the host's timing primitives, holding the one pending frame request and the
//! one spawn interval of the current run. Whenever the run stops (collision,
//! reset, drop) both are cancelled before control returns to the caller, so
//! no stale callback can reach a finished run.

use crate::config::{ConfigError, EngineConfig};
use crate::sim::{Command, Lifecycle, SimEvent, Simulation, Snapshot, TickOutcome};

/// Opaque id of a host timer (animation frame request or interval)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub i32);

/// Host timing primitives
pub trait Scheduler {
    /// Ask for one `Controller::on_frame` call at the next display frame
    fn request_frame(&mut self) -> TimerHandle;

    /// Drop a pending frame request
    fn cancel_frame(&mut self, handle: TimerHandle);

    /// Call `Controller::on_spawn` every `period_ms` until stopped
    fn start_interval(&mut self, period_ms: f64) -> TimerHandle;

    fn stop_interval(&mut self, handle: TimerHandle);
}

/// A simulation plus the host triggers that drive it
#[derive(Debug)]
pub struct Controller<S: Scheduler> {
    sim: Simulation,
    scheduler: S,
    frame: Option<TimerHandle>,
    spawn_timer: Option<TimerHandle>,
}

impl<S: Scheduler> Controller<S> {
    pub fn new(config: EngineConfig, seed: u64, scheduler: S) -> Result<Self, ConfigError> {
        Ok(Self {
            sim: Simulation::new(config, seed)?,
            scheduler,
            frame: None,
            spawn_timer: None,
        })
    }

    /// Start (or restart) a run with fresh triggers
    pub fn start(&mut self) {
        self.disarm();
        self.sim.start();
        self.arm();
    }

    /// Stop the run and go back to `Idle`
    pub fn reset(&mut self) {
        self.disarm();
        self.sim.reset();
    }

    /// Request the first frame and start the spawn interval.
    ///
    /// Does nothing unless running; replaces any triggers already armed.
    pub fn arm(&mut self) {
        if !self.sim.is_running() {
            return;
        }
        self.disarm();
        self.frame = Some(self.scheduler.request_frame());
        self.spawn_timer = Some(
            self.scheduler
                .start_interval(self.sim.config().spawn_interval_ms),
        );
        log::debug!("Triggers armed: frame {:?}, spawn {:?}", self.frame, self.spawn_timer);
    }

    /// Cancel both triggers. Safe to call any number of times.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        if let Some(handle) = self.spawn_timer.take() {
            self.scheduler.stop_interval(handle);
            log::debug!("Spawn interval {:?} stopped", handle);
        }
    }

    /// Frame callback: step the simulation, then re-request or disarm
    pub fn on_frame(&mut self, now_ms: f64) -> TickOutcome {
        // The request that fired is spent
        self.frame = None;

        let outcome = self.sim.tick(now_ms);
        if outcome.wants_next_frame() {
            self.frame = Some(self.scheduler.request_frame());
        } else {
            self.disarm();
        }
        outcome
    }

    /// Spawn-interval callback. A no-op once the run has stopped.
    pub fn on_spawn(&mut self) -> Option<usize> {
        if !self.sim.is_running() {
            return None;
        }
        self.sim.spawn()
    }

    pub fn apply_input(&mut self, command: Command) -> bool {
        self.sim.apply_input(command)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.sim.snapshot()
    }

    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.sim.drain_events()
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.sim.lifecycle()
    }

    /// Whether a frame request or spawn interval is outstanding
    pub fn is_armed(&self) -> bool {
        self.frame.is_some() || self.spawn_timer.is_some()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }
}

impl<S: Scheduler> Drop for Controller<S> {
    fn drop(&mut self) {
        self.disarm();
    }
}
