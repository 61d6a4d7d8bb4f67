//! Simulation state machine
//!
//! Owns every entity. Hosts drive it with `start`, `apply_input`, `spawn`
//! and `tick` (see `tick.rs`), all on one thread, and read it back through
//! `snapshot`.

use super::input::{Command, step_lane, step_speed};
use super::lanes::Playfield;
use super::snapshot::{EntityRect, Snapshot};
use super::spawner::Spawner;
use super::state::{EntityStore, Lifecycle, SimEvent};
use crate::config::{ConfigError, EngineConfig};

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct Simulation {
    pub(super) config: EngineConfig,
    pub(super) field: Playfield,
    pub(super) lifecycle: Lifecycle,
    pub(super) speed: u32,
    /// Fractional score; displayed value is the floor
    pub(super) score: f64,
    pub(super) entities: EntityStore,
    pub(super) road_offset: f32,
    pub(super) spawner: Spawner,
    /// Timestamp of the previous tick; `None` until the priming tick
    pub(super) last_tick_ms: Option<f64>,
    /// Movement ticks in the current run
    pub(super) ticks: u64,
    /// Successful lane moves in the current run
    pub(super) lane_changes: u32,
    pub(super) events: Vec<SimEvent>,
}

impl Simulation {
    /// Create an idle simulation. Fails if the config is inconsistent.
    pub fn new(config: EngineConfig, seed: u64) -> Result<Self, ConfigError> {
        let field = Playfield::from_config(&config)?;
        let entities = EntityStore::new(&field);
        let spawner = Spawner::new(seed);
        Ok(Self {
            speed: config.default_speed,
            config,
            field,
            lifecycle: Lifecycle::Idle,
            score: 0.0,
            entities,
            road_offset: 0.0,
            spawner,
            last_tick_ms: None,
            ticks: 0,
            lane_changes: 0,
            events: Vec::new(),
        })
    }

    /// Begin a fresh run, discarding whatever the previous run left behind
    pub fn start(&mut self) {
        self.score = 0.0;
        self.speed = self.config.default_speed;
        self.entities.clear_obstacles();
        self.entities
            .player
            .set_lane(&self.field, self.field.center_lane());
        self.road_offset = 0.0;
        self.last_tick_ms = None;
        self.ticks = 0;
        self.lane_changes = 0;
        self.lifecycle = Lifecycle::Running;
        self.events.push(SimEvent::Started);
        log::info!(
            "Run started: speed {}, {} lanes, seed {}",
            self.speed,
            self.field.lane_count,
            self.spawner.seed()
        );
    }

    /// Return to `Idle` without clearing the last run's final state
    pub fn reset(&mut self) {
        if self.lifecycle != Lifecycle::Idle {
            log::info!("Simulation reset from {:?}", self.lifecycle);
        }
        self.lifecycle = Lifecycle::Idle;
        self.last_tick_ms = None;
    }

    /// Apply a player command. Returns false if it was ignored.
    pub fn apply_input(&mut self, command: Command) -> bool {
        if self.lifecycle != Lifecycle::Running {
            return false;
        }

        match command {
            Command::MoveLeft | Command::MoveRight => {
                let lane = self.entities.player.lane();
                let next = step_lane(lane, self.field.last_lane(), command);
                if next == lane {
                    return false;
                }
                self.entities.player.set_lane(&self.field, next);
                self.lane_changes += 1;
                self.events.push(SimEvent::LaneChanged { lane: next });
                log::debug!("{}: lane {} -> {}", command.as_str(), lane, next);
            }
            Command::SpeedUp | Command::SpeedDown => {
                let next = step_speed(
                    self.speed,
                    self.config.min_speed,
                    self.config.max_speed,
                    command,
                );
                if next == self.speed {
                    return false;
                }
                self.speed = next;
                self.events.push(SimEvent::SpeedChanged { speed: next });
                log::debug!("{}: speed {}", command.as_str(), next);
            }
        }
        true
    }

    /// Spawn-timer handler: one obstacle in a random lane.
    ///
    /// Returns the lane, or `None` if the run is not active.
    pub fn spawn(&mut self) -> Option<usize> {
        if self.lifecycle != Lifecycle::Running {
            return None;
        }
        let lane = self.spawner.pick_lane(self.field.lane_count);
        let id = self.entities.add_obstacle(&self.field, lane);
        self.events.push(SimEvent::Spawned { id, lane });
        log::debug!("Spawned obstacle {} in lane {}", id, lane);
        Some(lane)
    }

    pub fn snapshot(&self) -> Snapshot {
        let player = &self.entities.player;
        Snapshot {
            lifecycle: self.lifecycle,
            score: self.display_score(),
            speed: self.speed,
            player_lane: player.lane(),
            player: EntityRect::new(player.pos(), player.size()),
            obstacles: self
                .entities
                .obstacles()
                .iter()
                .map(|o| EntityRect::new(o.pos(), o.size()))
                .collect(),
            road_offset: self.road_offset,
        }
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    #[inline]
    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Accumulated (fractional) score
    #[inline]
    pub fn raw_score(&self) -> f64 {
        self.score
    }

    #[inline]
    pub fn display_score(&self) -> u64 {
        self.score.floor() as u64
    }

    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[inline]
    pub fn lane_changes(&self) -> u32 {
        self.lane_changes
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn playfield(&self) -> &Playfield {
        &self.field
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sim() -> Simulation {
        Simulation::new(EngineConfig::default(), 12345).unwrap()
    }

    #[test]
    fn test_new_is_idle() {
        let sim = sim();
        let snap = sim.snapshot();
        assert_eq!(snap.lifecycle, Lifecycle::Idle);
        assert_eq!(snap.score, 0);
        assert!(snap.obstacles.is_empty());
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = EngineConfig {
            lane_count: 0,
            ..Default::default()
        };
        assert!(Simulation::new(config, 1).is_err());
    }

    #[test]
    fn test_start_resets() {
        let mut sim = sim();
        sim.start();
        let snap = sim.snapshot();
        assert_eq!(snap.lifecycle, Lifecycle::Running);
        assert_eq!(snap.score, 0);
        assert_eq!(snap.speed, 5);
        assert!(snap.obstacles.is_empty());
        assert_eq!(snap.player_lane, 1);
        assert_eq!(snap.player.x, 125.0);
        assert_eq!(snap.player.y, 500.0);
        assert_eq!(sim.drain_events(), vec![SimEvent::Started]);
    }

    #[test]
    fn test_input_ignored_unless_running() {
        let mut sim = sim();
        assert!(!sim.apply_input(Command::MoveLeft));
        assert!(!sim.apply_input(Command::SpeedUp));
        assert_eq!(sim.snapshot().player_lane, 1);
        assert_eq!(sim.speed(), 5);
    }

    #[test]
    fn test_lane_moves_clamp() {
        let mut sim = sim();
        sim.start();

        assert!(sim.apply_input(Command::MoveLeft));
        assert_eq!(sim.snapshot().player.x, 25.0);
        assert!(!sim.apply_input(Command::MoveLeft));
        assert_eq!(sim.snapshot().player_lane, 0);
        assert_eq!(sim.snapshot().player.x, 25.0);

        assert!(sim.apply_input(Command::MoveRight));
        assert!(sim.apply_input(Command::MoveRight));
        assert!(!sim.apply_input(Command::MoveRight));
        assert_eq!(sim.snapshot().player_lane, 2);
        assert_eq!(sim.snapshot().player.x, 225.0);
        // Clamped moves are not counted
        assert_eq!(sim.lane_changes(), 3);

        sim.start();
        assert_eq!(sim.lane_changes(), 0);
    }

    #[test]
    fn test_speed_clamps() {
        let mut sim = sim();
        sim.start();
        for _ in 0..20 {
            sim.apply_input(Command::SpeedUp);
        }
        assert_eq!(sim.speed(), 10);
        for _ in 0..20 {
            sim.apply_input(Command::SpeedDown);
        }
        assert_eq!(sim.speed(), 1);
    }

    #[test]
    fn test_spawn_counts_and_lanes() {
        let mut sim = sim();
        assert_eq!(sim.spawn(), None);

        sim.start();
        for _ in 0..25 {
            let lane = sim.spawn().unwrap();
            assert!(lane < 3);
        }
        let snap = sim.snapshot();
        assert_eq!(snap.obstacles.len(), 25);
        assert!(sim.entities().obstacles().iter().all(|o| o.lane() < 3));
        assert!(snap.obstacles.iter().all(|o| o.y == -80.0));
    }

    #[test]
    fn test_reset_goes_idle() {
        let mut sim = sim();
        sim.start();
        sim.spawn();
        sim.reset();
        assert_eq!(sim.lifecycle(), Lifecycle::Idle);
        assert_eq!(sim.spawn(), None);
        assert!(!sim.apply_input(Command::MoveRight));
    }
}
