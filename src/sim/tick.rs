//! Per-frame simulation step
//!
//! Advances the road and obstacles, prunes what left the screen, checks the
//! player against every obstacle and accrues score.

use super::simulation::Simulation;
use super::state::{Lifecycle, SimEvent};

/// What a tick did, and whether the host should schedule another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// First tick of a run: baseline recorded, nothing moved
    Primed,
    /// Normal step
    Advanced,
    /// A collision ended the run during this tick
    Collided,
    /// Not running; nothing happened
    Halted,
}

impl TickOutcome {
    /// Whether the host should request another frame
    pub fn wants_next_frame(&self) -> bool {
        matches!(self, TickOutcome::Primed | TickOutcome::Advanced)
    }
}

/// Advance the simulation to `now_ms` (monotonic host timestamp)
pub fn tick(sim: &mut Simulation, now_ms: f64) -> TickOutcome {
    if sim.lifecycle != Lifecycle::Running {
        return TickOutcome::Halted;
    }

    let Some(last_ms) = sim.last_tick_ms.replace(now_ms) else {
        return TickOutcome::Primed;
    };
    let elapsed_ms = (now_ms - last_ms).max(0.0);
    let factor = sim.config.motion.displacement_factor(elapsed_ms);
    let step = (sim.speed as f64 * factor) as f32;

    sim.ticks += 1;

    // Road markings scroll with the traffic
    sim.road_offset = (sim.road_offset + step).rem_euclid(sim.config.marking_period);

    sim.entities.advance(step);
    let pruned = sim.entities.prune_offscreen(sim.field.height);
    if pruned > 0 {
        log::trace!("Pruned {} obstacles", pruned);
    }

    if let Some(obstacle_id) = sim.entities.first_collision().map(|o| o.id()) {
        sim.lifecycle = Lifecycle::Over;
        let score = sim.display_score();
        sim.events.push(SimEvent::Collided {
            obstacle_id,
            score,
            ticks: sim.ticks,
            lane_changes: sim.lane_changes,
        });
        log::info!(
            "Game over: hit obstacle {} after {} ticks, score {}",
            obstacle_id,
            sim.ticks,
            score
        );
        return TickOutcome::Collided;
    }

    sim.score += sim.speed as f64 / sim.config.score_divisor * factor;

    TickOutcome::Advanced
}

impl Simulation {
    /// See [`tick`]
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        tick(self, now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, MotionModel};
    use crate::consts::FRAME_MS;
    use crate::sim::input::Command;

    fn running(config: EngineConfig) -> Simulation {
        let mut sim = Simulation::new(config, 12345).unwrap();
        sim.start();
        sim
    }

    /// Prime if needed, then run `n` movement ticks at 60 Hz
    fn run_ticks(sim: &mut Simulation, n: u32) -> TickOutcome {
        let mut now = match sim.last_tick_ms {
            Some(last) => last,
            None => {
                sim.tick(1000.0);
                1000.0
            }
        };
        let mut outcome = TickOutcome::Primed;
        for _ in 0..n {
            now += FRAME_MS;
            outcome = sim.tick(now);
            if !outcome.wants_next_frame() {
                break;
            }
        }
        outcome
    }

    #[test]
    fn test_priming_tick_does_not_move() {
        let mut sim = running(EngineConfig::default());
        sim.spawn();
        assert_eq!(sim.tick(5000.0), TickOutcome::Primed);
        let snap = sim.snapshot();
        assert_eq!(snap.obstacles[0].y, -80.0);
        assert_eq!(snap.road_offset, 0.0);
        assert_eq!(sim.raw_score(), 0.0);
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn test_obstacle_falls_by_speed_per_tick() {
        let mut sim = running(EngineConfig::default());
        sim.apply_input(Command::MoveLeft);
        sim.spawn_in_lane_for_test(2);

        assert_eq!(run_ticks(&mut sim, 10), TickOutcome::Advanced);
        assert_eq!(sim.snapshot().obstacles[0].y, -80.0 + 10.0 * 5.0);
    }

    #[test]
    fn test_score_accumulates_fractionally() {
        let mut sim = running(EngineConfig::default());
        run_ticks(&mut sim, 3);
        assert!((sim.raw_score() - 1.5).abs() < 1e-9);
        assert_eq!(sim.display_score(), 1);

        run_ticks(&mut sim, 1);
        assert!((sim.raw_score() - 2.0).abs() < 1e-9);
        assert_eq!(sim.snapshot().score, 2);
    }

    #[test]
    fn test_road_offset_wraps() {
        let mut sim = running(EngineConfig::default());
        run_ticks(&mut sim, 9); // 45 units
        assert!((sim.snapshot().road_offset - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_offscreen_obstacles_are_pruned() {
        let mut sim = running(EngineConfig::default());
        sim.apply_input(Command::MoveLeft);
        sim.spawn_in_lane_for_test(2);

        // y reaches 600 after (600 + 80) / 5 = 136 ticks
        run_ticks(&mut sim, 135);
        assert_eq!(sim.snapshot().obstacles.len(), 1);
        assert_eq!(sim.snapshot().obstacles[0].y, 595.0);

        run_ticks(&mut sim, 1);
        assert!(sim.snapshot().obstacles.is_empty());
        assert!(sim.is_running());
    }

    #[test]
    fn test_same_lane_obstacle_ends_run_on_first_contact() {
        // 300x600, three 100-wide lanes, player at (125, 500).
        // An obstacle at y = -80 in lane 1 touches the player once its
        // bottom edge reaches y = 500, i.e. at y = 420 after 100 ticks.
        let mut sim = running(EngineConfig::default());
        sim.spawn_in_lane_for_test(1);

        assert_eq!(run_ticks(&mut sim, 99), TickOutcome::Advanced);
        assert_eq!(sim.snapshot().obstacles[0].y, 415.0);
        assert!(sim.is_running());

        assert_eq!(sim.tick(1e6), TickOutcome::Collided);
        assert_eq!(sim.lifecycle(), Lifecycle::Over);
        assert_eq!(sim.ticks(), 100);
    }

    #[test]
    fn test_obstacle_reaches_505_after_117_ticks_in_other_lane() {
        let mut sim = running(EngineConfig::default());
        sim.apply_input(Command::MoveLeft);
        sim.spawn_in_lane_for_test(1);

        assert_eq!(run_ticks(&mut sim, 117), TickOutcome::Advanced);
        let obstacle = sim.snapshot().obstacles[0];
        assert_eq!(obstacle.x, 125.0);
        assert_eq!(obstacle.y, 505.0);
    }

    #[test]
    fn test_state_frozen_after_collision() {
        let mut sim = running(EngineConfig::default());
        sim.spawn_in_lane_for_test(1);
        // Teleport the obstacle onto the player
        sim.entities.advance(580.0);

        assert_eq!(run_ticks(&mut sim, 1), TickOutcome::Collided);
        let frozen = sim.snapshot();
        assert_eq!(frozen.lifecycle, Lifecycle::Over);

        assert_eq!(sim.tick(1e9), TickOutcome::Halted);
        assert_eq!(sim.spawn(), None);
        assert!(!sim.apply_input(Command::MoveLeft));
        assert_eq!(sim.snapshot(), frozen);
    }

    #[test]
    fn test_collision_event_carries_run_tallies() {
        let mut sim = running(EngineConfig::default());
        sim.apply_input(Command::MoveLeft);
        sim.apply_input(Command::MoveRight);
        run_ticks(&mut sim, 40); // score 20
        sim.spawn_in_lane_for_test(1);
        sim.entities.advance(580.0);
        sim.drain_events();

        assert_eq!(run_ticks(&mut sim, 1), TickOutcome::Collided);
        let events = sim.drain_events();
        assert!(matches!(
            events.as_slice(),
            [SimEvent::Collided {
                score: 20,
                ticks: 41,
                lane_changes: 2,
                ..
            }]
        ));
    }

    #[test]
    fn test_restart_after_over_resets() {
        let mut sim = running(EngineConfig::default());
        run_ticks(&mut sim, 50);
        sim.spawn_in_lane_for_test(1);
        sim.spawn_in_lane_for_test(0);
        sim.entities.advance(580.0);
        run_ticks(&mut sim, 1);
        assert_eq!(sim.lifecycle(), Lifecycle::Over);

        sim.start();
        let snap = sim.snapshot();
        assert_eq!(snap.lifecycle, Lifecycle::Running);
        assert_eq!(snap.score, 0);
        assert!(snap.obstacles.is_empty());
        assert_eq!(snap.speed, 5);
        assert_eq!(snap.player_lane, 1);

        // Next tick primes again rather than jumping by the idle gap
        assert_eq!(sim.tick(1e12), TickOutcome::Primed);
    }

    #[test]
    fn test_frame_scaled_motion() {
        let config = EngineConfig {
            motion: MotionModel::FrameScaled {
                reference_frame_ms: 10.0,
            },
            ..Default::default()
        };
        let mut sim = running(config);
        sim.apply_input(Command::MoveLeft);
        sim.spawn_in_lane_for_test(2);

        sim.tick(0.0);
        sim.tick(20.0); // two reference frames: 10 units
        assert_eq!(sim.snapshot().obstacles[0].y, -70.0);
        assert!((sim.raw_score() - 1.0).abs() < 1e-9);

        // Timestamps going backwards never move things up
        sim.tick(15.0);
        assert_eq!(sim.snapshot().obstacles[0].y, -70.0);
    }

    #[test]
    fn test_tick_outcome_scheduling() {
        assert!(TickOutcome::Primed.wants_next_frame());
        assert!(TickOutcome::Advanced.wants_next_frame());
        assert!(!TickOutcome::Collided.wants_next_frame());
        assert!(!TickOutcome::Halted.wants_next_frame());
    }

    impl Simulation {
        fn spawn_in_lane_for_test(&mut self, lane: usize) {
            let field = self.field.clone();
            self.entities.add_obstacle(&field, lane);
        }
    }
}
