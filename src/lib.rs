//! Lane Rush - A lane-based obstacle-avoidance arcade game
//!
//! Core modules:
//! - `sim`: Simulation state machine (lanes, obstacles, collisions, scoring)
//! - `schedule`: Frame/spawn trigger ownership on top of host timers
//! - `headless`: Virtual-clock host for native runs and tests
//! - `config`: Engine configuration and validation
//! - `highscores`: Leaderboard of finished runs

pub mod config;
pub mod headless;
pub mod highscores;
pub mod schedule;
pub mod sim;

pub use config::{ConfigError, EngineConfig, MotionModel};
pub use highscores::HighScores;
pub use schedule::{Controller, Scheduler, TimerHandle};

/// Game configuration constants
pub mod consts {
    /// Lanes on the road
    pub const DEFAULT_LANE_COUNT: usize = 3;

    /// Playfield used when no viewport is known
    pub const DEFAULT_PLAYFIELD_WIDTH: f32 = 300.0;
    pub const DEFAULT_PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Road never grows wider than this, and takes at most this share of the viewport
    pub const MAX_ROAD_WIDTH: f32 = 400.0;
    pub const ROAD_VIEWPORT_FRACTION: f32 = 0.8;

    /// Car dimensions (player and obstacles share a footprint)
    pub const CAR_WIDTH: f32 = 50.0;
    pub const CAR_HEIGHT: f32 = 80.0;
    pub const OBSTACLE_WIDTH: f32 = 50.0;
    pub const OBSTACLE_HEIGHT: f32 = 80.0;

    /// Gap between the player's bottom edge and the playfield bottom
    pub const PLAYER_BOTTOM_MARGIN: f32 = 20.0;

    /// Obstacle spawn cadence (wall clock)
    pub const SPAWN_INTERVAL_MS: f64 = 1500.0;

    /// Speed bounds and starting speed (per-tick displacement units)
    pub const MIN_SPEED: u32 = 1;
    pub const MAX_SPEED: u32 = 10;
    pub const DEFAULT_SPEED: u32 = 5;

    /// Score gained per tick is speed / SCORE_DIVISOR
    pub const SCORE_DIVISOR: f64 = 10.0;

    /// Road marking repeat distance (scroll offset wraps at this)
    pub const MARKING_PERIOD: f32 = 40.0;

    /// Nominal display frame (60 Hz)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
}
