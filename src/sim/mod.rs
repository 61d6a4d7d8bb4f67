//! Simulation module
//!
//! All gameplay logic lives here. Nothing in this module touches timers,
//! rendering or the platform:
//! - Hosts feed it timestamps, spawn triggers and commands
//! - Seeded RNG only
//! - Obstacles are kept in spawn order

pub mod collision;
pub mod input;
pub mod lanes;
pub mod simulation;
pub mod snapshot;
pub mod spawner;
pub mod state;
pub mod tick;

pub use collision::{Aabb, intersects};
pub use input::Command;
pub use lanes::Playfield;
pub use simulation::Simulation;
pub use snapshot::{EntityRect, Snapshot};
pub use spawner::Spawner;
pub use state::{EntityStore, Lifecycle, Obstacle, Player, SimEvent};
pub use tick::{TickOutcome, tick};
