//! Discrete player commands

use serde::{Deserialize, Serialize};

/// A single player command, applied between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SpeedUp,
    SpeedDown,
}

impl Command {
    /// Arrow keys, by `KeyboardEvent.key` name
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" => Some(Command::MoveLeft),
            "ArrowRight" => Some(Command::MoveRight),
            "ArrowUp" => Some(Command::SpeedUp),
            "ArrowDown" => Some(Command::SpeedDown),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "MoveLeft",
            Command::MoveRight => "MoveRight",
            Command::SpeedUp => "SpeedUp",
            Command::SpeedDown => "SpeedDown",
        }
    }
}

/// Next lane for a move, clamped to `0..=last_lane`
pub fn step_lane(lane: usize, last_lane: usize, command: Command) -> usize {
    match command {
        Command::MoveLeft => lane.saturating_sub(1),
        Command::MoveRight if lane < last_lane => lane + 1,
        _ => lane,
    }
}

/// Next speed for a speed command, clamped to `min..=max`
pub fn step_speed(speed: u32, min: u32, max: u32, command: Command) -> u32 {
    match command {
        Command::SpeedUp => (speed + 1).min(max),
        Command::SpeedDown => speed.saturating_sub(1).max(min),
        _ => speed,
    }
}
