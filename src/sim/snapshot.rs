//! Read-only view of the simulation for a presentation layer

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Lifecycle;

/// Position and size of one drawable entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl EntityRect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            w: size.x,
            h: size.y,
        }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub lifecycle: Lifecycle,
    /// Displayed (floored) score
    pub score: u64,
    pub speed: u32,
    pub player_lane: usize,
    pub player: EntityRect,
    /// In spawn order (later entries draw on top)
    pub obstacles: Vec<EntityRect>,
    /// Road marking scroll, in `0..marking_period`
    pub road_offset: f32,
}

impl Snapshot {
    pub fn to_json(&self) -> String {
        // Plain numbers and enums only, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}
