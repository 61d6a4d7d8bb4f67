//! Axis-aligned collision detection
//!
//! Cars are plain rectangles, so a bounding-box overlap test is the whole
//! collision model. There is no swept test: an obstacle that moves further
//! than the player's height in one tick can pass through it.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned box in playfield coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl Aabb {
    pub fn new(left: f32, right: f32, top: f32, bottom: f32) -> Self {
        Self {
            left,
            right,
            top,
            bottom,
        }
    }

    /// Box for an entity whose top-left corner is at `pos`
    #[inline]
    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self {
            left: pos.x,
            right: pos.x + size.x,
            top: pos.y,
            bottom: pos.y + size.y,
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        intersects(self, other)
    }
}

/// True unless the boxes are strictly separated on either axis.
///
/// Shared edges count as a hit.
#[inline]
pub fn intersects(a: &Aabb, b: &Aabb) -> bool {
    !(a.right < b.left || a.left > b.right || a.bottom < b.top || a.top > b.bottom)
}
