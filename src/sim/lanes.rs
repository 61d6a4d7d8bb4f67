//! Lane geometry
//!
//! The road is centered in the playfield and split into equal-width lanes.
//! Every entity placed in a lane is horizontally centered in it, so two
//! entities of equal width in the same lane always line up exactly.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, EngineConfig};

/// Immutable playfield geometry derived from a validated config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
    pub road_width: f32,
    pub lane_count: usize,
    pub lane_width: f32,
    pub player_size: Vec2,
    pub obstacle_size: Vec2,
    /// Fixed y of the player's top edge
    pub player_y: f32,
}

impl Playfield {
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            width: config.width,
            height: config.height,
            road_width: config.road_width,
            lane_count: config.lane_count,
            lane_width: config.lane_width(),
            player_size: Vec2::new(config.player_width, config.player_height),
            obstacle_size: Vec2::new(config.obstacle_width, config.obstacle_height),
            player_y: config.height - config.player_height - config.player_bottom_margin,
        })
    }

    /// Left edge of the road
    #[inline]
    pub fn road_left(&self) -> f32 {
        (self.width - self.road_width) / 2.0
    }

    /// Middle lane (left of middle for an even count)
    #[inline]
    pub fn center_lane(&self) -> usize {
        (self.lane_count - 1) / 2
    }

    #[inline]
    pub fn last_lane(&self) -> usize {
        self.lane_count - 1
    }

    /// Left x that centers an entity of `entity_width` in `lane`.
    ///
    /// Panics if `lane` is out of range: lanes only come from clamped input
    /// and the spawner's bounded draw.
    pub fn lane_to_x(&self, lane: usize, entity_width: f32) -> f32 {
        assert!(
            lane < self.lane_count,
            "lane {} out of range (lane count {})",
            lane,
            self.lane_count
        );
        self.road_left() + lane as f32 * self.lane_width + (self.lane_width - entity_width) / 2.0
    }
}
