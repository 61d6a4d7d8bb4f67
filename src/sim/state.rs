//! Entities and simulation state types

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::lanes::Playfield;

/// Run lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Lifecycle {
    /// Never started
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// Run ended by a collision
    Over,
}

/// Things a host may want to react to (logging, results, sound)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SimEvent {
    Started,
    Spawned { id: u32, lane: usize },
    LaneChanged { lane: usize },
    SpeedChanged { speed: u32 },
    /// Run ended; carries the run's final tallies
    Collided {
        obstacle_id: u32,
        score: u64,
        ticks: u64,
        lane_changes: u32,
    },
}

/// The player's car.
///
/// Position is derived from the lane index and never written directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    lane: usize,
    pos: Vec2,
    size: Vec2,
}

impl Player {
    pub fn new(field: &Playfield, lane: usize) -> Self {
        let mut player = Self {
            lane,
            pos: Vec2::new(0.0, field.player_y),
            size: field.player_size,
        };
        player.set_lane(field, lane);
        player
    }

    /// Snap to a lane
    pub fn set_lane(&mut self, field: &Playfield, lane: usize) {
        self.pos.x = field.lane_to_x(lane, self.size.x);
        self.lane = lane;
    }

    #[inline]
    pub fn lane(&self) -> usize {
        self.lane
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }
}

/// An obstacle car. Lane and size are fixed at spawn; only y changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    id: u32,
    lane: usize,
    pos: Vec2,
    size: Vec2,
}

impl Obstacle {
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn lane(&self) -> usize {
        self.lane
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_pos_size(self.pos, self.size)
    }
}

/// Player plus live obstacles in spawn order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityStore {
    pub player: Player,
    obstacles: Vec<Obstacle>,
    next_id: u32,
}

impl EntityStore {
    /// Store with the player in the center lane and no obstacles
    pub fn new(field: &Playfield) -> Self {
        Self {
            player: Player::new(field, field.center_lane()),
            obstacles: Vec::new(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append an obstacle just above the top edge of `lane`
    pub fn add_obstacle(&mut self, field: &Playfield, lane: usize) -> u32 {
        let id = self.next_entity_id();
        let size = field.obstacle_size;
        self.obstacles.push(Obstacle {
            id,
            lane,
            pos: Vec2::new(field.lane_to_x(lane, size.x), -size.y),
            size,
        });
        id
    }

    /// Move every obstacle down by `delta`
    pub fn advance(&mut self, delta: f32) {
        for obstacle in &mut self.obstacles {
            obstacle.pos.y += delta;
        }
    }

    /// Drop obstacles whose top edge reached the bottom; returns how many
    pub fn prune_offscreen(&mut self, playfield_height: f32) -> usize {
        let before = self.obstacles.len();
        self.obstacles.retain(|o| o.pos.y < playfield_height);
        before - self.obstacles.len()
    }

    /// First obstacle (in spawn order) overlapping the player
    pub fn first_collision(&self) -> Option<&Obstacle> {
        let player = self.player.bounds();
        self.obstacles.iter().find(|o| player.intersects(&o.bounds()))
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }
}
