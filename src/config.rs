//! Engine configuration
//!
//! Fixed at construction. Loaded from a JSON override (LocalStorage on web)
//! with every missing field falling back to the defaults in `consts`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("lane count must be at least 1")]
    NoLanes,

    #[error("{name} must be positive (got {value})")]
    NonPositive { name: &'static str, value: f64 },

    #[error("road width {road} exceeds playfield width {playfield}")]
    RoadTooWide { road: f32, playfield: f32 },

    #[error("{entity} width {width} does not fit inside a lane of width {lane_width}")]
    EntityWiderThanLane {
        entity: &'static str,
        width: f32,
        lane_width: f32,
    },

    #[error("{entity} height {height} does not fit inside playfield height {playfield}")]
    EntityTallerThanPlayfield {
        entity: &'static str,
        height: f32,
        playfield: f32,
    },

    #[error("speed bounds invalid: min {min}, default {default}, max {max}")]
    SpeedBounds { min: u32, default: u32, max: u32 },

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// How speed turns into per-tick displacement
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MotionModel {
    /// Speed is displacement per tick; fall rate follows the frame rate
    #[default]
    PerTick,
    /// Speed is displacement per reference frame, scaled by real elapsed time
    FrameScaled { reference_frame_ms: f64 },
}

impl MotionModel {
    /// Multiplier applied to speed (and score gain) for a tick `elapsed_ms` long
    pub fn displacement_factor(&self, elapsed_ms: f64) -> f64 {
        match *self {
            MotionModel::PerTick => 1.0,
            MotionModel::FrameScaled { reference_frame_ms } => {
                elapsed_ms.max(0.0) / reference_frame_ms
            }
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Playfield ===
    pub width: f32,
    pub height: f32,
    pub road_width: f32,
    pub lane_count: usize,

    // === Entities ===
    pub player_width: f32,
    pub player_height: f32,
    /// Distance from the player's bottom edge to the playfield bottom
    pub player_bottom_margin: f32,
    pub obstacle_width: f32,
    pub obstacle_height: f32,

    // === Timing ===
    pub spawn_interval_ms: f64,
    pub motion: MotionModel,

    // === Speed & score ===
    pub min_speed: u32,
    pub max_speed: u32,
    pub default_speed: u32,
    pub score_divisor: f64,

    /// Road marking repeat distance
    pub marking_period: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_PLAYFIELD_WIDTH,
            height: DEFAULT_PLAYFIELD_HEIGHT,
            road_width: DEFAULT_PLAYFIELD_WIDTH,
            lane_count: DEFAULT_LANE_COUNT,

            player_width: CAR_WIDTH,
            player_height: CAR_HEIGHT,
            player_bottom_margin: PLAYER_BOTTOM_MARGIN,
            obstacle_width: OBSTACLE_WIDTH,
            obstacle_height: OBSTACLE_HEIGHT,

            spawn_interval_ms: SPAWN_INTERVAL_MS,
            motion: MotionModel::PerTick,

            min_speed: MIN_SPEED,
            max_speed: MAX_SPEED,
            default_speed: DEFAULT_SPEED,
            score_divisor: SCORE_DIVISOR,

            marking_period: MARKING_PERIOD,
        }
    }
}

impl EngineConfig {
    /// Size the playfield to a viewport; the road takes 80% of it, capped at 400
    pub fn for_viewport(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            road_width: MAX_ROAD_WIDTH.min(width * ROAD_VIEWPORT_FRACTION),
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON config and validate it
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Width of a single lane
    #[inline]
    pub fn lane_width(&self) -> f32 {
        self.road_width / self.lane_count as f32
    }

    /// Check every invariant the simulation relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.lane_count == 0 {
            return Err(ConfigError::NoLanes);
        }

        let positives = [
            ("width", self.width as f64),
            ("height", self.height as f64),
            ("road_width", self.road_width as f64),
            ("player_width", self.player_width as f64),
            ("player_height", self.player_height as f64),
            ("obstacle_width", self.obstacle_width as f64),
            ("obstacle_height", self.obstacle_height as f64),
            ("spawn_interval_ms", self.spawn_interval_ms),
            ("score_divisor", self.score_divisor),
            ("marking_period", self.marking_period as f64),
        ];
        for (name, value) in positives {
            // Written negated so NaN is rejected too
            if !(value > 0.0) {
                return Err(ConfigError::NonPositive { name, value });
            }
        }
        if self.player_bottom_margin < 0.0 {
            return Err(ConfigError::NonPositive {
                name: "player_bottom_margin",
                value: self.player_bottom_margin as f64,
            });
        }
        if let MotionModel::FrameScaled { reference_frame_ms } = self.motion {
            if !(reference_frame_ms > 0.0) {
                return Err(ConfigError::NonPositive {
                    name: "reference_frame_ms",
                    value: reference_frame_ms,
                });
            }
        }

        if self.road_width > self.width {
            return Err(ConfigError::RoadTooWide {
                road: self.road_width,
                playfield: self.width,
            });
        }

        // Strictly narrower: touching boxes collide, so equal widths would make
        // neighbouring lanes collide
        let lane_width = self.lane_width();
        for (entity, width) in [("player", self.player_width), ("obstacle", self.obstacle_width)] {
            if width >= lane_width {
                return Err(ConfigError::EntityWiderThanLane {
                    entity,
                    width,
                    lane_width,
                });
            }
        }

        if self.player_height + self.player_bottom_margin > self.height {
            return Err(ConfigError::EntityTallerThanPlayfield {
                entity: "player",
                height: self.player_height + self.player_bottom_margin,
                playfield: self.height,
            });
        }
        if self.obstacle_height > self.height {
            return Err(ConfigError::EntityTallerThanPlayfield {
                entity: "obstacle",
                height: self.obstacle_height,
                playfield: self.height,
            });
        }

        if self.min_speed == 0
            || self.min_speed > self.max_speed
            || !(self.min_speed..=self.max_speed).contains(&self.default_speed)
        {
            return Err(ConfigError::SpeedBounds {
                min: self.min_speed,
                default: self.default_speed,
                max: self.max_speed,
            });
        }

        Ok(())
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "lane_rush_config";

    /// Load config override from LocalStorage, else size to the window (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored config: {}", e),
                }
            }
        }

        log::info!("Using viewport-sized default config");
        Self::from_window()
    }

    /// Defaults sized to the browser window
    #[cfg(target_arch = "wasm32")]
    fn from_window() -> Self {
        let dimension = |value: Result<wasm_bindgen::JsValue, wasm_bindgen::JsValue>| {
            value.ok().and_then(|v| v.as_f64())
        };
        let size = web_sys::window()
            .and_then(|w| Some((dimension(w.inner_width())?, dimension(w.inner_height())?)));

        match size {
            Some((width, height)) => Self::for_viewport(width as f32, height as f32),
            None => Self::default(),
        }
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lane_count, 3);
        assert_eq!(config.default_speed, 5);
        assert_eq!(config.spawn_interval_ms, 1500.0);
        assert_eq!(config.marking_period, 40.0);
        assert!((config.lane_width() - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_for_viewport_caps_road() {
        let wide = EngineConfig::for_viewport(1920.0, 1080.0);
        assert_eq!(wide.road_width, 400.0);

        let narrow = EngineConfig::for_viewport(300.0, 600.0);
        assert!((narrow.road_width - 240.0).abs() < 0.001);
        assert!(narrow.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"lane_count": 4, "road_width": 280}"#).unwrap();
        assert_eq!(config.lane_count, 4);
        assert_eq!(config.default_speed, DEFAULT_SPEED);
        assert_eq!(config.motion, MotionModel::PerTick);
    }

    #[test]
    fn test_motion_model_json() {
        let config = EngineConfig::from_json(
            r#"{"motion": {"kind": "frame_scaled", "reference_frame_ms": 16.0}}"#,
        )
        .unwrap();
        assert_eq!(
            config.motion,
            MotionModel::FrameScaled {
                reference_frame_ms: 16.0
            }
        );
        assert!((config.motion.displacement_factor(32.0) - 2.0).abs() < 1e-9);
        assert_eq!(MotionModel::PerTick.displacement_factor(32.0), 1.0);
    }

    #[test]
    fn test_rejects_bad_json() {
        assert!(matches!(
            EngineConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_zero_lanes() {
        let config = EngineConfig {
            lane_count: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoLanes)));
    }

    #[test]
    fn test_rejects_entity_as_wide_as_lane() {
        let config = EngineConfig {
            obstacle_width: 100.0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EntityWiderThanLane { entity: "obstacle", .. })
        ));
    }

    #[test]
    fn test_rejects_road_wider_than_playfield() {
        let config = EngineConfig {
            road_width: 301.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::RoadTooWide { .. })));
    }

    #[test]
    fn test_rejects_speed_bounds() {
        let config = EngineConfig {
            default_speed: 11,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::SpeedBounds { .. })));

        let config = EngineConfig {
            min_speed: 0,
            default_speed: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_nan_dimension() {
        let config = EngineConfig {
            height: f32::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositive { name: "height", .. })
        ));
    }
}
