//! High score leaderboard
//!
//! Finished runs, best first. A run ranks by final score; between equal
//! scores the one that got there in fewer ticks (i.e. drove faster) ranks
//! higher, then the earlier run. Persisted to LocalStorage on web.

use serde::{Deserialize, Serialize};

use crate::sim::SimEvent;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// One finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final (floored) score
    pub score: u64,
    /// Speed the run ended at
    pub speed: u32,
    /// Movement ticks survived
    #[serde(default)]
    pub ticks: u64,
    /// Lane moves made during the run
    #[serde(default)]
    pub lane_changes: u32,
    /// Host timestamp (ms) when the run ended
    pub timestamp: f64,
}

impl HighScoreEntry {
    /// Build an entry from the collision that ended a run.
    ///
    /// `speed` is the simulation's speed at that moment; other events give `None`.
    pub fn from_collision(event: &SimEvent, speed: u32, timestamp: f64) -> Option<Self> {
        match *event {
            SimEvent::Collided {
                score,
                ticks,
                lane_changes,
                ..
            } => Some(Self {
                score,
                speed,
                ticks,
                lane_changes,
                timestamp,
            }),
            _ => None,
        }
    }

    /// Whether this run ranks strictly above `other`
    fn beats(&self, other: &HighScoreEntry) -> bool {
        (self.score, std::cmp::Reverse(self.ticks)) > (other.score, std::cmp::Reverse(other.ticks))
    }
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "lane_rush_highscores";

    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a run would make the board. Scoreless runs never do.
    pub fn qualifies(&self, entry: &HighScoreEntry) -> bool {
        entry.score > 0
            && (self.entries.len() < MAX_HIGH_SCORES
                || self.entries.last().is_none_or(|last| entry.beats(last)))
    }

    /// Record a finished run. Returns the 1-based rank, or None if it
    /// didn't make the board.
    pub fn add_run(&mut self, entry: HighScoreEntry) -> Option<usize> {
        if !self.qualifies(&entry) {
            return None;
        }

        let index = self
            .entries
            .iter()
            .position(|e| entry.beats(e))
            .unwrap_or(self.entries.len());
        log::info!(
            "New high score {} ({} ticks, {} lane changes) at rank {}",
            entry.score,
            entry.ticks,
            entry.lane_changes,
            index + 1
        );
        self.entries.insert(index, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(index + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn best(&self) -> Option<&HighScoreEntry> {
        self.entries.first()
    }

    #[cfg(target_arch = "wasm32")]
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }

    /// Load the board from LocalStorage, or start empty (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = Self::storage()
            .and_then(|s| s.get_item(Self::STORAGE_KEY).ok().flatten())
            .map(|json| serde_json::from_str::<HighScores>(&json));

        match stored {
            Some(Ok(scores)) => {
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Some(Err(e)) => {
                log::warn!("Discarding unreadable high scores: {}", e);
                Self::new()
            }
            None => Self::new(),
        }
    }

    /// Write the board to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = Self::storage() else {
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(Self::STORAGE_KEY, &json).is_err() {
                    log::warn!("LocalStorage rejected high scores");
                }
            }
            Err(e) => log::warn!("Could not serialize high scores: {}", e),
        }
    }

    /// Native: nothing persisted
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::new()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}
