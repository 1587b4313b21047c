//! Generator configuration

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::occupancy::DEFAULT_MAX_OVERLAP_FRACTION;

/// Where attempt seeds come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedMode {
    /// Use the floor's persisted generation seed; identical seeds reproduce
    /// identical floors
    Persisted,
    /// Draw a fresh seed from OS entropy every pass
    Random,
}

/// Configuration for floor generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Connections to make per floor (one is reserved for the exit)
    pub door_budget: u32,
    /// Tries per frontier socket before it is given up
    pub placement_attempts: u32,
    /// Whole-floor retries before exit failure becomes fatal
    pub max_generation_attempts: u32,
    /// Accept a floor only once this fraction of the budget is used
    pub min_budget_fraction: f32,
    /// Tolerated XZ overlap with the source room, fraction of the smaller footprint
    pub max_overlap_fraction: f32,
    pub seed_mode: SeedMode,
    /// Restrict growth templates to one sector
    pub sector: Option<u32>,
    /// Start room override (identity lookup); entry elevator otherwise
    pub start_template: Option<String>,
    pub spawn_connectors: bool,
    pub spawn_blockades: bool,
    /// Max distance between joined socket points
    pub socket_snap_tolerance: f32,
    /// Max distance between sockets relinked on replay
    pub replay_link_distance: f32,
    /// Padding passed to the navigation rebuild
    pub navigation_padding: f32,
    /// Record and replay layouts per floor
    pub cache_layouts: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            door_budget: 20,
            placement_attempts: 8,
            max_generation_attempts: 10,
            min_budget_fraction: 0.8,
            max_overlap_fraction: DEFAULT_MAX_OVERLAP_FRACTION,
            seed_mode: SeedMode::Persisted,
            sector: None,
            start_template: None,
            spawn_connectors: true,
            spawn_blockades: true,
            socket_snap_tolerance: 0.05,
            replay_link_distance: 0.5,
            navigation_padding: 2.0,
            cache_layouts: true,
        }
    }
}

impl GeneratorConfig {
    /// Load a (possibly partial) config from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_budget(mut self, door_budget: u32) -> Self {
        self.door_budget = door_budget;
        self
    }

    /// Reject settings that would make a pass meaningless
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.door_budget == 0 {
            return Err(GenerationError::InvalidBudget);
        }
        if self.max_generation_attempts == 0 {
            return Err(GenerationError::InvalidConfig("max_generation_attempts must be at least 1"));
        }
        if self.placement_attempts == 0 {
            return Err(GenerationError::InvalidConfig("placement_attempts must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_budget_fraction) {
            return Err(GenerationError::InvalidConfig("min_budget_fraction must be within 0..=1"));
        }
        if !(0.0..=1.0).contains(&self.max_overlap_fraction) {
            return Err(GenerationError::InvalidConfig("max_overlap_fraction must be within 0..=1"));
        }
        if self.socket_snap_tolerance < 0.0 || self.replay_link_distance < 0.0 {
            return Err(GenerationError::InvalidConfig("distance tolerances must be non-negative"));
        }
        Ok(())
    }
}
