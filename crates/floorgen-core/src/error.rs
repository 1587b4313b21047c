//! Error types for catalog loading, occupancy bookkeeping and generation.

use hecs::Entity;
use thiserror::Error;

use crate::catalog::RoomCategory;

/// Occupancy registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OccupancyError {
    #[error("room {0:?} is already registered")]
    DuplicateRegistration(Entity),
}

/// Room catalog load/validation errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate template id '{0}'")]
    DuplicateTemplate(String),

    #[error("Template '{0}' has no sockets")]
    NoSockets(String),

    #[error("Template '{template}' socket {socket} has a zero-length forward direction")]
    InvalidSocket { template: String, socket: usize },
}

/// Generation errors surfaced to the caller of `generate`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("Room catalog is empty")]
    EmptyCatalog,

    #[error("No enabled {0:?} template in catalog")]
    MissingTemplate(RoomCategory),

    #[error("Start template '{0}' not found or disabled")]
    UnknownStartTemplate(String),

    #[error("Door budget must be at least 1")]
    InvalidBudget,

    #[error("Invalid generator config: {0}")]
    InvalidConfig(&'static str),

    #[error("No generation seed recorded for floor {0}")]
    SeedUnavailable(u32),

    #[error("Exit room could not be placed on floor {floor} after {attempts} attempts")]
    ExitUnplaceable { floor: u32, attempts: u32 },

    #[error(transparent)]
    Occupancy(#[from] OccupancyError),
}

/// Reasons a cached layout cannot be replayed. Always recovered by
/// regenerating the floor.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    #[error("Cached layout is empty or marked invalid")]
    InvalidLayout,

    #[error("Cached template '{0}' no longer resolves")]
    UnknownTemplate(String),

    #[error("Cached layout has no exit room")]
    MissingExit,

    #[error(transparent)]
    Occupancy(#[from] OccupancyError),
}
