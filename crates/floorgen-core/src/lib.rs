//! FloorGen Core - Deterministic Procedural Floor Layouts
//!
//! Grows a connected floor of rooms from a door budget and a catalog of
//! room templates. Rooms attach through typed sockets, candidate placements
//! are rejected when they overlap placed geometry, and every accepted floor
//! has exactly one reachable exit room. A seed fixes the whole layout, and
//! a floor's first layout is cached so revisits replay it verbatim.
//!
//! # Architecture
//!
//! Placed rooms live in a `hecs` world owned by the generator:
//! - **Entities**: rooms, connectors (doors), blockades
//! - **Components**: `RoomInstance`, `Connector`, `Blockade`
//! - **Generator**: a phase machine driving placement over the world
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`cache`] | Floor state, cached layouts, `FloorStore` persistence hooks |
//! | [`catalog`] | Room templates, filtered lookup, weighted pick, identity resolution |
//! | [`config`] | Generator configuration and seed mode |
//! | [`error`] | Error enums for catalog, occupancy and generation failures |
//! | [`generator`] | Layout generator phases, retries and replay |
//! | [`geometry`] | Vectors, quaternions, transforms, boxes, spatial records |
//! | [`hooks`] | Host callbacks: lifecycle signals and navigation rebuild |
//! | [`instance`] | Room/connector/blockade components and spawn helpers |
//! | [`occupancy`] | Broad-phase registry of placed footprints |
//! | [`persistence`] | bincode save/load of floor bookkeeping |
//! | [`resolver`] | Socket alignment, narrow phase, connect/disconnect/seal |
//! | [`rng`] | Seeded, draw-counting random source |
//! | [`socket`] | Socket types, specs and live socket state |
//! | [`validate`] | Layout checks: overlap, socket symmetry, exit reachability |
//!
//! # Example
//!
//! ```rust,no_run
//! use floorgen_core::prelude::*;
//!
//! let json = std::fs::read_to_string("data/station_catalog.json").unwrap();
//! let catalog = RoomCatalog::from_json(&json).unwrap();
//! let mut generator = LayoutGenerator::new(catalog, GeneratorConfig::default(), MemoryFloorStore::new(12345));
//!
//! let report = generator.generate(0).unwrap();
//! println!("{} rooms, {} connections", report.room_count, report.connections_made);
//! ```

pub mod cache;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod hooks;
pub mod instance;
pub mod occupancy;
pub mod persistence;
pub mod resolver;
pub mod rng;
pub mod socket;
pub mod validate;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::cache::{CachedLayout, CachedPlacement, FloorState, FloorStore, MemoryFloorStore};
    pub use crate::catalog::{RoomCatalog, RoomCategory, RoomGeometry, RoomTemplate};
    pub use crate::config::{GeneratorConfig, SeedMode};
    pub use crate::error::{CatalogError, GenerationError, OccupancyError, ReplayError};
    pub use crate::generator::{GenerationPhase, GenerationReport, GeneratorSnapshot, LayoutGenerator};
    pub use crate::geometry::{Aabb, LocalBounds, LocalBox, Quat, SpatialRecord, Transform, Vec3};
    pub use crate::hooks::{GenerationHooks, GenerationSignal, NoopHooks, RecordingHooks};
    pub use crate::instance::{Blockade, Connector, RoomInstance};
    pub use crate::socket::{SocketRef, SocketSpec, SocketType};
}
