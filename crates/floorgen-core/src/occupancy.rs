//! Occupancy registry - the broad-phase store of placed room footprints.
//!
//! Every placed room registers one `SpatialRecord` snapshot. Candidate
//! placements are rejected if their footprint collides with anything
//! registered, except for a bounded XZ overlap with the room they are
//! connecting from (door frames poke into each other).

use hecs::Entity;

use crate::error::OccupancyError;
use crate::geometry::{Aabb, SpatialRecord};

/// Default tolerated overlap with the source room, as a fraction of the
/// smaller footprint
pub const DEFAULT_MAX_OVERLAP_FRACTION: f32 = 0.15;

/// One registered footprint
#[derive(Debug, Clone)]
pub struct OccupancyEntry {
    pub owner: Entity,
    pub record: SpatialRecord,
    /// Monotonic registration counter
    pub order: u64,
}

/// Set of footprints for the floor currently being built
#[derive(Debug, Clone)]
pub struct OccupancyRegistry {
    entries: Vec<OccupancyEntry>,
    next_order: u64,
    max_overlap_fraction: f32,
}

impl OccupancyRegistry {
    pub fn new(max_overlap_fraction: f32) -> Self {
        Self {
            entries: Vec::new(),
            next_order: 0,
            max_overlap_fraction,
        }
    }

    pub fn max_overlap_fraction(&self) -> f32 {
        self.max_overlap_fraction
    }

    /// Register a room footprint. Each owner may appear at most once.
    pub fn register(&mut self, owner: Entity, record: SpatialRecord) -> Result<(), OccupancyError> {
        if self.contains(owner) {
            return Err(OccupancyError::DuplicateRegistration(owner));
        }
        self.entries.push(OccupancyEntry {
            owner,
            record,
            order: self.next_order,
        });
        self.next_order += 1;
        Ok(())
    }

    /// Remove an owner's footprint. No-op when absent.
    pub fn unregister(&mut self, owner: Entity) {
        self.entries.retain(|e| e.owner != owner);
    }

    pub fn contains(&self, owner: Entity) -> bool {
        self.entries.iter().any(|e| e.owner == owner)
    }

    pub fn get(&self, owner: Entity) -> Option<&OccupancyEntry> {
        self.entries.iter().find(|e| e.owner == owner)
    }

    pub fn entries(&self) -> &[OccupancyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_order = 0;
    }

    /// Would `test` collide with any registered footprint?
    ///
    /// `ignore_owner` is the room being connected from; overlap with it is
    /// tolerated up to the configured fraction of the smaller XZ footprint.
    pub fn query_occupied(&self, test: &SpatialRecord, ignore_owner: Option<Entity>) -> bool {
        for entry in &self.entries {
            if !entry.record.encapsulating.intersects(&test.encapsulating) {
                continue;
            }

            if ignore_owner == Some(entry.owner) {
                if self.exceeds_overlap_allowance(&entry.record, test) {
                    return true;
                }
                continue;
            }

            if entry.record.is_compound() || test.is_compound() {
                if entry.record.intersects(test) {
                    return true;
                }
                continue;
            }

            return true;
        }
        false
    }

    fn exceeds_overlap_allowance(&self, placed: &SpatialRecord, test: &SpatialRecord) -> bool {
        let overlap = placed.xz_overlap_area(test);
        let smaller = placed.footprint_area().min(test.footprint_area());
        overlap > self.max_overlap_fraction * smaller
    }

    /// Union of every registered footprint, for the navigation rebuild
    pub fn combined_bounds(&self) -> Option<Aabb> {
        self.entries
            .iter()
            .map(|e| e.record.encapsulating)
            .reduce(|acc, b| acc.union(&b))
    }
}

impl Default for OccupancyRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_OVERLAP_FRACTION)
    }
}
