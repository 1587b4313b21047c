//! Per-floor state and layout cache.
//!
//! A floor's first successful generation is recorded as an ordered list of
//! placements. Revisiting the floor replays that list verbatim instead of
//! growing a new layout. Floor state lives behind the `FloorStore` trait so
//! the host can keep it in its own save data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{Quat, Vec3};

/// Seed spacing between consecutive floors
const FLOOR_SEED_STRIDE: u64 = 1_000_003;

/// One placed room in a cached layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPlacement {
    /// Template identity (resolved with `RoomCatalog::find_by_identity`)
    pub template_id: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub name: String,
}

/// Snapshot of a generated floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedLayout {
    pub placements: Vec<CachedPlacement>,
    pub valid: bool,
}

impl CachedLayout {
    pub fn new(placements: Vec<CachedPlacement>) -> Self {
        Self {
            placements,
            valid: true,
        }
    }

    /// A layout can be replayed when it is flagged valid and non-empty
    pub fn is_usable(&self) -> bool {
        self.valid && !self.placements.is_empty()
    }
}

/// Persisted state of one floor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorState {
    pub floor: u32,
    /// `None` when the host never seeded this floor
    pub generation_seed: Option<u64>,
    pub visited: bool,
    pub cached_layout: Option<CachedLayout>,
}

impl FloorState {
    pub fn new(floor: u32, generation_seed: Option<u64>) -> Self {
        Self {
            floor,
            generation_seed,
            visited: false,
            cached_layout: None,
        }
    }
}

/// Persistence hooks the generator uses for floor bookkeeping
pub trait FloorStore {
    /// Get the floor's state, creating it on first access
    fn floor_state(&mut self, floor: u32) -> FloorState;

    fn mark_visited(&mut self, floor: u32);

    /// Record a layout. Ignored when the floor already has one.
    fn store_layout(&mut self, floor: u32, layout: CachedLayout);

    fn discard_layout(&mut self, floor: u32);
}

/// In-memory floor store. Per-floor seeds derive from a base seed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryFloorStore {
    base_seed: Option<u64>,
    floors: BTreeMap<u32, FloorState>,
}

impl MemoryFloorStore {
    pub fn new(base_seed: u64) -> Self {
        Self {
            base_seed: Some(base_seed),
            floors: BTreeMap::new(),
        }
    }

    /// Store without a seed source; only usable with random seeding or
    /// explicitly seeded floors
    pub fn unseeded() -> Self {
        Self::default()
    }

    /// Pin a floor's generation seed
    pub fn with_floor_seed(mut self, floor: u32, seed: u64) -> Self {
        let state = self.entry(floor);
        state.generation_seed = Some(seed);
        self
    }

    pub fn base_seed(&self) -> Option<u64> {
        self.base_seed
    }

    pub fn get(&self, floor: u32) -> Option<&FloorState> {
        self.floors.get(&floor)
    }

    pub fn floors(&self) -> impl Iterator<Item = &FloorState> {
        self.floors.values()
    }

    fn derive_seed(&self, floor: u32) -> Option<u64> {
        self.base_seed
            .map(|base| base.wrapping_add((floor as u64).wrapping_mul(FLOOR_SEED_STRIDE)))
    }

    fn entry(&mut self, floor: u32) -> &mut FloorState {
        let seed = self.derive_seed(floor);
        self.floors
            .entry(floor)
            .or_insert_with(|| FloorState::new(floor, seed))
    }
}

impl FloorStore for MemoryFloorStore {
    fn floor_state(&mut self, floor: u32) -> FloorState {
        self.entry(floor).clone()
    }

    fn mark_visited(&mut self, floor: u32) {
        self.entry(floor).visited = true;
    }

    fn store_layout(&mut self, floor: u32, layout: CachedLayout) {
        let state = self.entry(floor);
        if state.cached_layout.is_none() {
            state.cached_layout = Some(layout);
        }
    }

    fn discard_layout(&mut self, floor: u32) {
        self.entry(floor).cached_layout = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(id: &str) -> CachedPlacement {
        CachedPlacement {
            template_id: id.to_string(),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            name: format!("{}_00", id),
        }
    }

    #[test]
    fn test_floor_seeds_derive_from_base() {
        let mut store = MemoryFloorStore::new(100);
        assert_eq!(store.floor_state(0).generation_seed, Some(100));
        assert_eq!(store.floor_state(2).generation_seed, Some(100 + 2 * 1_000_003));
    }

    #[test]
    fn test_unseeded_store() {
        let mut store = MemoryFloorStore::unseeded().with_floor_seed(4, 9);
        assert_eq!(store.floor_state(0).generation_seed, None);
        assert_eq!(store.floor_state(4).generation_seed, Some(9));
    }

    #[test]
    fn test_layout_written_once() {
        let mut store = MemoryFloorStore::new(1);
        store.store_layout(0, CachedLayout::new(vec![placement("a")]));
        store.store_layout(0, CachedLayout::new(vec![placement("b")]));
        let layout = store.floor_state(0).cached_layout.unwrap();
        assert_eq!(layout.placements[0].template_id, "a");

        store.discard_layout(0);
        assert!(store.floor_state(0).cached_layout.is_none());
    }

    #[test]
    fn test_usable_layout() {
        assert!(CachedLayout::new(vec![placement("a")]).is_usable());
        assert!(!CachedLayout::new(Vec::new()).is_usable());
        let mut invalid = CachedLayout::new(vec![placement("a")]);
        invalid.valid = false;
        assert!(!invalid.is_usable());
    }

    #[test]
    fn test_mark_visited() {
        let mut store = MemoryFloorStore::new(1);
        assert!(!store.floor_state(3).visited);
        store.mark_visited(3);
        assert!(store.get(3).unwrap().visited);
    }
}
