//! Layout generator - grows a floor of connected rooms from a door budget.
//!
//! A pass clears the previous floor, seeds the RNG for the attempt, places
//! the start room, grows rooms off random frontier sockets until one credit
//! is left, spends that credit on the exit room and finally seals every
//! open socket. Attempts whose exit cannot be placed, or that used too
//! little of the budget, are retried with the next seed. The first accepted
//! floor is cached per floor number and replayed verbatim on revisit.

mod grow;
mod replay;
mod state;

pub use state::{GenerationPhase, GenerationReport, GenerationState, GeneratorSnapshot};

use hecs::{Entity, World};
use std::sync::Arc;

use crate::cache::{CachedLayout, CachedPlacement, FloorStore, MemoryFloorStore};
use crate::catalog::{RoomCatalog, RoomCategory, RoomTemplate};
use crate::config::{GeneratorConfig, SeedMode};
use crate::error::GenerationError;
use crate::geometry::Transform;
use crate::hooks::{GenerationHooks, GenerationSignal, NoopHooks};
use crate::instance::{destroy_room, RoomInstance};
use crate::occupancy::OccupancyRegistry;
use crate::rng::LayoutRng;
use crate::socket::SocketRef;

/// Start template named by `config`, or the catalog's entry elevator
fn resolve_start_template<'a>(
    catalog: &'a RoomCatalog,
    config: &GeneratorConfig,
) -> Result<&'a RoomTemplate, GenerationError> {
    match &config.start_template {
        Some(id) => catalog
            .start_template(Some(id))
            .ok_or_else(|| GenerationError::UnknownStartTemplate(id.clone())),
        None => catalog
            .start_template(None)
            .ok_or(GenerationError::MissingTemplate(RoomCategory::EntryElevator)),
    }
}

/// Floor layout generator
pub struct LayoutGenerator<S = MemoryFloorStore, H = NoopHooks> {
    /// Placed rooms, connectors and blockades
    pub world: World,
    catalog: Arc<RoomCatalog>,
    config: GeneratorConfig,
    /// Transform of the start room
    origin: Transform,
    registry: OccupancyRegistry,
    rng: LayoutRng,
    state: GenerationState,
    phase: GenerationPhase,
    store: S,
    hooks: H,
}

impl<S: FloorStore> LayoutGenerator<S, NoopHooks> {
    pub fn new(catalog: impl Into<Arc<RoomCatalog>>, config: GeneratorConfig, store: S) -> Self {
        let registry = OccupancyRegistry::new(config.max_overlap_fraction);
        Self {
            world: World::new(),
            catalog: catalog.into(),
            config,
            origin: Transform::IDENTITY,
            registry,
            rng: LayoutRng::new(0),
            state: GenerationState::default(),
            phase: GenerationPhase::Idle,
            store,
            hooks: NoopHooks,
        }
    }
}

impl<S: FloorStore, H: GenerationHooks> LayoutGenerator<S, H> {
    /// Replace the host callbacks
    pub fn with_hooks<H2: GenerationHooks>(self, hooks: H2) -> LayoutGenerator<S, H2> {
        LayoutGenerator {
            world: self.world,
            catalog: self.catalog,
            config: self.config,
            origin: self.origin,
            registry: self.registry,
            rng: self.rng,
            state: self.state,
            phase: self.phase,
            store: self.store,
            hooks,
        }
    }

    pub fn with_origin(mut self, origin: Transform) -> Self {
        self.origin = origin;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &RoomCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &OccupancyRegistry {
        &self.registry
    }

    pub fn rng(&self) -> &LayoutRng {
        &self.rng
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn phase(&self) -> GenerationPhase {
        self.phase
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn start_room(&self) -> Option<Entity> {
        self.state.start_room()
    }

    pub fn exit_room(&self) -> Option<Entity> {
        self.state.rooms.iter().copied().find(|&room| {
            self.world
                .get::<&RoomInstance>(room)
                .map(|r| r.is_exit())
                .unwrap_or(false)
        })
    }

    pub fn snapshot(&self) -> GeneratorSnapshot {
        GeneratorSnapshot {
            phase: self.phase,
            floor: self.state.floor,
            budget: self.state.budget,
            credits_remaining: self.state.credits_remaining,
            connections_made: self.state.connections_made,
            frontier_len: self.state.frontier.len(),
            room_count: self.state.rooms.len(),
            blockade_count: self.state.blockades.len(),
            registered_footprints: self.registry.len(),
            exit_placed: self.state.exit_placed,
            attempt: self.state.attempt,
            active_seed: self.state.active_seed,
            rng_draws: self.rng.draws(),
        }
    }

    /// Template identity and world transform of every placed room, in
    /// placement order
    pub fn placements(&self) -> Vec<CachedPlacement> {
        self.state
            .rooms
            .iter()
            .filter_map(|&room| {
                let r = self.world.get::<&RoomInstance>(room).ok()?;
                Some(CachedPlacement {
                    template_id: r.template_id.clone(),
                    position: r.transform.position,
                    rotation: r.transform.rotation,
                    name: r.name.clone(),
                })
            })
            .collect()
    }

    /// Every unconnected socket on the floor, in placement order
    pub fn open_sockets(&self) -> Vec<SocketRef> {
        let mut open = Vec::new();
        for &room in &self.state.rooms {
            if let Ok(r) = self.world.get::<&RoomInstance>(room) {
                open.extend(r.open_sockets().map(|i| SocketRef::new(room, i)));
            }
        }
        open
    }

    /// Destroy the current floor and return to idle
    pub fn clear(&mut self) {
        self.clear_instances();
        self.state = GenerationState::default();
        self.phase = GenerationPhase::Idle;
    }

    /// Generate (or replay) `floor`. Always clears the previous floor first.
    pub fn generate(&mut self, floor: u32) -> Result<GenerationReport, GenerationError> {
        self.check_preconditions()?;

        let floor_state = self.store.floor_state(floor);
        let base_seed = match self.config.seed_mode {
            SeedMode::Persisted => floor_state
                .generation_seed
                .ok_or(GenerationError::SeedUnavailable(floor))?,
            SeedMode::Random => rand::random(),
        };

        log::info!(
            "Generating floor {} (budget {}, seed {})",
            floor,
            self.config.door_budget,
            base_seed
        );
        self.hooks.on_signal(GenerationSignal::Started { floor });

        let result = self.run(floor, base_seed, floor_state.cached_layout);
        let success = result.is_ok();

        if success {
            self.store.mark_visited(floor);
            if let Some(bounds) = self.registry.combined_bounds() {
                self.hooks.rebuild_navigation(&bounds, self.config.navigation_padding);
            }
        }

        match &result {
            Ok(report) => log::info!(
                "Floor {} ready: {} rooms, {} connections, {} credits left{}",
                floor,
                report.room_count,
                report.connections_made,
                report.credits_remaining,
                if report.replayed { " (replayed)" } else { "" }
            ),
            Err(e) => log::warn!("Floor {} generation failed: {}", floor, e),
        }

        self.phase = GenerationPhase::Done { success };
        self.hooks.on_signal(GenerationSignal::Completed { floor, success });
        result
    }

    fn check_preconditions(&self) -> Result<(), GenerationError> {
        self.config.validate()?;
        if self.catalog.is_empty() {
            return Err(GenerationError::EmptyCatalog);
        }
        resolve_start_template(&self.catalog, &self.config)?;
        if self.catalog.by_category(RoomCategory::ExitElevator, false).is_empty() {
            return Err(GenerationError::MissingTemplate(RoomCategory::ExitElevator));
        }
        Ok(())
    }

    fn run(
        &mut self,
        floor: u32,
        base_seed: u64,
        cached: Option<CachedLayout>,
    ) -> Result<GenerationReport, GenerationError> {
        if self.config.cache_layouts {
            if let Some(layout) = cached {
                match self.replay(floor, base_seed, &layout) {
                    Ok(report) => return Ok(report),
                    Err(e) => {
                        log::warn!("Discarding cached layout for floor {}: {}", floor, e);
                        self.store.discard_layout(floor);
                    }
                }
            }
        }

        let report = self.generate_fresh(floor, base_seed)?;

        if self.config.cache_layouts {
            self.phase = GenerationPhase::CachingOrReplaying;
            self.store.store_layout(floor, CachedLayout::new(self.placements()));
        }
        Ok(report)
    }

    fn generate_fresh(&mut self, floor: u32, base_seed: u64) -> Result<GenerationReport, GenerationError> {
        let max_attempts = self.config.max_generation_attempts;

        for attempt in 0..max_attempts {
            self.phase = GenerationPhase::Seeding;
            let seed = base_seed.wrapping_add(attempt as u64);

            self.phase = GenerationPhase::Clearing;
            self.clear_instances();
            self.rng.set_seed(seed);
            self.state.begin(floor, self.config.door_budget, attempt, seed);

            self.phase = GenerationPhase::PlacingStart;
            self.place_start()?;

            self.phase = GenerationPhase::Growing;
            self.grow();

            self.phase = GenerationPhase::PlacingExit;
            if !self.place_exit() {
                log::warn!(
                    "Floor {} attempt {}: no room for the exit (seed {})",
                    floor,
                    attempt + 1,
                    seed
                );
                continue;
            }

            let used = self.state.used_fraction();
            let under_budget = used < self.config.min_budget_fraction;
            if under_budget && self.state.credits_remaining != 0 && attempt + 1 < max_attempts {
                log::info!(
                    "Floor {} attempt {}: used {:.0}% of budget, retrying",
                    floor,
                    attempt + 1,
                    used * 100.0
                );
                continue;
            }
            if under_budget {
                log::warn!(
                    "Floor {} accepted under budget: {} of {} connections",
                    floor,
                    self.state.connections_made,
                    self.state.budget
                );
            }

            self.phase = GenerationPhase::SealingDeadEnds;
            self.seal_dead_ends();

            return Ok(self.report(attempt + 1, under_budget));
        }

        Err(GenerationError::ExitUnplaceable {
            floor,
            attempts: max_attempts,
        })
    }

    fn report(&self, attempts: u32, under_budget: bool) -> GenerationReport {
        GenerationReport {
            floor: self.state.floor,
            seed: self.state.active_seed,
            attempts,
            room_count: self.state.rooms.len(),
            connections_made: self.state.connections_made,
            credits_remaining: self.state.credits_remaining,
            used_fraction: self.state.used_fraction(),
            replayed: self.state.replayed,
            under_budget,
        }
    }

    /// Remove every room, connector and blockade of the current floor
    fn clear_instances(&mut self) {
        for room in std::mem::take(&mut self.state.rooms) {
            destroy_room(&mut self.world, room);
        }
        for blockade in std::mem::take(&mut self.state.blockades) {
            let _ = self.world.despawn(blockade);
        }
        self.state.frontier.clear();
        self.registry.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Connector;

    const STATION_JSON: &str = include_str!("../../../../data/station_catalog.json");

    fn station() -> Arc<RoomCatalog> {
        Arc::new(RoomCatalog::from_json(STATION_JSON).unwrap())
    }

    /// Set up an attempt by hand so growth can be stepped
    fn start_attempt(generator: &mut LayoutGenerator, seed: u64) {
        generator.rng.set_seed(seed);
        generator.state.begin(0, generator.config.door_budget, 0, seed);
        generator.place_start().unwrap();
    }

    #[test]
    fn test_budget_conserved_at_every_growth_step() {
        let catalog = station();
        for seed in 0..40u64 {
            let mut generator =
                LayoutGenerator::new(Arc::clone(&catalog), GeneratorConfig::default(), MemoryFloorStore::new(seed));
            start_attempt(&mut generator, seed);

            let mut steps = 0;
            while generator.grow_step() {
                let snapshot = generator.snapshot();
                assert_eq!(
                    snapshot.connections_made + snapshot.credits_remaining,
                    snapshot.budget,
                    "seed {} step {}",
                    seed,
                    steps
                );
                assert!(snapshot.credits_remaining >= 1, "exit credit spent during growth");
                steps += 1;
            }

            if generator.place_exit() {
                let snapshot = generator.snapshot();
                assert_eq!(snapshot.connections_made + snapshot.credits_remaining, snapshot.budget);
            }
        }
    }

    #[test]
    fn test_connections_match_connectors() {
        let catalog = station();
        for seed in 0..40u64 {
            let mut generator =
                LayoutGenerator::new(Arc::clone(&catalog), GeneratorConfig::default(), MemoryFloorStore::new(seed));
            start_attempt(&mut generator, seed);
            generator.grow();

            let connectors = generator.world.query::<&Connector>().iter().count() as u32;
            assert_eq!(connectors, generator.state().connections_made, "seed {}", seed);
        }
    }

    #[test]
    fn test_start_template_resolution() {
        let catalog = station();
        assert_eq!(
            resolve_start_template(&catalog, &GeneratorConfig::default()).unwrap().id,
            "entry_lift"
        );

        let config = GeneratorConfig {
            start_template: Some("no_such_room".into()),
            ..Default::default()
        };
        assert_eq!(
            resolve_start_template(&catalog, &config).unwrap_err(),
            GenerationError::UnknownStartTemplate("no_such_room".into())
        );
    }
}
