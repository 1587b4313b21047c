//! Cached layout replay.
//!
//! Rebuilds a floor from its recorded placements without touching the RNG:
//! every room is spawned at its recorded transform, sockets that coincide are
//! relinked, and the rest are sealed.

use std::sync::Arc;

use super::{GenerationPhase, GenerationReport, LayoutGenerator};
use crate::cache::{CachedLayout, FloorStore};
use crate::catalog::{RoomCategory, RoomTemplate};
use crate::error::ReplayError;
use crate::geometry::Transform;
use crate::hooks::GenerationHooks;
use crate::instance::{spawn_room, RoomInstance};
use crate::resolver::connect;
use crate::socket::{SocketRef, WorldSocket};

impl<S: FloorStore, H: GenerationHooks> LayoutGenerator<S, H> {
    pub(super) fn replay(
        &mut self,
        floor: u32,
        base_seed: u64,
        layout: &CachedLayout,
    ) -> Result<GenerationReport, ReplayError> {
        if !layout.is_usable() {
            return Err(ReplayError::InvalidLayout);
        }

        // Resolve everything before touching the world
        let catalog = Arc::clone(&self.catalog);
        let templates = layout
            .placements
            .iter()
            .map(|p| {
                catalog
                    .find_by_identity(&p.template_id)
                    .ok_or_else(|| ReplayError::UnknownTemplate(p.template_id.clone()))
            })
            .collect::<Result<Vec<&RoomTemplate>, _>>()?;
        if !templates.iter().any(|t| t.category == RoomCategory::ExitElevator) {
            return Err(ReplayError::MissingExit);
        }

        self.phase = GenerationPhase::Clearing;
        self.clear_instances();
        self.rng.set_seed(base_seed);
        self.state.begin(floor, self.config.door_budget, 0, base_seed);
        self.state.replayed = true;

        self.phase = GenerationPhase::CachingOrReplaying;
        for (placement, template) in layout.placements.iter().zip(&templates) {
            let transform = Transform::new(placement.position, placement.rotation);
            let room = spawn_room(&mut self.world, template, transform, placement.name.clone());
            self.state.rooms.push(room);
            self.registry
                .register(room, template.geometry.bounds.to_world(&transform))?;
            if template.category == RoomCategory::ExitElevator {
                self.state.exit_placed = true;
            }
        }

        let links = self.relink_by_proximity();
        self.state.connections_made = links;
        self.state.credits_remaining = self.state.budget.saturating_sub(links);

        self.phase = GenerationPhase::SealingDeadEnds;
        self.seal_dead_ends();

        log::info!(
            "Replayed floor {} from cache: {} rooms, {} links",
            floor,
            self.state.rooms.len(),
            links
        );
        Ok(self.report(0, false))
    }

    /// Connect same-typed open sockets on different rooms that lie within
    /// the replay link distance. Earlier rooms initiate, so connectors end up
    /// on the same side as when the floor was grown.
    fn relink_by_proximity(&mut self) -> u32 {
        let mut sockets: Vec<(SocketRef, WorldSocket)> = Vec::new();
        for &room in &self.state.rooms {
            if let Ok(r) = self.world.get::<&RoomInstance>(room) {
                for (index, socket) in r.sockets.iter().enumerate() {
                    sockets.push((SocketRef::new(room, index), WorldSocket::of(socket, &r.transform)));
                }
            }
        }

        let max_distance = self.config.replay_link_distance;
        let mut links = 0;
        for i in 0..sockets.len() {
            for j in (i + 1)..sockets.len() {
                let (a, wa) = sockets[i];
                let (b, wb) = sockets[j];
                if a.room == b.room || wa.socket_type != wb.socket_type {
                    continue;
                }
                if wa.point.distance(&wb.point) > max_distance {
                    continue;
                }
                if connect(&mut self.world, a, b, self.config.spawn_connectors).is_connected() {
                    links += 1;
                }
            }
        }
        links
    }
}
