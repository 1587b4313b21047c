//! Placement phases: start room, frontier growth, exit room, dead-end sealing.

use hecs::Entity;
use std::sync::Arc;

use super::{resolve_start_template, LayoutGenerator};
use crate::cache::FloorStore;
use crate::catalog::{RoomCatalog, RoomCategory, RoomTemplate};
use crate::error::GenerationError;
use crate::geometry::Transform;
use crate::hooks::GenerationHooks;
use crate::instance::{destroy_room, spawn_room, RoomInstance};
use crate::resolver::{compute_alignment, connect, seal, sockets_meet, world_socket};
use crate::socket::{SocketRef, WorldSocket};

impl<S: FloorStore, H: GenerationHooks> LayoutGenerator<S, H> {
    /// Place the start template at the origin and open its sockets
    pub(super) fn place_start(&mut self) -> Result<Entity, GenerationError> {
        let catalog = Arc::clone(&self.catalog);
        let template = resolve_start_template(&catalog, &self.config)?;

        let name = self.instance_name(template);
        let room = spawn_room(&mut self.world, template, self.origin, name);
        let record = template.geometry.bounds.to_world(&self.origin);
        self.registry.register(room, record)?;
        self.state.rooms.push(room);
        self.push_open_sockets(room);

        log::debug!("Start room '{}' placed", template.id);
        Ok(room)
    }

    /// Grow rooms off random frontier sockets until one credit is left for
    /// the exit or the frontier runs dry
    pub(super) fn grow(&mut self) {
        while self.grow_step() {}
    }

    /// Pop one frontier socket and try to grow a room off it. Returns
    /// false once growth is over.
    pub(super) fn grow_step(&mut self) -> bool {
        if self.state.credits_remaining <= 1 || self.state.frontier.is_empty() {
            return false;
        }
        let catalog = Arc::clone(&self.catalog);

        let pick = self.rng.index(self.state.frontier.len());
        let source = self.state.frontier.swap_remove(pick);

        let source_socket = match world_socket(&self.world, source) {
            Some(ws) if !ws.connected => ws,
            _ => return true,
        };

        let candidates: Vec<&RoomTemplate> = catalog
            .lookup(source_socket.socket_type, None, self.config.sector, false)
            .into_iter()
            .filter(|t| t.category.is_growable())
            .collect();
        if candidates.is_empty() {
            return true;
        }

        for _ in 0..self.config.placement_attempts {
            let template = match RoomCatalog::weighted_pick(&candidates, &mut self.rng) {
                Some(t) => t,
                None => break,
            };
            let sockets = template.compatible_sockets(source_socket.socket_type);
            if sockets.is_empty() {
                continue;
            }
            let target_index = sockets[self.rng.index(sockets.len())];

            // Keep one credit for the exit
            if self.try_place(source, &source_socket, template, target_index, 1).is_some() {
                break;
            }
        }
        true
    }

    /// Spend the reserved credit on an exit room attached to any open socket
    pub(super) fn place_exit(&mut self) -> bool {
        let catalog = Arc::clone(&self.catalog);
        let mut open = self.open_sockets();
        self.rng.shuffle(&mut open);

        for source in open {
            let source_socket = match world_socket(&self.world, source) {
                Some(ws) if !ws.connected => ws,
                _ => continue,
            };

            let mut exits = catalog.lookup(
                source_socket.socket_type,
                Some(RoomCategory::ExitElevator),
                None,
                false,
            );
            self.rng.shuffle(&mut exits);

            for template in exits {
                for target_index in template.compatible_sockets(source_socket.socket_type) {
                    if self.try_place(source, &source_socket, template, target_index, 0).is_some() {
                        self.state.exit_placed = true;
                        log::debug!("Exit '{}' placed", template.id);
                        return true;
                    }
                }
            }
        }
        false
    }

    /// Cap every socket still open
    pub(super) fn seal_dead_ends(&mut self) {
        if !self.config.spawn_blockades {
            return;
        }
        for socket in self.open_sockets() {
            if let Some(blockade) = seal(&mut self.world, socket, true) {
                self.state.blockades.push(blockade);
            }
        }
    }

    /// Align `template` on `source`, run both collision phases and connect.
    /// Sockets of the new room that land on open sockets of placed rooms are
    /// linked too, and every link costs a credit; at least `reserve` credits
    /// must be left afterwards. A rejected candidate leaves nothing behind.
    fn try_place(
        &mut self,
        source: SocketRef,
        source_socket: &WorldSocket,
        template: &RoomTemplate,
        target_index: usize,
        reserve: u32,
    ) -> Option<Entity> {
        let spec = template.geometry.sockets.get(target_index)?;
        let transform = compute_alignment(source_socket, spec, &Transform::IDENTITY);
        let record = template.geometry.bounds.to_world(&transform);

        if self.registry.query_occupied(&record, Some(source.room)) {
            return None;
        }

        let name = self.instance_name(template);
        let room = spawn_room(&mut self.world, template, transform, name);
        let target = SocketRef::new(room, target_index);

        let aligned = world_socket(&self.world, target)
            .map(|ws| sockets_meet(source_socket, &ws, self.config.socket_snap_tolerance))
            .unwrap_or(false);
        let closures = match self.loop_closures(source, target) {
            Some(closures) if aligned => closures,
            _ => {
                destroy_room(&mut self.world, room);
                return None;
            }
        };

        let cost = 1 + closures.len() as u32;
        if self.state.credits_remaining < cost + reserve {
            destroy_room(&mut self.world, room);
            return None;
        }

        let spawn_connectors = self.config.spawn_connectors;
        if !connect(&mut self.world, source, target, spawn_connectors).is_connected() {
            destroy_room(&mut self.world, room);
            return None;
        }

        if self.registry.register(room, record).is_err() {
            destroy_room(&mut self.world, room);
            return None;
        }

        // Placed rooms initiate, as on replay
        let mut links = 1;
        for (placed, new_socket) in closures {
            if connect(&mut self.world, placed, SocketRef::new(room, new_socket), spawn_connectors).is_connected() {
                links += 1;
            }
        }
        if links > 1 {
            log::debug!("Room '{}' closed {} loop(s)", template.id, links - 1);
        }

        self.state.credits_remaining -= links;
        self.state.connections_made += links;
        debug_assert_eq!(
            self.state.connections_made + self.state.credits_remaining,
            self.state.budget
        );

        self.state.rooms.push(room);
        self.push_open_sockets(room);
        Some(room)
    }

    /// Pairs (placed socket, new socket index) that replay would relink by
    /// proximity besides `source`/`target`. `None` when the new room makes an
    /// ambiguous cluster: a socket near a connected socket, near more than
    /// one socket, or a third socket near the main link.
    fn loop_closures(&self, source: SocketRef, target: SocketRef) -> Option<Vec<(SocketRef, usize)>> {
        let new_sockets: Vec<(usize, WorldSocket)> = {
            let room = self.world.get::<&RoomInstance>(target.room).ok()?;
            room.sockets
                .iter()
                .enumerate()
                .map(|(i, s)| (i, WorldSocket::of(s, &room.transform)))
                .collect()
        };

        let max_distance = self.config.replay_link_distance;
        let mut closures: Vec<(SocketRef, usize)> = Vec::new();
        for &placed in &self.state.rooms {
            let room = match self.world.get::<&RoomInstance>(placed) {
                Ok(room) => room,
                Err(_) => continue,
            };
            for (index, socket) in room.sockets.iter().enumerate() {
                let this = SocketRef::new(placed, index);
                let ws = WorldSocket::of(socket, &room.transform);
                for &(new_index, new_ws) in &new_sockets {
                    if new_ws.socket_type != ws.socket_type || new_ws.point.distance(&ws.point) > max_distance {
                        continue;
                    }
                    if this == source && new_index == target.index {
                        continue;
                    }
                    if this == source || new_index == target.index || ws.connected {
                        return None;
                    }
                    if closures.iter().any(|&(p, n)| p == this || n == new_index) {
                        return None;
                    }
                    closures.push((this, new_index));
                }
            }
        }
        Some(closures)
    }

    fn push_open_sockets(&mut self, room: Entity) {
        let open: Vec<usize> = self
            .world
            .get::<&RoomInstance>(room)
            .map(|r| r.open_sockets().collect())
            .unwrap_or_default();
        self.state
            .frontier
            .extend(open.into_iter().map(|i| SocketRef::new(room, i)));
    }

    pub(super) fn instance_name(&self, template: &RoomTemplate) -> String {
        format!("{}_{:02}", template.id, self.state.rooms.len())
    }
}
