//! Instance components - placed rooms, connectors and blockades.
//!
//! The generator's `hecs::World` is the instantiation service. A placed room
//! is one entity with a `RoomInstance`; connectors (doors) and blockades are
//! inert entities carrying the template they came from and a transform.

use hecs::{Entity, World};

use crate::catalog::{RoomCategory, RoomTemplate};
use crate::geometry::{SpatialRecord, Transform};
use crate::resolver;
use crate::socket::{Socket, SocketRef};

/// A room placed on the floor
#[derive(Debug, Clone)]
pub struct RoomInstance {
    /// Stable id of the template this room was built from
    pub template_id: String,
    /// Instance name, recorded in cached layouts
    pub name: String,
    pub category: RoomCategory,
    pub transform: Transform,
    pub sockets: Vec<Socket>,
    /// World footprint at `transform`
    pub bounds: SpatialRecord,
}

impl RoomInstance {
    pub fn socket(&self, index: usize) -> Option<&Socket> {
        self.sockets.get(index)
    }

    pub fn socket_mut(&mut self, index: usize) -> Option<&mut Socket> {
        self.sockets.get_mut(index)
    }

    /// Indices of sockets not yet connected
    pub fn open_sockets(&self) -> impl Iterator<Item = usize> + '_ {
        self.sockets
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_open())
            .map(|(i, _)| i)
    }

    pub fn is_exit(&self) -> bool {
        self.category == RoomCategory::ExitElevator
    }
}

/// Door spawned between two connected sockets
#[derive(Debug, Clone)]
pub struct Connector {
    pub template: String,
    /// Initiating socket that owns this connector
    pub owner: SocketRef,
    pub transform: Transform,
}

/// Cap sealing an unconnected socket
#[derive(Debug, Clone)]
pub struct Blockade {
    pub template: String,
    pub owner: SocketRef,
    pub transform: Transform,
}

/// Spawn a room from `template` at `transform` with all sockets open
pub fn spawn_room(
    world: &mut World,
    template: &RoomTemplate,
    transform: Transform,
    name: impl Into<String>,
) -> Entity {
    let instance = RoomInstance {
        template_id: template.id.clone(),
        name: name.into(),
        category: template.category,
        transform,
        sockets: template
            .geometry
            .sockets
            .iter()
            .cloned()
            .map(Socket::new)
            .collect(),
        bounds: template.geometry.bounds.to_world(&transform),
    };
    world.spawn((instance,))
}

/// Destroy a room: disconnect every socket (removing connectors and
/// blockades on both sides) and despawn the entity. No-op for a stale handle.
pub fn destroy_room(world: &mut World, room: Entity) {
    let socket_count = match world.get::<&RoomInstance>(room) {
        Ok(instance) => instance.sockets.len(),
        Err(_) => return,
    };
    for index in 0..socket_count {
        resolver::disconnect_socket(world, SocketRef::new(room, index));
    }
    let _ = world.despawn(room);
}
