//! Connection resolver - socket alignment, narrow-phase acceptance and
//! connect/disconnect bookkeeping.
//!
//! Sockets are addressed by `SocketRef` and resolved through the world on
//! every call, so a despawned room simply makes the operation a no-op.

use hecs::{Entity, World};

use crate::geometry::{Quat, Transform};
use crate::instance::{Blockade, Connector, RoomInstance};
use crate::socket::{is_compatible, Socket, SocketRef, SocketSpec, WorldSocket};

/// Joined sockets must face each other at least this squarely
/// (dot of the two forwards).
const FACING_DOT_LIMIT: f32 = -0.99;

/// Result of a connection request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Rejected,
    Connected { connector: Option<Entity> },
}

impl ConnectOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectOutcome::Connected { .. })
    }
}

/// Resolve a socket to its world-space view
pub fn world_socket(world: &World, socket: SocketRef) -> Option<WorldSocket> {
    let room = world.get::<&RoomInstance>(socket.room).ok()?;
    let s = room.socket(socket.index)?;
    Some(WorldSocket::of(s, &room.transform))
}

/// Transform for the target room so that `target` sits on `source`, facing it.
///
/// The rotation is settled first and the position is derived from it:
/// `rotation = from_to(target_forward, -source_forward) * owner_rotation`,
/// `position = source_point - rotation * target_offset`.
pub fn compute_alignment(source: &WorldSocket, target: &SocketSpec, owner: &Transform) -> Transform {
    let target_forward = owner.rotation * target.local_forward();
    let correction = Quat::rotation_from_to(target_forward, -source.forward);
    let rotation = (correction * owner.rotation).normalize();
    let position = source.point - rotation * target.offset;
    Transform::new(position, rotation)
}

/// Narrow-phase check: same type, coincident points and opposed forwards
pub fn sockets_meet(a: &WorldSocket, b: &WorldSocket, tolerance: f32) -> bool {
    is_compatible(a.socket_type, b.socket_type)
        && a.point.distance(&b.point) <= tolerance
        && a.forward.dot(&b.forward) <= FACING_DOT_LIMIT
}

fn with_socket_mut<R>(world: &World, socket: SocketRef, f: impl FnOnce(&mut Socket) -> R) -> Option<R> {
    let mut room = world.get::<&mut RoomInstance>(socket.room).ok()?;
    let s = room.socket_mut(socket.index)?;
    Some(f(s))
}

/// Connect `source` to `target`.
///
/// Rejected when either socket is already connected, the types differ, or a
/// socket does not resolve. On success both sides are flagged and linked,
/// and the source socket optionally spawns its connector at its door point.
pub fn connect(world: &mut World, source: SocketRef, target: SocketRef, spawn_connector: bool) -> ConnectOutcome {
    if source == target {
        return ConnectOutcome::Rejected;
    }

    let (source_type, connector_template, door) = {
        let room = match world.get::<&RoomInstance>(source.room) {
            Ok(room) => room,
            Err(_) => return ConnectOutcome::Rejected,
        };
        let socket = match room.socket(source.index) {
            Some(s) if s.is_open() => s,
            _ => return ConnectOutcome::Rejected,
        };
        let door = Transform::new(socket.world_door_point(&room.transform), room.transform.rotation);
        (socket.socket_type(), socket.spec.connector.clone(), door)
    };

    let target_type = match world_socket(world, target) {
        Some(ws) if !ws.connected => ws.socket_type,
        _ => return ConnectOutcome::Rejected,
    };

    if !is_compatible(source_type, target_type) {
        return ConnectOutcome::Rejected;
    }

    with_socket_mut(world, source, |s| {
        s.connected = true;
        s.peer = Some(target);
    });
    with_socket_mut(world, target, |s| {
        s.connected = true;
        s.peer = Some(source);
    });

    let connector = match (spawn_connector, connector_template) {
        (true, Some(template)) => {
            let entity = world.spawn((Connector {
                template,
                owner: source,
                transform: door,
            },));
            with_socket_mut(world, source, |s| s.connector = Some(entity));
            Some(entity)
        }
        _ => None,
    };

    ConnectOutcome::Connected { connector }
}

/// Clear a socket if it is open or linked to `other`, returning the
/// entities it owned.
fn release(world: &World, socket: SocketRef, other: Option<SocketRef>) -> Vec<Entity> {
    with_socket_mut(world, socket, |s| {
        if s.peer.is_some() && s.peer != other {
            return Vec::new();
        }
        s.connected = false;
        s.peer = None;
        s.connector.take().into_iter().chain(s.blockade.take()).collect()
    })
    .unwrap_or_default()
}

/// Break the link between two sockets and destroy any connector or blockade
/// either side owns. Idempotent.
pub fn disconnect(world: &mut World, a: SocketRef, b: SocketRef) {
    let mut owned = release(world, a, Some(b));
    owned.extend(release(world, b, Some(a)));
    for entity in owned {
        let _ = world.despawn(entity);
    }
}

/// Disconnect a socket from whatever it is linked to (or just drop its
/// blockade when open)
pub fn disconnect_socket(world: &mut World, socket: SocketRef) {
    let peer = world
        .get::<&RoomInstance>(socket.room)
        .ok()
        .and_then(|room| room.socket(socket.index).and_then(|s| s.peer));
    match peer {
        Some(peer) => disconnect(world, socket, peer),
        None => {
            for entity in release(world, socket, None) {
                let _ = world.despawn(entity);
            }
        }
    }
}

/// Cap an unconnected socket with its first blockade template.
///
/// No-op when disabled, when the socket is connected or already sealed, or
/// when it has no blockade templates.
pub fn seal(world: &mut World, socket: SocketRef, enabled: bool) -> Option<Entity> {
    if !enabled {
        return None;
    }
    let (template, transform) = {
        let room = world.get::<&RoomInstance>(socket.room).ok()?;
        let s = room.socket(socket.index)?;
        if s.connected || s.blockade.is_some() {
            return None;
        }
        let template = s.spec.blockades.first()?.clone();
        let transform = Transform::new(s.world_door_point(&room.transform), room.transform.rotation);
        (template, transform)
    };

    let blockade = world.spawn((Blockade {
        template,
        owner: socket,
        transform,
    },));
    with_socket_mut(world, socket, |s| s.blockade = Some(blockade));
    Some(blockade)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RoomCategory, RoomGeometry, RoomTemplate};
    use crate::geometry::{LocalBounds, LocalBox, Vec3};
    use crate::instance::spawn_room;
    use crate::socket::SocketType;

    fn corridor() -> RoomTemplate {
        RoomTemplate::new(
            "corridor",
            "Corridor",
            RoomCategory::Corridor,
            RoomGeometry {
                name: "corridor".into(),
                bounds: LocalBounds::Single(LocalBox::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(4.0, 4.0, 8.0))),
                sockets: vec![
                    SocketSpec::new(SocketType::Standard, Vec3::new(0.0, 0.0, 4.0), Vec3::FORWARD)
                        .with_connector("door")
                        .with_blockade("plate"),
                    SocketSpec::new(SocketType::Standard, Vec3::new(0.0, 0.0, -4.0), -Vec3::FORWARD)
                        .with_blockade("plate"),
                    SocketSpec::new(SocketType::Large, Vec3::new(2.0, 0.0, 0.0), Vec3::RIGHT),
                ],
            },
        )
    }

    #[test]
    fn test_alignment_places_room_face_to_face() {
        let mut world = World::new();
        let template = corridor();
        let a = spawn_room(&mut world, &template, Transform::IDENTITY, "a");
        let source = world_socket(&world, SocketRef::new(a, 0)).unwrap();

        // Join the new room's front socket (+Z) to the source's front socket
        let aligned = compute_alignment(&source, &template.geometry.sockets[0], &Transform::IDENTITY);
        let b = spawn_room(&mut world, &template, aligned, "b");
        let target = world_socket(&world, SocketRef::new(b, 0)).unwrap();

        assert!(target.point.approx_eq(&source.point, 1e-4));
        assert!(sockets_meet(&source, &target, 0.05));
        // Half turn about up keeps the room level
        assert!(aligned.position.approx_eq(&Vec3::new(0.0, 0.0, 8.0), 1e-4));
        assert!(aligned.transform_direction(Vec3::UP).approx_eq(&Vec3::UP, 1e-4));
    }

    #[test]
    fn test_alignment_from_rotated_source() {
        let mut world = World::new();
        let template = corridor();
        let a = spawn_room(
            &mut world,
            &template,
            Transform::new(Vec3::new(3.0, 0.0, -2.0), Quat::from_yaw_degrees(90.0)),
            "a",
        );
        let source = world_socket(&world, SocketRef::new(a, 0)).unwrap();
        let aligned = compute_alignment(&source, &template.geometry.sockets[1], &Transform::IDENTITY);
        let b = spawn_room(&mut world, &template, aligned, "b");
        let target = world_socket(&world, SocketRef::new(b, 1)).unwrap();
        assert!(sockets_meet(&source, &target, 0.05));
    }

    #[test]
    fn test_sockets_meet_rejects_misaligned() {
        let a = WorldSocket {
            socket_type: SocketType::Standard,
            point: Vec3::ZERO,
            forward: Vec3::FORWARD,
            connected: false,
        };
        let far = WorldSocket {
            point: Vec3::new(0.2, 0.0, 0.0),
            forward: -Vec3::FORWARD,
            ..a
        };
        let same_way = WorldSocket { forward: Vec3::FORWARD, ..a };
        let other_type = WorldSocket {
            socket_type: SocketType::Large,
            forward: -Vec3::FORWARD,
            ..a
        };
        assert!(!sockets_meet(&a, &far, 0.05));
        assert!(!sockets_meet(&a, &same_way, 0.05));
        assert!(!sockets_meet(&a, &other_type, 0.05));
    }

    #[test]
    fn test_connect_links_both_sides_and_spawns_door() {
        let mut world = World::new();
        let template = corridor();
        let a = spawn_room(&mut world, &template, Transform::IDENTITY, "a");
        let b = spawn_room(&mut world, &template, Transform::from_position(Vec3::new(0.0, 0.0, 8.0)), "b");
        let sa = SocketRef::new(a, 0);
        let sb = SocketRef::new(b, 1);

        let outcome = connect(&mut world, sa, sb, true);
        let connector = match outcome {
            ConnectOutcome::Connected { connector } => connector.unwrap(),
            ConnectOutcome::Rejected => panic!("connection rejected"),
        };
        {
            let door = world.get::<&Connector>(connector).unwrap();
            assert_eq!(door.template, "door");
            assert_eq!(door.owner, sa);
            assert!(door.transform.position.approx_eq(&Vec3::new(0.0, 0.0, 4.0), 1e-4));
        }
        {
            let ra = world.get::<&RoomInstance>(a).unwrap();
            let rb = world.get::<&RoomInstance>(b).unwrap();
            assert_eq!(ra.sockets[0].peer, Some(sb));
            assert_eq!(rb.sockets[1].peer, Some(sa));
            assert!(ra.sockets[0].connected && rb.sockets[1].connected);
            assert!(rb.sockets[1].connector.is_none());
        }

        // Second connection on the same socket is rejected
        assert_eq!(connect(&mut world, sa, SocketRef::new(b, 0), true), ConnectOutcome::Rejected);
    }

    #[test]
    fn test_connect_rejects_type_mismatch() {
        let mut world = World::new();
        let template = corridor();
        let a = spawn_room(&mut world, &template, Transform::IDENTITY, "a");
        let b = spawn_room(&mut world, &template, Transform::IDENTITY, "b");
        let outcome = connect(&mut world, SocketRef::new(a, 0), SocketRef::new(b, 2), true);
        assert_eq!(outcome, ConnectOutcome::Rejected);
        let ra = world.get::<&RoomInstance>(a).unwrap();
        assert!(ra.sockets[0].is_open());
    }

    #[test]
    fn test_disconnect_restores_both_sides() {
        let mut world = World::new();
        let template = corridor();
        let a = spawn_room(&mut world, &template, Transform::IDENTITY, "a");
        let b = spawn_room(&mut world, &template, Transform::IDENTITY, "b");
        let sa = SocketRef::new(a, 0);
        let sb = SocketRef::new(b, 1);
        let connector = match connect(&mut world, sa, sb, true) {
            ConnectOutcome::Connected { connector } => connector.unwrap(),
            ConnectOutcome::Rejected => panic!("connection rejected"),
        };

        disconnect(&mut world, sa, sb);
        assert!(!world.contains(connector));
        {
            let ra = world.get::<&RoomInstance>(a).unwrap();
            let rb = world.get::<&RoomInstance>(b).unwrap();
            assert!(ra.sockets[0].is_open() && ra.sockets[0].peer.is_none());
            assert!(rb.sockets[1].is_open() && rb.sockets[1].peer.is_none());
        }

        // Idempotent
        disconnect(&mut world, sa, sb);
        assert_eq!(world.len(), 2);
    }

    #[test]
    fn test_disconnect_socket_via_destroyed_peer() {
        let mut world = World::new();
        let template = corridor();
        let a = spawn_room(&mut world, &template, Transform::IDENTITY, "a");
        let b = spawn_room(&mut world, &template, Transform::IDENTITY, "b");
        connect(&mut world, SocketRef::new(a, 0), SocketRef::new(b, 1), true);

        crate::instance::destroy_room(&mut world, b);
        let ra = world.get::<&RoomInstance>(a).unwrap();
        assert!(ra.sockets[0].is_open());
        assert!(ra.sockets[0].connector.is_none());
    }

    #[test]
    fn test_seal_open_socket() {
        let mut world = World::new();
        let a = spawn_room(&mut world, &corridor(), Transform::IDENTITY, "a");

        assert!(seal(&mut world, SocketRef::new(a, 0), false).is_none());
        let plate = seal(&mut world, SocketRef::new(a, 0), true).unwrap();
        assert_eq!(world.get::<&Blockade>(plate).unwrap().template, "plate");
        // Already sealed
        assert!(seal(&mut world, SocketRef::new(a, 0), true).is_none());
        // No blockade templates on the Large socket
        assert!(seal(&mut world, SocketRef::new(a, 2), true).is_none());

        disconnect_socket(&mut world, SocketRef::new(a, 0));
        assert!(!world.contains(plate));
    }
}
