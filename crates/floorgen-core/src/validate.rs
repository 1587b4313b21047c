//! Layout validation - pure checks over a generated floor.
//!
//! Each check returns the problems it found; an empty list means the floor
//! satisfies that property. Used by the integration tests and the simtest
//! harness, never by the generator itself.

use hecs::{Entity, World};
use std::collections::{HashMap, HashSet, VecDeque};

use crate::instance::RoomInstance;
use crate::socket::SocketRef;

/// A layout validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub category: &'static str,
    pub severity: Severity,
    pub message: String,
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

fn collect_rooms(world: &World) -> Vec<(Entity, RoomInstance)> {
    let mut rooms: Vec<(Entity, RoomInstance)> = world
        .query::<&RoomInstance>()
        .iter()
        .map(|(e, r)| (e, r.clone()))
        .collect();
    rooms.sort_by_key(|(e, _)| *e);
    rooms
}

fn directly_connected(a: &RoomInstance, b: Entity) -> bool {
    a.sockets.iter().any(|s| s.peer.map(|p| p.room) == Some(b))
}

// ── A. Geometry ─────────────────────────────────────────────────────────

/// Check that every compound footprint encloses its parts.
pub fn check_spatial_records(world: &World) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    for (_, room) in collect_rooms(world) {
        if !room.bounds.is_consistent() {
            errors.push(ValidationError {
                category: "geometry",
                severity: Severity::Error,
                message: format!("Room '{}' has sub-boxes outside its encapsulating box", room.name),
            });
        }
    }
    errors
}

/// Check that unconnected rooms never overlap, and that connected rooms
/// overlap by at most `max_overlap_fraction` of the smaller footprint.
pub fn check_room_overlaps(world: &World, max_overlap_fraction: f32) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms = collect_rooms(world);

    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            let (ea, a) = &rooms[i];
            let (eb, b) = &rooms[j];

            if directly_connected(a, *eb) || directly_connected(b, *ea) {
                let overlap = a.bounds.xz_overlap_area(&b.bounds);
                let smaller = a.bounds.footprint_area().min(b.bounds.footprint_area());
                if overlap > max_overlap_fraction * smaller + 1e-4 {
                    errors.push(ValidationError {
                        category: "overlap",
                        severity: Severity::Error,
                        message: format!(
                            "Connected rooms '{}' and '{}' overlap {:.2} m² (limit {:.2} m²)",
                            a.name,
                            b.name,
                            overlap,
                            max_overlap_fraction * smaller
                        ),
                    });
                }
            } else if a.bounds.intersects(&b.bounds) {
                errors.push(ValidationError {
                    category: "overlap",
                    severity: Severity::Error,
                    message: format!("Rooms '{}' and '{}' overlap", a.name, b.name),
                });
            }
        }
    }
    errors
}

// ── B. Sockets ──────────────────────────────────────────────────────────

/// Check that every connection is mirrored on both sides with matching types.
pub fn check_socket_symmetry(world: &World) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms = collect_rooms(world);
    let by_entity: HashMap<Entity, &RoomInstance> = rooms.iter().map(|(e, r)| (*e, r)).collect();

    for (entity, room) in &rooms {
        for (index, socket) in room.sockets.iter().enumerate() {
            let here = SocketRef::new(*entity, index);
            match (socket.connected, socket.peer) {
                (false, None) => {}
                (false, Some(_)) | (true, None) => errors.push(ValidationError {
                    category: "sockets",
                    severity: Severity::Error,
                    message: format!(
                        "Room '{}' socket {} has inconsistent connected flag and peer",
                        room.name, index
                    ),
                }),
                (true, Some(peer)) => {
                    let mirrored = by_entity
                        .get(&peer.room)
                        .and_then(|r| r.sockets.get(peer.index))
                        .map(|p| p.connected && p.peer == Some(here) && p.socket_type() == socket.socket_type())
                        .unwrap_or(false);
                    if !mirrored {
                        errors.push(ValidationError {
                            category: "sockets",
                            severity: Severity::Error,
                            message: format!(
                                "Room '{}' socket {} is not mirrored by its peer",
                                room.name, index
                            ),
                        });
                    }
                }
            }
        }
    }
    errors
}

// ── C. Reachability ─────────────────────────────────────────────────────

/// Check that the floor has exactly one exit room and that it is reachable
/// from `start` through connected sockets.
pub fn check_exit_reachable(world: &World, start: Entity) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let rooms = collect_rooms(world);

    let exits: Vec<Entity> = rooms.iter().filter(|(_, r)| r.is_exit()).map(|(e, _)| *e).collect();
    if exits.len() != 1 {
        errors.push(ValidationError {
            category: "exit",
            severity: Severity::Error,
            message: format!("Expected exactly one exit room, found {}", exits.len()),
        });
        return errors;
    }

    let mut adj: HashMap<Entity, Vec<Entity>> = HashMap::new();
    for (entity, room) in &rooms {
        for peer in room.sockets.iter().filter_map(|s| s.peer) {
            adj.entry(*entity).or_default().push(peer.room);
        }
    }

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(current) = queue.pop_front() {
        if let Some(neighbors) = adj.get(&current) {
            for &next in neighbors {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }
    }

    if !visited.contains(&exits[0]) {
        errors.push(ValidationError {
            category: "exit",
            severity: Severity::Error,
            message: "Exit room is not reachable from the start room".to_string(),
        });
    }

    let unreached = rooms.iter().filter(|(e, _)| !visited.contains(e)).count();
    if unreached > 0 {
        errors.push(ValidationError {
            category: "connectivity",
            severity: Severity::Warning,
            message: format!("{} of {} rooms unreachable from the start room", unreached, rooms.len()),
        });
    }
    errors
}

/// Run all validation checks on a generated floor.
pub fn validate_layout(world: &World, start: Entity, max_overlap_fraction: f32) -> Vec<ValidationError> {
    let mut all = Vec::new();
    all.extend(check_spatial_records(world));
    all.extend(check_room_overlaps(world, max_overlap_fraction));
    all.extend(check_socket_symmetry(world));
    all.extend(check_exit_reachable(world, start));
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{RoomCategory, RoomGeometry, RoomTemplate};
    use crate::geometry::{LocalBounds, LocalBox, Transform, Vec3};
    use crate::instance::spawn_room;
    use crate::resolver::connect;
    use crate::socket::{SocketSpec, SocketType};

    fn room(id: &str, category: RoomCategory) -> RoomTemplate {
        RoomTemplate::new(
            id,
            id,
            category,
            RoomGeometry {
                name: id.into(),
                bounds: LocalBounds::Single(LocalBox::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(4.0, 4.0, 4.0))),
                sockets: vec![
                    SocketSpec::new(SocketType::Standard, Vec3::new(0.0, 0.0, 2.0), Vec3::FORWARD),
                    SocketSpec::new(SocketType::Standard, Vec3::new(0.0, 0.0, -2.0), -Vec3::FORWARD),
                ],
            },
        )
    }

    fn at(z: f32) -> Transform {
        Transform::from_position(Vec3::new(0.0, 0.0, z))
    }

    #[test]
    fn test_valid_chain() {
        let mut world = World::new();
        let start = spawn_room(&mut world, &room("start", RoomCategory::EntryElevator), at(0.0), "start");
        let exit = spawn_room(&mut world, &room("exit", RoomCategory::ExitElevator), at(4.0), "exit");
        connect(&mut world, SocketRef::new(start, 0), SocketRef::new(exit, 1), false);

        let errors = validate_layout(&world, start, 0.15);
        assert!(errors.is_empty(), "{:?}", errors);
    }

    #[test]
    fn test_unconnected_overlap_detected() {
        let mut world = World::new();
        spawn_room(&mut world, &room("a", RoomCategory::Corridor), at(0.0), "a");
        spawn_room(&mut world, &room("b", RoomCategory::Corridor), at(2.0), "b");
        let errors = check_room_overlaps(&world, 0.15);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].category, "overlap");
    }

    #[test]
    fn test_unreachable_exit_detected() {
        let mut world = World::new();
        let start = spawn_room(&mut world, &room("start", RoomCategory::EntryElevator), at(0.0), "start");
        spawn_room(&mut world, &room("exit", RoomCategory::ExitElevator), at(20.0), "exit");
        let errors = check_exit_reachable(&world, start);
        assert!(errors.iter().any(|e| e.category == "exit" && e.severity == Severity::Error));
    }

    #[test]
    fn test_missing_exit_detected() {
        let mut world = World::new();
        let start = spawn_room(&mut world, &room("start", RoomCategory::EntryElevator), at(0.0), "start");
        let errors = check_exit_reachable(&world, start);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_one_sided_link_detected() {
        let mut world = World::new();
        let a = spawn_room(&mut world, &room("a", RoomCategory::Corridor), at(0.0), "a");
        let b = spawn_room(&mut world, &room("b", RoomCategory::Corridor), at(4.0), "b");
        {
            let mut ra = world.get::<&mut RoomInstance>(a).unwrap();
            ra.sockets[0].connected = true;
            ra.sockets[0].peer = Some(SocketRef::new(b, 1));
        }
        let errors = check_socket_symmetry(&world);
        assert_eq!(errors.len(), 1);
    }
}
