//! Sockets - typed, oriented doorway attachment points on rooms.

use hecs::Entity;
use serde::{Deserialize, Serialize};

use crate::geometry::{Quat, Transform, Vec3};

/// Doorway type. Sockets only join sockets of the same type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SocketType {
    Standard,
    Large,
    Airlock,
    Emergency,
    Maintenance,
}

/// Exact tag match; there is no subtyping between socket types.
pub fn is_compatible(a: SocketType, b: SocketType) -> bool {
    a == b
}

/// Socket definition as authored on a room template's geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketSpec {
    #[serde(default)]
    pub name: String,
    pub socket_type: SocketType,
    /// Connection point in the room's local frame
    pub offset: Vec3,
    /// Outward direction of the doorway in the local frame
    pub forward: Vec3,
    /// Fixed yaw correction applied to `forward`, in degrees
    #[serde(default)]
    pub angle_correction: f32,
    /// Where a door is spawned; defaults to `offset`
    #[serde(default)]
    pub door_spawn: Option<Vec3>,
    /// Connector (door) template spawned when this socket initiates a connection
    #[serde(default)]
    pub connector: Option<String>,
    /// Blockade templates used to seal this socket when it stays open
    #[serde(default)]
    pub blockades: Vec<String>,
}

impl SocketSpec {
    pub fn new(socket_type: SocketType, offset: Vec3, forward: Vec3) -> Self {
        Self {
            name: String::new(),
            socket_type,
            offset,
            forward,
            angle_correction: 0.0,
            door_spawn: None,
            connector: None,
            blockades: Vec::new(),
        }
    }

    pub fn with_connector(mut self, template: impl Into<String>) -> Self {
        self.connector = Some(template.into());
        self
    }

    pub fn with_blockade(mut self, template: impl Into<String>) -> Self {
        self.blockades.push(template.into());
        self
    }

    pub fn with_angle_correction(mut self, degrees: f32) -> Self {
        self.angle_correction = degrees;
        self
    }

    /// Forward direction in the local frame after the angular correction
    pub fn local_forward(&self) -> Vec3 {
        let forward = self.forward.normalize();
        if self.angle_correction == 0.0 {
            forward
        } else {
            Quat::from_yaw_degrees(self.angle_correction) * forward
        }
    }

    /// Local point where a connector or blockade is spawned
    pub fn local_door_point(&self) -> Vec3 {
        self.door_spawn.unwrap_or(self.offset)
    }
}

/// Weak handle to a socket on a placed room. The room may have been
/// despawned; resolve it through the world before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SocketRef {
    pub room: Entity,
    pub index: usize,
}

impl SocketRef {
    pub fn new(room: Entity, index: usize) -> Self {
        Self { room, index }
    }
}

/// Live socket state on a room instance
#[derive(Debug, Clone)]
pub struct Socket {
    pub spec: SocketSpec,
    pub connected: bool,
    pub peer: Option<SocketRef>,
    /// Connector spawned by this socket (only the initiating side owns one)
    pub connector: Option<Entity>,
    pub blockade: Option<Entity>,
}

impl Socket {
    pub fn new(spec: SocketSpec) -> Self {
        Self {
            spec,
            connected: false,
            peer: None,
            connector: None,
            blockade: None,
        }
    }

    pub fn socket_type(&self) -> SocketType {
        self.spec.socket_type
    }

    pub fn is_open(&self) -> bool {
        !self.connected
    }

    pub fn world_point(&self, owner: &Transform) -> Vec3 {
        owner.transform_point(self.spec.offset)
    }

    pub fn world_forward(&self, owner: &Transform) -> Vec3 {
        owner.transform_direction(self.spec.local_forward())
    }

    pub fn world_door_point(&self, owner: &Transform) -> Vec3 {
        owner.transform_point(self.spec.local_door_point())
    }
}

/// World-space view of a socket, detached from the world borrow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldSocket {
    pub socket_type: SocketType,
    pub point: Vec3,
    pub forward: Vec3,
    pub connected: bool,
}

impl WorldSocket {
    pub fn of(socket: &Socket, owner: &Transform) -> Self {
        Self {
            socket_type: socket.socket_type(),
            point: socket.world_point(owner),
            forward: socket.world_forward(owner),
            connected: socket.connected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compatibility_is_exact() {
        assert!(is_compatible(SocketType::Standard, SocketType::Standard));
        assert!(!is_compatible(SocketType::Standard, SocketType::Large));
        assert!(!is_compatible(SocketType::Maintenance, SocketType::Emergency));
    }

    #[test]
    fn test_angle_correction_rotates_forward() {
        let spec = SocketSpec::new(SocketType::Standard, Vec3::ZERO, Vec3::FORWARD)
            .with_angle_correction(90.0);
        assert!(spec.local_forward().approx_eq(&Vec3::RIGHT, 1e-4));
    }

    #[test]
    fn test_world_point_uses_offset_not_origin() {
        let spec = SocketSpec::new(SocketType::Standard, Vec3::new(0.0, 0.0, 4.0), Vec3::FORWARD);
        let socket = Socket::new(spec);
        let owner = Transform::new(Vec3::new(1.0, 0.0, 1.0), Quat::from_yaw_degrees(90.0));
        assert!(socket.world_point(&owner).approx_eq(&Vec3::new(5.0, 0.0, 1.0), 1e-4));
        assert!(socket.world_forward(&owner).approx_eq(&Vec3::RIGHT, 1e-4));
    }

    #[test]
    fn test_door_point_falls_back_to_offset() {
        let mut spec = SocketSpec::new(SocketType::Large, Vec3::new(1.0, 0.0, 0.0), Vec3::RIGHT);
        assert_eq!(spec.local_door_point(), Vec3::new(1.0, 0.0, 0.0));
        spec.door_spawn = Some(Vec3::new(1.0, 1.5, 0.0));
        assert_eq!(spec.local_door_point(), Vec3::new(1.0, 1.5, 0.0));
    }
}
