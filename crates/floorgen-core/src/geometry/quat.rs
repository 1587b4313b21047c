//! Quaternion rotations and rigid transforms

use super::Vec3;
use serde::{Deserialize, Serialize};
use std::ops::Mul;

/// A unit quaternion representing a 3D rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Quat {
    /// Identity quaternion (no rotation)
    pub const IDENTITY: Self = Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };

    pub fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Create a quaternion from axis-angle representation
    pub fn from_axis_angle(axis: Vec3, angle_radians: f32) -> Self {
        let half_angle = angle_radians / 2.0;
        let sin_half = half_angle.sin();
        let cos_half = half_angle.cos();
        let normalized = axis.normalize();

        Self {
            x: normalized.x * sin_half,
            y: normalized.y * sin_half,
            z: normalized.z * sin_half,
            w: cos_half,
        }
    }

    /// Rotation about the up axis, in degrees
    pub fn from_yaw_degrees(degrees: f32) -> Self {
        Self::from_axis_angle(Vec3::UP, degrees.to_radians())
    }

    /// Shortest-arc rotation taking direction `from` onto direction `to`.
    ///
    /// Opposite directions rotate half a turn about the up axis when `from`
    /// is horizontal, so rooms joined by wall sockets stay level.
    pub fn rotation_from_to(from: Vec3, to: Vec3) -> Self {
        let from = from.normalize();
        let to = to.normalize();
        let dot = from.dot(&to);

        if dot >= 1.0 - 1e-6 {
            return Self::IDENTITY;
        }
        if dot <= -1.0 + 1e-6 {
            let mut axis = Vec3::UP - from * from.dot(&Vec3::UP);
            if axis.length() < 1e-6 {
                // `from` is vertical; any horizontal axis works
                axis = Vec3::RIGHT - from * from.dot(&Vec3::RIGHT);
            }
            return Self::from_axis_angle(axis, std::f32::consts::PI);
        }

        let axis = from.cross(&to);
        Self::new(axis.x, axis.y, axis.z, 1.0 + dot).normalize()
    }

    pub fn magnitude(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalize(&self) -> Self {
        let mag = self.magnitude();
        if mag > 0.0 {
            Self {
                x: self.x / mag,
                y: self.y / mag,
                z: self.z / mag,
                w: self.w / mag,
            }
        } else {
            Self::IDENTITY
        }
    }

    pub fn conjugate(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
            w: self.w,
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate_vector(&self, v: Vec3) -> Vec3 {
        let q_vec = Vec3::new(self.x, self.y, self.z);
        let uv = q_vec.cross(&v);
        let uuv = q_vec.cross(&uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// True when both quaternions describe the same rotation within `tolerance`
    pub fn approx_eq(&self, other: &Quat, tolerance: f32) -> bool {
        let dot = self.x * other.x + self.y * other.y + self.z * other.z + self.w * other.w;
        (1.0 - dot.abs()) <= tolerance
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Quat {
    type Output = Quat;

    fn mul(self, rhs: Self) -> Self::Output {
        Quat::new(
            self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
            self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
        )
    }
}

impl Mul<Vec3> for Quat {
    type Output = Vec3;

    fn mul(self, rhs: Vec3) -> Vec3 {
        self.rotate_vector(rhs)
    }
}

/// World placement of a room, connector or blockade
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self::new(position, Quat::IDENTITY)
    }

    /// Local point to world space
    pub fn transform_point(&self, local: Vec3) -> Vec3 {
        self.position + self.rotation * local
    }

    /// Local direction to world space (no translation)
    pub fn transform_direction(&self, local: Vec3) -> Vec3 {
        self.rotation * local
    }
}
