//! Bounding volumes: axis-aligned boxes, local room boxes, and the
//! world-space spatial record used by the occupancy registry.
//!
//! Rooms describe their footprint as one box or several sub-boxes in their
//! own frame. Placing a room rotates those boxes into world axes and wraps
//! each in an AABB; the union of the sub-box AABBs is the encapsulating box.

use super::{Transform, Vec3};
use serde::{Deserialize, Serialize};

/// Faces closer than this are touching, not overlapping.
pub const CONTACT_EPSILON: f32 = 1e-3;

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Strict overlap test. Boxes sharing a face do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x - CONTACT_EPSILON
            && self.max.x > other.min.x + CONTACT_EPSILON
            && self.min.y < other.max.y - CONTACT_EPSILON
            && self.max.y > other.min.y + CONTACT_EPSILON
            && self.min.z < other.max.z - CONTACT_EPSILON
            && self.max.z > other.min.z + CONTACT_EPSILON
    }

    /// Whether `other` lies inside this box (within contact tolerance)
    pub fn contains_box(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x - CONTACT_EPSILON
            && other.min.y >= self.min.y - CONTACT_EPSILON
            && other.min.z >= self.min.z - CONTACT_EPSILON
            && other.max.x <= self.max.x + CONTACT_EPSILON
            && other.max.y <= self.max.y + CONTACT_EPSILON
            && other.max.z <= self.max.z + CONTACT_EPSILON
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(&other.min),
            max: self.max.max(&other.max),
        }
    }

    /// Footprint area on the floor plane
    pub fn xz_area(&self) -> f32 {
        let size = self.size();
        size.x.max(0.0) * size.z.max(0.0)
    }

    /// Area of the XZ rectangle shared with `other` (0 when disjoint)
    pub fn xz_overlap_area(&self, other: &Aabb) -> f32 {
        let dx = self.max.x.min(other.max.x) - self.min.x.max(other.min.x);
        let dz = self.max.z.min(other.max.z) - self.min.z.max(other.min.z);
        if dx <= 0.0 || dz <= 0.0 {
            0.0
        } else {
            dx * dz
        }
    }
}

/// Box in a room's local frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBox {
    pub center: Vec3,
    pub size: Vec3,
}

impl LocalBox {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self { center, size }
    }
}

/// Compute the world AABB enclosing a local box placed with `transform`.
///
/// Each world half-extent is the sum of the local half-extents weighted by
/// the absolute rotation matrix row for that axis.
pub fn aabb_from_rotated_box(local: &LocalBox, transform: &Transform) -> Aabb {
    let center = transform.transform_point(local.center);
    let half = local.size * 0.5;

    let axis_x = transform.transform_direction(Vec3::RIGHT).abs();
    let axis_y = transform.transform_direction(Vec3::UP).abs();
    let axis_z = transform.transform_direction(Vec3::FORWARD).abs();

    let extent = axis_x * half.x + axis_y * half.y + axis_z * half.z;
    Aabb {
        min: center - extent,
        max: center + extent,
    }
}

/// A room footprint in its own frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<LocalBox>", into = "Vec<LocalBox>")]
pub enum LocalBounds {
    Single(LocalBox),
    /// Two or more sub-boxes for L/T/cross-shaped rooms
    Compound(Vec<LocalBox>),
}

impl LocalBounds {
    /// Build from a list of boxes; one box collapses to `Single`.
    /// Returns `None` for an empty list.
    pub fn from_boxes(mut boxes: Vec<LocalBox>) -> Option<Self> {
        match boxes.len() {
            0 => None,
            1 => boxes.pop().map(LocalBounds::Single),
            _ => Some(LocalBounds::Compound(boxes)),
        }
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, LocalBounds::Compound(_))
    }

    pub fn boxes(&self) -> &[LocalBox] {
        match self {
            LocalBounds::Single(b) => std::slice::from_ref(b),
            LocalBounds::Compound(boxes) => boxes,
        }
    }

    /// Rotate the footprint into world axes at `transform`
    pub fn to_world(&self, transform: &Transform) -> SpatialRecord {
        match self {
            LocalBounds::Single(b) => SpatialRecord {
                encapsulating: aabb_from_rotated_box(b, transform),
                sub_boxes: Vec::new(),
            },
            LocalBounds::Compound(boxes) => {
                let sub_boxes: Vec<Aabb> = boxes
                    .iter()
                    .map(|b| aabb_from_rotated_box(b, transform))
                    .collect();
                let encapsulating = sub_boxes
                    .iter()
                    .copied()
                    .reduce(|acc, b| acc.union(&b))
                    .unwrap_or_default();
                SpatialRecord {
                    encapsulating,
                    sub_boxes,
                }
            }
        }
    }
}

impl TryFrom<Vec<LocalBox>> for LocalBounds {
    type Error = &'static str;

    fn try_from(boxes: Vec<LocalBox>) -> Result<Self, Self::Error> {
        LocalBounds::from_boxes(boxes).ok_or("room bounds need at least one box")
    }
}

impl From<LocalBounds> for Vec<LocalBox> {
    fn from(bounds: LocalBounds) -> Self {
        match bounds {
            LocalBounds::Single(b) => vec![b],
            LocalBounds::Compound(boxes) => boxes,
        }
    }
}

/// World-space footprint of a placed (or candidate) room.
///
/// `sub_boxes` is empty for single-box rooms; otherwise it holds every
/// compound part and `encapsulating` is their union.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialRecord {
    pub encapsulating: Aabb,
    pub sub_boxes: Vec<Aabb>,
}

impl SpatialRecord {
    pub fn single(aabb: Aabb) -> Self {
        Self {
            encapsulating: aabb,
            sub_boxes: Vec::new(),
        }
    }

    pub fn is_compound(&self) -> bool {
        !self.sub_boxes.is_empty()
    }

    /// The boxes that make up the footprint
    pub fn parts(&self) -> &[Aabb] {
        if self.sub_boxes.is_empty() {
            std::slice::from_ref(&self.encapsulating)
        } else {
            &self.sub_boxes
        }
    }

    /// Summed XZ area of the parts
    pub fn footprint_area(&self) -> f32 {
        self.parts().iter().map(Aabb::xz_area).sum()
    }

    /// XZ overlap summed pairwise over parts
    pub fn xz_overlap_area(&self, other: &SpatialRecord) -> f32 {
        let mut total = 0.0;
        for a in self.parts() {
            for b in other.parts() {
                total += a.xz_overlap_area(b);
            }
        }
        total
    }

    /// Sub-box aware intersection: compound sides must have an intersecting
    /// pair of parts, simple pairs collide on their boxes.
    pub fn intersects(&self, other: &SpatialRecord) -> bool {
        if !self.encapsulating.intersects(&other.encapsulating) {
            return false;
        }
        if !self.is_compound() && !other.is_compound() {
            return true;
        }
        self.parts()
            .iter()
            .any(|a| other.parts().iter().any(|b| a.intersects(b)))
    }

    /// The encapsulating box contains every sub-box
    pub fn is_consistent(&self) -> bool {
        self.sub_boxes
            .iter()
            .all(|b| self.encapsulating.contains_box(b))
    }
}
