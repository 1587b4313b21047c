//! Room catalog - the pool of templates the generator grows floors from.
//!
//! Templates carry tags (category, sector, weight, enabled) and the socket
//! inventory derived from their geometry. Lookups filter on exact tag
//! matches; `weighted_pick` draws from the shared layout RNG.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::CatalogError;
use crate::geometry::LocalBounds;
use crate::rng::LayoutRng;
use crate::socket::{SocketSpec, SocketType};

/// Room category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomCategory {
    Corridor,
    Intersection,
    Hub,
    Feature,
    Terminus,
    EntryElevator,
    ExitElevator,
    SafeRoom,
}

impl RoomCategory {
    /// Categories the growth loop may place. Entry and exit rooms are
    /// placed by their own phases.
    pub fn is_growable(self) -> bool {
        !matches!(self, RoomCategory::EntryElevator | RoomCategory::ExitElevator)
    }
}

/// Instantiable geometry of a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomGeometry {
    /// Geometry/prefab name, the last-resort identity for cached layouts
    pub name: String,
    pub bounds: LocalBounds,
    pub sockets: Vec<SocketSpec>,
}

/// A room template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomTemplate {
    /// Stable identifier
    pub id: String,
    pub display_name: String,
    pub category: RoomCategory,
    #[serde(default)]
    pub sector: u32,
    #[serde(default = "default_weight")]
    pub weight: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Distinct socket types present on the geometry (derived)
    #[serde(default)]
    pub socket_types: Vec<SocketType>,
    /// Number of sockets on the geometry (derived)
    #[serde(default)]
    pub socket_count: usize,
    pub geometry: RoomGeometry,
}

fn default_weight() -> i32 {
    1
}

fn default_enabled() -> bool {
    true
}

impl RoomTemplate {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        category: RoomCategory,
        geometry: RoomGeometry,
    ) -> Self {
        let mut template = Self {
            id: id.into(),
            display_name: display_name.into(),
            category,
            sector: 0,
            weight: 1,
            enabled: true,
            socket_types: Vec::new(),
            socket_count: 0,
            geometry,
        };
        template.refresh_from_geometry();
        template
    }

    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_sector(mut self, sector: u32) -> Self {
        self.sector = sector;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Recompute the socket inventory from the geometry
    pub fn refresh_from_geometry(&mut self) {
        let mut types: Vec<SocketType> = self
            .geometry
            .sockets
            .iter()
            .map(|s| s.socket_type)
            .collect();
        types.sort();
        types.dedup();
        self.socket_types = types;
        self.socket_count = self.geometry.sockets.len();
    }

    pub fn has_socket_type(&self, socket_type: SocketType) -> bool {
        self.socket_types.contains(&socket_type)
    }

    /// Indices of geometry sockets matching `socket_type`, in authored order
    pub fn compatible_sockets(&self, socket_type: SocketType) -> Vec<usize> {
        self.geometry
            .sockets
            .iter()
            .enumerate()
            .filter(|(_, s)| s.socket_type == socket_type)
            .map(|(i, _)| i)
            .collect()
    }

    /// Weight used by `weighted_pick`; misconfigured weights count as 1
    pub fn effective_weight(&self) -> u32 {
        if self.weight <= 0 {
            1
        } else {
            self.weight as u32
        }
    }
}

/// Catalog file layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub templates: Vec<RoomTemplate>,
}

/// Aliases older layouts used for the special rooms
const ENTRY_ALIASES: &[&str] = &["start", "startroom", "start_room", "entry", "entrance", "entry_elevator"];
const EXIT_ALIASES: &[&str] = &["exit", "exitroom", "exit_room", "end", "endroom", "exit_elevator"];
const SAFE_ALIASES: &[&str] = &["safe", "saferoom", "safe_room"];

/// Indexed collection of room templates
#[derive(Debug, Clone, Default)]
pub struct RoomCatalog {
    templates: Vec<RoomTemplate>,
}

impl RoomCatalog {
    /// Build a catalog, refreshing every template's socket inventory.
    pub fn new(templates: Vec<RoomTemplate>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for template in &templates {
            if !seen.insert(template.id.clone()) {
                return Err(CatalogError::DuplicateTemplate(template.id.clone()));
            }
            if template.geometry.sockets.is_empty() {
                return Err(CatalogError::NoSockets(template.id.clone()));
            }
            for (i, socket) in template.geometry.sockets.iter().enumerate() {
                if socket.forward.length() <= f32::EPSILON {
                    return Err(CatalogError::InvalidSocket {
                        template: template.id.clone(),
                        socket: i,
                    });
                }
            }
        }

        let mut catalog = Self { templates };
        catalog.refresh_from_geometry();
        Ok(catalog)
    }

    /// Parse a catalog document from JSON
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDocument = serde_json::from_str(json)?;
        Self::new(doc.templates)
    }

    pub fn to_json(&self) -> Result<String, CatalogError> {
        let doc = CatalogDocument {
            templates: self.templates.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn refresh_from_geometry(&mut self) {
        for template in &mut self.templates {
            template.refresh_from_geometry();
        }
    }

    pub fn templates(&self) -> &[RoomTemplate] {
        &self.templates
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&RoomTemplate> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Templates offering `socket_type`, optionally restricted to a category
    /// and sector. Disabled templates are skipped unless asked for.
    pub fn lookup(
        &self,
        socket_type: SocketType,
        category: Option<RoomCategory>,
        sector: Option<u32>,
        include_disabled: bool,
    ) -> Vec<&RoomTemplate> {
        self.templates
            .iter()
            .filter(|t| include_disabled || t.enabled)
            .filter(|t| t.has_socket_type(socket_type))
            .filter(|t| category.map_or(true, |c| t.category == c))
            .filter(|t| sector.map_or(true, |s| t.sector == s))
            .collect()
    }

    pub fn by_category(&self, category: RoomCategory, include_disabled: bool) -> Vec<&RoomTemplate> {
        self.templates
            .iter()
            .filter(|t| t.category == category && (include_disabled || t.enabled))
            .collect()
    }

    /// Weighted random choice. Draws one integer in `[0, total_weight)` and
    /// returns the first template whose cumulative weight exceeds it.
    pub fn weighted_pick<'a>(
        candidates: &[&'a RoomTemplate],
        rng: &mut LayoutRng,
    ) -> Option<&'a RoomTemplate> {
        if candidates.is_empty() {
            return None;
        }
        let total: u64 = candidates.iter().map(|t| u64::from(t.effective_weight())).sum();
        let roll = rng.uniform_u64(0, total);

        let mut cumulative = 0u64;
        for &template in candidates {
            cumulative += u64::from(template.effective_weight());
            if cumulative > roll {
                return Some(template);
            }
        }
        candidates.last().copied()
    }

    /// Resolve a cached identity back to a template.
    ///
    /// Order: display name, stable id, geometry name, then the legacy
    /// aliases of the entry/exit/safe rooms.
    pub fn find_by_identity(&self, identity: &str) -> Option<&RoomTemplate> {
        if let Some(t) = self.templates.iter().find(|t| t.display_name == identity) {
            return Some(t);
        }
        if let Some(t) = self.get(identity) {
            return Some(t);
        }
        if let Some(t) = self.templates.iter().find(|t| t.geometry.name == identity) {
            return Some(t);
        }

        let key = identity.to_ascii_lowercase();
        let category = if ENTRY_ALIASES.contains(&key.as_str()) {
            RoomCategory::EntryElevator
        } else if EXIT_ALIASES.contains(&key.as_str()) {
            RoomCategory::ExitElevator
        } else if SAFE_ALIASES.contains(&key.as_str()) {
            RoomCategory::SafeRoom
        } else {
            return None;
        };
        self.by_category(category, false)
            .first()
            .copied()
            .or_else(|| self.by_category(category, true).first().copied())
    }

    /// The template the floor starts from: an explicit override, or the
    /// first enabled entry elevator.
    pub fn start_template(&self, override_id: Option<&str>) -> Option<&RoomTemplate> {
        match override_id {
            Some(id) => self.find_by_identity(id).filter(|t| t.enabled),
            None => self.by_category(RoomCategory::EntryElevator, false).first().copied(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LocalBox, Vec3};

    fn geometry(name: &str, sockets: Vec<SocketSpec>) -> RoomGeometry {
        RoomGeometry {
            name: name.to_string(),
            bounds: LocalBounds::Single(LocalBox::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(4.0, 4.0, 4.0))),
            sockets,
        }
    }

    fn door(t: SocketType, z: f32) -> SocketSpec {
        SocketSpec::new(t, Vec3::new(0.0, 0.0, z), Vec3::new(0.0, 0.0, z.signum()))
    }

    fn sample() -> RoomCatalog {
        RoomCatalog::new(vec![
            RoomTemplate::new(
                "hall",
                "Hall",
                RoomCategory::Corridor,
                geometry("hall_mesh", vec![door(SocketType::Standard, 2.0), door(SocketType::Standard, -2.0)]),
            )
            .with_weight(3),
            RoomTemplate::new(
                "duct",
                "Duct",
                RoomCategory::Corridor,
                geometry("duct_mesh", vec![door(SocketType::Maintenance, 2.0)]),
            )
            .with_sector(2),
            RoomTemplate::new(
                "vault",
                "Vault",
                RoomCategory::Feature,
                geometry("vault_mesh", vec![door(SocketType::Standard, -2.0), door(SocketType::Maintenance, 2.0)]),
            )
            .with_enabled(false),
            RoomTemplate::new(
                "lift_in",
                "Arrival Lift",
                RoomCategory::EntryElevator,
                geometry("lift_a", vec![door(SocketType::Standard, 2.0)]),
            ),
            RoomTemplate::new(
                "lift_out",
                "Departure Lift",
                RoomCategory::ExitElevator,
                geometry("lift_b", vec![door(SocketType::Standard, -2.0)]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_refresh_from_geometry() {
        let catalog = sample();
        let vault = catalog.get("vault").unwrap();
        assert_eq!(vault.socket_count, 2);
        assert_eq!(vault.socket_types, vec![SocketType::Standard, SocketType::Maintenance]);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let t = sample().get("hall").unwrap().clone();
        let result = RoomCatalog::new(vec![t.clone(), t]);
        assert!(matches!(result, Err(CatalogError::DuplicateTemplate(id)) if id == "hall"));
    }

    #[test]
    fn test_socketless_template_rejected() {
        let t = RoomTemplate::new("empty", "Empty", RoomCategory::Feature, geometry("e", Vec::new()));
        assert!(matches!(RoomCatalog::new(vec![t]), Err(CatalogError::NoSockets(_))));
    }

    #[test]
    fn test_lookup_filters() {
        let catalog = sample();
        let ids = |v: Vec<&RoomTemplate>| v.iter().map(|t| t.id.clone()).collect::<Vec<_>>();

        assert_eq!(
            ids(catalog.lookup(SocketType::Standard, None, None, false)),
            vec!["hall", "lift_in", "lift_out"]
        );
        assert_eq!(
            ids(catalog.lookup(SocketType::Standard, None, None, true)),
            vec!["hall", "vault", "lift_in", "lift_out"]
        );
        assert_eq!(
            ids(catalog.lookup(SocketType::Maintenance, None, Some(2), false)),
            vec!["duct"]
        );
        assert!(catalog
            .lookup(SocketType::Standard, Some(RoomCategory::Hub), None, false)
            .is_empty());
    }

    #[test]
    fn test_weighted_pick_empty() {
        let mut rng = LayoutRng::new(1);
        assert!(RoomCatalog::weighted_pick(&[], &mut rng).is_none());
    }

    #[test]
    fn test_weighted_pick_respects_weights() {
        let catalog = sample();
        let hall = catalog.get("hall").unwrap();
        let lift = catalog.get("lift_in").unwrap();
        let candidates = vec![hall, lift];

        let mut rng = LayoutRng::new(99);
        let mut hall_count = 0;
        for _ in 0..4000 {
            if RoomCatalog::weighted_pick(&candidates, &mut rng).unwrap().id == "hall" {
                hall_count += 1;
            }
        }
        // Expected 3:1
        assert!(hall_count > 2700 && hall_count < 3300, "hall picked {}", hall_count);
    }

    #[test]
    fn test_non_positive_weight_counts_as_one() {
        let catalog = sample();
        let mut zero = catalog.get("duct").unwrap().clone();
        zero.weight = 0;
        let mut negative = zero.clone();
        negative.id = "neg".into();
        negative.weight = -5;
        assert_eq!(zero.effective_weight(), 1);
        assert_eq!(negative.effective_weight(), 1);

        let candidates = vec![&zero, &negative];
        let mut rng = LayoutRng::new(7);
        let mut seen_neg = false;
        for _ in 0..100 {
            if RoomCatalog::weighted_pick(&candidates, &mut rng).unwrap().id == "neg" {
                seen_neg = true;
            }
        }
        assert!(seen_neg);
    }

    #[test]
    fn test_weighted_pick_with_max_weights() {
        let catalog = sample();
        let heavy: Vec<RoomTemplate> = ["a", "b", "c"]
            .iter()
            .map(|id| {
                let mut t = catalog.get("hall").unwrap().clone().with_weight(i32::MAX);
                t.id = (*id).into();
                t
            })
            .collect();
        let candidates: Vec<&RoomTemplate> = heavy.iter().collect();

        let mut rng = LayoutRng::new(11);
        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..300 {
            seen.insert(RoomCatalog::weighted_pick(&candidates, &mut rng).unwrap().id.clone());
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(rng.draws(), 300);
    }

    #[test]
    fn test_find_by_identity_priority() {
        let catalog = sample();
        assert_eq!(catalog.find_by_identity("Hall").unwrap().id, "hall");
        assert_eq!(catalog.find_by_identity("duct").unwrap().id, "duct");
        assert_eq!(catalog.find_by_identity("vault_mesh").unwrap().id, "vault");
        assert!(catalog.find_by_identity("nope").is_none());
    }

    #[test]
    fn test_find_by_identity_legacy_aliases() {
        let catalog = sample();
        assert_eq!(catalog.find_by_identity("StartRoom").unwrap().id, "lift_in");
        assert_eq!(catalog.find_by_identity("Exit").unwrap().id, "lift_out");
        assert!(catalog.find_by_identity("SafeRoom").is_none());
    }

    #[test]
    fn test_start_template() {
        let catalog = sample();
        assert_eq!(catalog.start_template(None).unwrap().id, "lift_in");
        assert_eq!(catalog.start_template(Some("hall")).unwrap().id, "hall");
        assert!(catalog.start_template(Some("vault")).is_none());
    }

    #[test]
    fn test_json_roundtrip_keeps_templates() {
        let catalog = sample();
        let json = catalog.to_json().unwrap();
        let loaded = RoomCatalog::from_json(&json).unwrap();
        assert_eq!(loaded.templates(), catalog.templates());
    }
}
