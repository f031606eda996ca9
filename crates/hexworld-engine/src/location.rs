//! Locations: groups of maps anchored at a world-map coordinate.

use hexworld_core::{ContentError, Document, LocationId, MapId, ProtoId};

/// Template a [`Location`] is created from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocationProto {
    /// Prototype id.
    pub pid: ProtoId,
    /// Map prototypes instantiated with the location, in order.
    pub maps: Vec<ProtoId>,
    /// World-map radius.
    pub radius: u16,
    /// Delete the location once no players remain on it.
    pub auto_garbage: bool,
    /// Shown on the world map.
    pub visible: bool,
    /// Lifetime after creation in milliseconds; `None` lives forever.
    pub lifetime_ms: Option<u64>,
}

impl LocationProto {
    /// A visible, permanent location with the given maps.
    pub fn new(pid: ProtoId, maps: impl IntoIterator<Item = ProtoId>) -> Self {
        Self {
            pid,
            maps: maps.into_iter().collect(),
            radius: 6,
            auto_garbage: false,
            visible: true,
            lifetime_ms: None,
        }
    }

    /// Builder: world-map radius.
    pub fn with_radius(mut self, radius: u16) -> Self {
        self.radius = radius;
        self
    }

    /// Builder: delete once empty of players.
    pub fn auto_garbage(mut self) -> Self {
        self.auto_garbage = true;
        self
    }

    /// Builder: hide from the world map.
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Builder: expire `lifetime_ms` after creation.
    pub fn with_lifetime(mut self, lifetime_ms: u64) -> Self {
        self.lifetime_ms = Some(lifetime_ms);
        self
    }
}

/// A live location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    /// Location id.
    pub id: LocationId,
    /// Prototype id.
    pub pid: ProtoId,
    /// World-map column.
    pub world_x: u16,
    /// World-map row.
    pub world_y: u16,
    /// World-map radius.
    pub radius: u16,
    /// Delete once no players remain.
    pub auto_garbage: bool,
    /// Shown on the world map.
    pub visible: bool,
    /// Deletion deadline in milliseconds.
    pub expires_at: Option<u64>,
    /// Maps in location order.
    pub maps: Vec<MapId>,
}

impl Location {
    /// A fresh location created from `proto` at `now_ms`.
    pub fn new(id: LocationId, proto: &LocationProto, world_x: u16, world_y: u16, now_ms: u64) -> Self {
        Self {
            id,
            pid: proto.pid,
            world_x,
            world_y,
            radius: proto.radius,
            auto_garbage: proto.auto_garbage,
            visible: proto.visible,
            expires_at: proto.lifetime_ms.map(|l| now_ms.saturating_add(l)),
            maps: Vec::new(),
        }
    }

    /// Rebuild a location from a persisted document.
    ///
    /// Reads `world_x` and `world_y` (required) and `radius`,
    /// `auto_garbage`, `visible`, `expires_at` (defaulting to the
    /// prototype). Maps are attached as they are restored.
    pub fn restore(id: LocationId, proto: &LocationProto, doc: &Document) -> Result<Self, ContentError> {
        let world_x = doc.require(id.0, "world_x")?;
        let world_y = doc.require(id.0, "world_y")?;
        let radius = match doc.get("radius") {
            Some(_) => doc.require(id.0, "radius")?,
            None => proto.radius,
        };
        let expires_at = match doc.get("expires_at") {
            Some(_) => Some(doc.require(id.0, "expires_at")?),
            None => None,
        };
        Ok(Self {
            id,
            pid: proto.pid,
            world_x,
            world_y,
            radius,
            auto_garbage: doc.get_bool("auto_garbage").unwrap_or(proto.auto_garbage),
            visible: doc.get_bool("visible").unwrap_or(proto.visible),
            expires_at,
            maps: Vec::new(),
        })
    }

    /// The deadline has passed.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at.is_some_and(|t| t <= now_ms)
    }

    /// Insert a map at `position`, clamped to the end.
    pub(crate) fn attach_map(&mut self, map: MapId, position: usize) {
        let at = position.min(self.maps.len());
        self.maps.insert(at, map);
    }
}
