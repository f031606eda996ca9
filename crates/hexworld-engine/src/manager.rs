//! The map manager: owner of every map, location and off-map critter.
//!
//! [`MapManager`] is the one place that may move a critter between
//! containers. It keeps a whereabouts index (`critter → map or global`)
//! so every lookup is a single hop, and it owns the shared path finder
//! and the path pool.
//!
//! Lifecycle operations, transits and view bookkeeping are further
//! `impl MapManager` blocks in their own private modules; this module
//! holds the state and the plain queries.

use std::fmt;
use std::sync::Arc;

use hexworld_arena::{ArenaError, PathPool, PathToken};
use hexworld_core::{
    ContentError, CritterId, DocValue, HexPos, LocationId, MapId, ProtoId, WorldEvents,
};
use hexworld_map::{Critter, MapProto, PlaceError, Rejected, RuntimeMap, StaticMapData};
use hexworld_nav::{PathFinder, PathOutcome, PathRequest, PathStep, TraceRequest, TraceResult};
use hexworld_space::HexGeometry;
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::error::TransitError;
use crate::location::{Location, LocationProto};
use crate::zones::{is_intersect_zone, WorldArea};

/// Owner of all maps, locations and global-map critters.
pub struct MapManager {
    pub(crate) config: EngineConfig,
    pub(crate) geom: HexGeometry,
    pub(crate) map_protos: IndexMap<ProtoId, MapProto>,
    pub(crate) location_protos: IndexMap<ProtoId, LocationProto>,
    statics: IndexMap<ProtoId, Arc<StaticMapData>>,
    pub(crate) maps: IndexMap<MapId, RuntimeMap>,
    pub(crate) locations: IndexMap<LocationId, Location>,
    pub(crate) global: IndexMap<CritterId, Critter>,
    pub(crate) whereabouts: IndexMap<CritterId, Option<MapId>>,
    paths: PathPool<PathStep>,
    finder: PathFinder,
    next_id: u32,
    pub(crate) now_ms: u64,
    pub(crate) events: Box<dyn WorldEvents>,
}

impl fmt::Debug for MapManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapManager")
            .field("maps", &self.maps.len())
            .field("locations", &self.locations.len())
            .field("global_critters", &self.global.len())
            .field("paths_in_flight", &self.paths.in_flight())
            .field("now_ms", &self.now_ms)
            .finish_non_exhaustive()
    }
}

impl MapManager {
    /// A manager with no content, reporting to `events`.
    pub fn new(config: EngineConfig, events: Box<dyn WorldEvents>) -> Result<Self, ConfigError> {
        config.validate()?;
        let paths = PathPool::new(config.path.pool())?;
        let finder = PathFinder::new(config.path.limits());
        Ok(Self {
            geom: HexGeometry::new(config.layout),
            config,
            map_protos: IndexMap::new(),
            location_protos: IndexMap::new(),
            statics: IndexMap::new(),
            maps: IndexMap::new(),
            locations: IndexMap::new(),
            global: IndexMap::new(),
            whereabouts: IndexMap::new(),
            paths,
            finder,
            next_id: 0,
            now_ms: 0,
            events,
        })
    }

    /// Configuration in force.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Geometry shared by every map.
    pub fn geometry(&self) -> HexGeometry {
        self.geom
    }

    /// Clock value of the last [`process_maps`](Self::process_maps) call.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    // ── Ids ─────────────────────────────────────────────────────

    pub(crate) fn alloc_id(&mut self) -> u32 {
        self.next_id = self
            .next_id
            .checked_add(1)
            .unwrap_or_else(|| panic!("entity id space exhausted"));
        self.next_id
    }

    pub(crate) fn reserve_id(&mut self, id: u32) {
        self.next_id = self.next_id.max(id);
    }

    /// A critter id no existing entity uses.
    pub fn new_critter_id(&mut self) -> CritterId {
        CritterId(self.alloc_id())
    }

    // ── Prototypes & static data ────────────────────────────────

    /// Register (or replace) a map prototype.
    pub fn register_map_proto(&mut self, proto: MapProto) {
        self.map_protos.insert(proto.pid, proto);
    }

    /// Register (or replace) a location prototype.
    pub fn register_location_proto(&mut self, proto: LocationProto) {
        self.location_protos.insert(proto.pid, proto);
    }

    /// Static data for a map prototype, building it on first use.
    ///
    /// A cached snapshot whose content hashes no longer match the
    /// registered prototype is rebuilt; maps already running keep the
    /// snapshot they were created with.
    pub fn find_static_map(&mut self, pid: ProtoId) -> Result<Arc<StaticMapData>, ContentError> {
        let proto = self
            .map_protos
            .get(&pid)
            .ok_or(ContentError::UnknownMapProto { proto: pid })?;
        if let Some(cached) = self.statics.get(&pid) {
            if cached.is_current_for(proto) {
                return Ok(Arc::clone(cached));
            }
            warn!(
                proto = %pid,
                cached = ?cached.hashes(),
                "static map data is stale, rebuilding"
            );
        }
        let data = Arc::new(StaticMapData::build(proto)?);
        self.statics.insert(pid, Arc::clone(&data));
        debug!(proto = %pid, width = data.width(), height = data.height(), "static map built");
        Ok(data)
    }

    /// Build static data for every registered map prototype.
    pub fn load_static_maps(&mut self) -> Result<usize, ContentError> {
        let pids: Vec<ProtoId> = self.map_protos.keys().copied().collect();
        for pid in &pids {
            self.find_static_map(*pid)?;
        }
        Ok(pids.len())
    }

    // ── Map & location lookups ──────────────────────────────────

    /// A map by id.
    pub fn get_map(&self, id: MapId) -> Option<&RuntimeMap> {
        self.maps.get(&id)
    }

    /// A map by id, mutably.
    pub fn get_map_mut(&mut self, id: MapId) -> Option<&mut RuntimeMap> {
        self.maps.get_mut(&id)
    }

    /// The `skip`-th map instantiated from `pid`.
    pub fn get_map_by_pid(&self, pid: ProtoId, skip: usize) -> Option<&RuntimeMap> {
        self.maps.values().filter(|m| m.pid() == pid).nth(skip)
    }

    /// Every map, in creation order.
    pub fn maps(&self) -> impl Iterator<Item = &RuntimeMap> + '_ {
        self.maps.values()
    }

    /// Number of maps.
    pub fn maps_count(&self) -> usize {
        self.maps.len()
    }

    /// A location by id.
    pub fn get_location(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(&id)
    }

    /// A location by id, mutably.
    pub fn get_location_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.get_mut(&id)
    }

    /// The location owning `map`.
    pub fn get_location_by_map(&self, map: MapId) -> Option<&Location> {
        self.locations.get(&self.maps.get(&map)?.location()?)
    }

    /// The `skip`-th location instantiated from `pid`.
    pub fn get_location_by_pid(&self, pid: ProtoId, skip: usize) -> Option<&Location> {
        self.locations.values().filter(|l| l.pid == pid).nth(skip)
    }

    /// Every location, in creation order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> + '_ {
        self.locations.values()
    }

    /// Number of locations.
    pub fn locations_count(&self) -> usize {
        self.locations.len()
    }

    // ── Zones ───────────────────────────────────────────────────

    /// Whether two world areas share a zone, the first widened by `zones`.
    pub fn is_intersect_zone(&self, a: WorldArea, b: WorldArea, zones: i32) -> bool {
        is_intersect_zone(a, b, zones, self.config.global.zone_length)
    }

    /// Visible locations reachable from zone `(zx, zy)` within `zone_radius` zones.
    pub fn get_zone_locations(&self, zx: i32, zy: i32, zone_radius: i32) -> Vec<LocationId> {
        let zl = i32::try_from(self.config.global.zone_length).unwrap_or(i32::MAX);
        let origin = WorldArea::new(zx.saturating_mul(zl), zy.saturating_mul(zl), 0);
        self.locations
            .values()
            .filter(|loc| loc.visible)
            .filter(|loc| {
                let area = WorldArea::new(
                    i32::from(loc.world_x),
                    i32::from(loc.world_y),
                    i32::from(loc.radius),
                );
                self.is_intersect_zone(origin, area, zone_radius)
            })
            .map(|loc| loc.id)
            .collect()
    }

    // ── Critters ────────────────────────────────────────────────

    /// Where a critter is: `Some(Some(map))`, `Some(None)` for the global
    /// map, `None` if unknown.
    pub fn whereabouts(&self, id: CritterId) -> Option<Option<MapId>> {
        self.whereabouts.get(&id).copied()
    }

    /// A critter wherever it is.
    pub fn get_critter(&self, id: CritterId) -> Option<&Critter> {
        match self.whereabouts(id)? {
            Some(map) => self.maps.get(&map)?.get_critter(id),
            None => self.global.get(&id),
        }
    }

    /// A critter wherever it is, mutably.
    pub fn get_critter_mut(&mut self, id: CritterId) -> Option<&mut Critter> {
        match self.whereabouts(id)? {
            Some(map) => self.maps.get_mut(&map)?.get_critter_mut(id),
            None => self.global.get_mut(&id),
        }
    }

    /// Critters on the global map.
    pub fn global_critters(&self) -> impl Iterator<Item = &Critter> + '_ {
        self.global.values()
    }

    /// Check whether `cr` could be placed on `map` (or the global map) at `hex`.
    ///
    /// With a `leader` other than the critter itself, the leader must
    /// already be in the destination container. A critter already on
    /// `map` blocks its own footprint here; moves within one map go
    /// through [`transit`](Self::transit).
    pub fn can_add_cr_to_map(
        &self,
        cr: &Critter,
        map: Option<MapId>,
        hex: HexPos,
        leader: Option<CritterId>,
    ) -> Result<(), TransitError> {
        if cr.multihex > self.config.critters.max_multihex {
            return Err(TransitError::MultihexTooLarge {
                critter: cr.id,
                multihex: cr.multihex,
            });
        }
        if let Some(leader) = leader.filter(|l| *l != cr.id) {
            if self.whereabouts(leader) != Some(map) {
                return Err(PlaceError::LeaderMissing { leader }.into());
            }
        }
        let Some(id) = map else {
            return Ok(());
        };
        let rm = self.maps.get(&id).ok_or(TransitError::MapNotFound { map: id })?;
        let limit = self.config.critters.max_per_map;
        if rm.get_critter(cr.id).is_none() && rm.critters_count() >= limit {
            return Err(PlaceError::MapFull { map: id, limit }.into());
        }
        let mut probe = cr.clone();
        probe.hex = hex;
        rm.can_place_critter(&probe)?;
        Ok(())
    }

    /// Put a critter that is nowhere yet on `map` (or the global map).
    ///
    /// # Panics
    ///
    /// Panics if the critter is already placed somewhere or `map` does
    /// not exist.
    pub fn add_cr_to_map(
        &mut self,
        mut cr: Critter,
        map: Option<MapId>,
        hex: HexPos,
        dir: u8,
    ) -> Result<(), Box<Rejected<Critter>>> {
        assert!(
            !self.whereabouts.contains_key(&cr.id),
            "critter {} is already placed",
            cr.id
        );
        let id = cr.id;
        cr.hex = hex;
        cr.dir = dir;
        if cr.look_distance == 0 {
            cr.look_distance = self.config.critters.default_look;
        }
        match map {
            Some(m) => {
                let rm = self
                    .maps
                    .get_mut(&m)
                    .unwrap_or_else(|| panic!("map {m} does not exist"));
                rm.try_add_critter(cr)?;
            }
            None => {
                cr.map_id = None;
                self.global.insert(id, cr);
            }
        }
        self.reserve_id(id.0);
        self.whereabouts.insert(id, map);
        Ok(())
    }

    /// Take a critter out of wherever it is.
    ///
    /// The returned record has no map and an empty view.
    ///
    /// # Panics
    ///
    /// Panics if the critter is not placed.
    pub fn erase_cr_from_map(&mut self, id: CritterId) -> Critter {
        let (mut cr, _) = self.take_critter(id);
        cr.visible_critters.clear();
        cr.visible_items.clear();
        cr
    }

    /// Remove a critter from its container, returning it and where it was.
    pub(crate) fn take_critter(&mut self, id: CritterId) -> (Critter, Option<MapId>) {
        let from = self
            .whereabouts
            .shift_remove(&id)
            .unwrap_or_else(|| panic!("critter {id} is not placed"));
        let mut cr = match from {
            Some(map) => self
                .maps
                .get_mut(&map)
                .unwrap_or_else(|| panic!("critter {id} indexed on missing map {map}"))
                .erase_critter(id),
            None => self
                .global
                .shift_remove(&id)
                .unwrap_or_else(|| panic!("critter {id} indexed on the global map but absent")),
        };
        cr.map_id = None;
        (cr, from)
    }

    /// Nearest hex around `hex` on `map` where `cr` fits, avoiding triggers.
    pub fn find_place_on_map(
        &self,
        cr: &Critter,
        map: MapId,
        hex: HexPos,
        radius: u32,
    ) -> Option<HexPos> {
        self.maps
            .get(&map)?
            .find_start_hex(hex, cr.footprint_radius(), radius, true)
    }

    // ── Paths & traces ──────────────────────────────────────────

    /// Search for a path on `map` and store it in the pool.
    ///
    /// The token stays valid until the pool recycles its slot.
    pub fn find_path(&mut self, map: MapId, req: &PathRequest) -> PathOutcome<PathToken> {
        let Some(rm) = self.maps.get(&map) else {
            return PathOutcome::MapNotFound;
        };
        let paths = &mut self.paths;
        self.finder.find(rm, req).map_path(|steps| paths.store(steps))
    }

    /// Steps of a stored path.
    pub fn get_path(&self, token: PathToken) -> Result<&[PathStep], ArenaError> {
        self.paths.get(token)
    }

    /// Mark every step of a stored path as running or walking.
    pub fn path_set_move_params(&mut self, token: PathToken, run: bool) -> Result<(), ArenaError> {
        for step in self.paths.get_mut(token)? {
            step.run = run;
        }
        Ok(())
    }

    /// Release a stored path early.
    pub fn release_path(&mut self, token: PathToken) -> Result<(), ArenaError> {
        self.paths.release(token)
    }

    /// Trace a bullet on `map`.
    pub fn trace_bullet(&self, map: MapId, req: TraceRequest<'_>) -> Option<TraceResult> {
        Some(hexworld_nav::trace_bullet(self.maps.get(&map)?, req))
    }

    /// The path finder (for pinning its tie-break state).
    pub fn path_finder_mut(&mut self) -> &mut PathFinder {
        &mut self.finder
    }

    // ── Properties & timers ─────────────────────────────────────

    /// Set a map property, notifying viewers when the value changed.
    pub fn set_map_property(&mut self, map: MapId, key: &str, value: DocValue) -> Option<bool> {
        let changed = self.maps.get_mut(&map)?.set_property(key, value);
        if changed {
            self.events.property_changed(map, key);
        }
        Some(changed)
    }

    /// Advance every map's loop timers to `now_ms`, reporting fired loops.
    pub fn process_maps(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
        for map in self.maps.values_mut() {
            for index in map.process(now_ms) {
                self.events.map_loop(map.id(), index);
            }
        }
    }

    // ── Statistics ──────────────────────────────────────────────

    /// Human-readable summary of locations and their maps.
    pub fn get_locations_maps_statistics(&self) -> String {
        let mut lines = vec![
            format!("Locations count: {}", self.locations.len()),
            format!("Maps count: {}", self.maps.len()),
            format!("Global critters: {}", self.global.len()),
        ];
        for loc in self.locations.values() {
            lines.push(format!(
                "Location {} pid {} at ({}, {}) radius {}",
                loc.id, loc.pid, loc.world_x, loc.world_y, loc.radius
            ));
            lines.extend(loc.maps.iter().filter_map(|id| self.maps.get(id)).map(|map| {
                format!(
                    "  Map {} pid {} {}x{} critters {} players {} items {}",
                    map.id(),
                    map.pid(),
                    map.width(),
                    map.height(),
                    map.critters_count(),
                    map.players_count(),
                    map.items().count()
                )
            }));
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}
