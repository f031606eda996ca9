//! Creating, restoring, regenerating and deleting maps and locations.

use std::sync::Arc;

use hexworld_core::{ContentError, CritterId, Document, HexPos, ItemId, LocationId, MapId, ProtoId};
use hexworld_map::{Critter, Item, RuntimeMap, StaticMapData, LOOP_COUNT};
use tracing::{debug, info, warn};

use crate::location::Location;
use crate::manager::MapManager;

/// Document keys consumed by [`MapManager::restore_map`]; every other
/// key becomes a custom map property.
const MAP_DOC_KEYS: [&str; 2] = ["loc_id", "loc_map_index"];

impl MapManager {
    fn instantiate(
        &self,
        id: MapId,
        data: Arc<StaticMapData>,
        location: Option<LocationId>,
        index: u32,
    ) -> RuntimeMap {
        let periods = self
            .map_protos
            .get(&data.pid())
            .map_or([0; LOOP_COUNT], |p| p.loop_periods);
        let mut map = RuntimeMap::new(id, data, self.geom);
        map.set_location(location, index);
        map.set_loops(periods, self.now_ms);
        map
    }

    /// Position in `location`'s map list for a map with `index`.
    fn map_position(&self, location: LocationId, index: u32) -> usize {
        self.locations.get(&location).map_or(0, |loc| {
            loc.maps
                .iter()
                .filter_map(|m| self.maps.get(m))
                .filter(|m| m.loc_map_index() < index)
                .count()
        })
    }

    // ── Maps ────────────────────────────────────────────────────

    /// Instantiate a map prototype and generate its spawns.
    pub fn create_map(&mut self, pid: ProtoId, location: Option<LocationId>) -> Result<MapId, ContentError> {
        let data = self.find_static_map(pid)?;
        let index = match location {
            Some(loc) => {
                let l = self
                    .locations
                    .get(&loc)
                    .ok_or(ContentError::LocationNotFound { location: loc })?;
                u32::try_from(l.maps.len()).unwrap_or(u32::MAX)
            }
            None => 0,
        };
        let id = MapId(self.alloc_id());
        let map = self.instantiate(id, data, location, index);
        self.maps.insert(id, map);
        if let Some(loc) = location.and_then(|l| self.locations.get_mut(&l)) {
            loc.maps.push(id);
        }
        self.generate_map_content(id);
        info!(map = %id, proto = %pid, location = ?location, "map created");
        Ok(id)
    }

    /// Rebuild a persisted map under its old id.
    ///
    /// Reads `loc_id` (required) and `loc_map_index` (default 0); every
    /// other field becomes a custom property. Spawns are not generated:
    /// restored content is placed by the caller.
    pub fn restore_map(&mut self, id: MapId, pid: ProtoId, doc: &Document) -> Result<(), ContentError> {
        if self.maps.contains_key(&id) {
            return Err(ContentError::DuplicateId { id: id.0 });
        }
        let data = self.find_static_map(pid)?;
        let location = LocationId(doc.require(id.0, "loc_id")?);
        if !self.locations.contains_key(&location) {
            return Err(ContentError::LocationNotFound { location });
        }
        let index = match doc.get("loc_map_index") {
            Some(_) => doc.require(id.0, "loc_map_index")?,
            None => 0,
        };
        let mut map = self.instantiate(id, data, Some(location), index);
        for (key, value) in doc.iter().filter(|(k, _)| !MAP_DOC_KEYS.contains(k)) {
            map.set_property(key, value.clone());
        }
        let position = self.map_position(location, index);
        self.maps.insert(id, map);
        if let Some(loc) = self.locations.get_mut(&location) {
            loc.attach_map(id, position);
        }
        self.reserve_id(id.0);
        info!(map = %id, proto = %pid, location = %location, "map restored");
        Ok(())
    }

    fn generate_map_content(&mut self, id: MapId) {
        let Some(pid) = self.maps.get(&id).map(RuntimeMap::pid) else {
            return;
        };
        let Some(proto) = self.map_protos.get(&pid) else {
            return;
        };
        let critter_spawns = proto.critter_spawns.clone();
        let item_spawns = proto.item_spawns.clone();
        let look = self.config.critters.default_look;
        let seek = self.config.critters.seek_radius;
        let max_multihex = self.config.critters.max_multihex;

        for spawn in critter_spawns {
            let cid = CritterId(self.alloc_id());
            let Some(map) = self.maps.get_mut(&id) else {
                return;
            };
            let multihex = spawn.multihex.min(max_multihex);
            let Some(hex) = map.find_start_hex(spawn.hex, u32::from(multihex), seek, false) else {
                warn!(map = %id, hex = %spawn.hex, proto = %spawn.proto, "no room for spawned critter");
                continue;
            };
            let mut cr = Critter::npc(cid, spawn.proto, spawn.npc_role)
                .at(hex)
                .with_multihex(multihex)
                .with_look(look);
            cr.dir = spawn.dir;
            map.add_critter(cr);
            self.whereabouts.insert(cid, Some(id));
        }

        for spawn in item_spawns {
            let item = Item::new(ItemId(self.alloc_id()), spawn.proto);
            let Some(map) = self.maps.get_mut(&id) else {
                return;
            };
            if let Err(rejected) = map.add_item(item, spawn.hex) {
                warn!(map = %id, error = %rejected.error, "spawned item rejected");
            }
        }
    }

    fn delete_map_content(&mut self, id: MapId) {
        let Some(map) = self.maps.get_mut(&id) else {
            return;
        };
        let npcs: Vec<CritterId> = map.npcs().map(|c| c.id).collect();
        for npc in &npcs {
            map.erase_critter(*npc);
        }
        let items: Vec<ItemId> = map.items().map(|i| i.id).collect();
        for item in items {
            map.erase_item(item);
        }
        for npc in npcs {
            self.whereabouts.shift_remove(&npc);
        }
    }

    /// Discard a map's NPCs and items and generate them afresh.
    ///
    /// The map keeps its id, location and properties but picks up the
    /// current static data. Players stay, shifted to the nearest free
    /// hex; a player with no room left goes to the global map.
    pub fn regenerate_map(&mut self, id: MapId) -> Result<(), ContentError> {
        let Some(pid) = self.maps.get(&id).map(RuntimeMap::pid) else {
            return Ok(());
        };
        let data = self.find_static_map(pid)?;
        self.delete_map_content(id);

        let players: Vec<CritterId> = self
            .maps
            .get(&id)
            .map(|m| m.players().map(|c| c.id).collect())
            .unwrap_or_default();
        let players: Vec<Critter> = players
            .into_iter()
            .map(|p| self.erase_cr_from_map(p))
            .collect();

        let Some(old) = self.maps.shift_remove(&id) else {
            return Ok(());
        };
        let mut map = self.instantiate(id, data, old.location(), old.loc_map_index());
        for (key, value) in old.properties().iter() {
            map.set_property(key, value.clone());
        }
        self.maps.insert(id, map);
        self.generate_map_content(id);

        let seek = self.config.critters.seek_radius;
        for cr in players {
            let hex = self
                .maps
                .get(&id)
                .and_then(|m| m.find_start_hex(cr.hex, cr.footprint_radius(), seek, false));
            let cid = cr.id;
            let placed = match hex {
                Some(hex) => {
                    let dir = cr.dir;
                    self.add_cr_to_map(cr, Some(id), hex, dir).map_err(|r| r.entity)
                }
                None => Err(cr),
            };
            if let Err(cr) = placed {
                let dir = cr.dir;
                let world = self.world_pos_of(Some(id));
                let mut cr = cr;
                cr.world_pos = world;
                if self.add_cr_to_map(cr, None, HexPos::default(), dir).is_ok() {
                    self.events.critter_transited(cid, Some(id), None);
                }
            }
        }
        info!(map = %id, proto = %pid, "map regenerated");
        Ok(())
    }

    /// World-map position of the location holding `map`.
    pub(crate) fn world_pos_of(&self, map: Option<MapId>) -> (u16, u16) {
        map.and_then(|m| self.get_location_by_map(m))
            .map_or((0, 0), |l| (l.world_x, l.world_y))
    }

    // ── Locations ───────────────────────────────────────────────

    /// Create a location and all of its maps.
    ///
    /// Static data for every map is resolved before anything is created,
    /// so a broken map prototype leaves no partial location behind.
    pub fn create_location(&mut self, pid: ProtoId, world_x: u16, world_y: u16) -> Result<LocationId, ContentError> {
        let proto = self
            .location_protos
            .get(&pid)
            .cloned()
            .ok_or(ContentError::UnknownLocationProto { proto: pid })?;
        for map in &proto.maps {
            self.find_static_map(*map)
                .map_err(|e| ContentError::LocationMapFailed {
                    location: pid,
                    map: *map,
                    reason: Box::new(e),
                })?;
        }
        let id = LocationId(self.alloc_id());
        self.locations
            .insert(id, Location::new(id, &proto, world_x, world_y, self.now_ms));
        for map in &proto.maps {
            self.create_map(*map, Some(id))?;
        }
        info!(location = %id, proto = %pid, world_x, world_y, "location created");
        Ok(id)
    }

    /// Rebuild a persisted location under its old id. Its maps are
    /// restored separately with [`restore_map`](Self::restore_map).
    pub fn restore_location(&mut self, id: LocationId, pid: ProtoId, doc: &Document) -> Result<(), ContentError> {
        if self.locations.contains_key(&id) {
            return Err(ContentError::DuplicateId { id: id.0 });
        }
        let proto = self
            .location_protos
            .get(&pid)
            .ok_or(ContentError::UnknownLocationProto { proto: pid })?;
        let loc = Location::restore(id, proto, doc)?;
        self.locations.insert(id, loc);
        self.reserve_id(id.0);
        info!(location = %id, proto = %pid, "location restored");
        Ok(())
    }

    /// Move every player on `map` to the global map. Returns who moved.
    pub fn kick_players_to_global_map(&mut self, map: MapId) -> Vec<CritterId> {
        let players: Vec<CritterId> = self
            .maps
            .get(&map)
            .map(|m| m.players().map(|c| c.id).collect())
            .unwrap_or_default();
        let mut moved = Vec::new();
        for id in players {
            if self.whereabouts(id) != Some(Some(map)) {
                // dragged along by a leader kicked earlier
                moved.push(id);
                continue;
            }
            match self.transit_to_global(id, true) {
                Ok(()) => moved.push(id),
                Err(error) => warn!(map = %map, critter = %id, %error, "player could not leave map"),
            }
        }
        moved
    }

    /// Delete a location and its maps, first moving players to the global
    /// map. Returns the players moved, or `None` if there is no such
    /// location.
    pub fn delete_location(&mut self, id: LocationId) -> Option<Vec<CritterId>> {
        let maps = self.locations.get(&id)?.maps.clone();
        let mut kicked = Vec::new();
        for map in &maps {
            kicked.extend(self.kick_players_to_global_map(*map));
        }
        for map in &maps {
            self.delete_map_content(*map);
            let remaining: Vec<CritterId> = self
                .maps
                .get(map)
                .map(|m| m.critters().map(|c| c.id).collect())
                .unwrap_or_default();
            for cr in remaining {
                self.erase_cr_from_map(cr);
            }
            self.maps.shift_remove(map);
        }
        self.locations.shift_remove(&id);
        self.events.location_deleted(id);
        info!(location = %id, maps = maps.len(), players = kicked.len(), "location deleted");
        Some(kicked)
    }

    /// Whether no player stands on any of the location's maps.
    fn location_is_empty(&self, loc: &Location) -> bool {
        loc.maps
            .iter()
            .filter_map(|m| self.maps.get(m))
            .all(|m| m.players_count() == 0)
    }

    /// Delete every expired location, and every auto-garbage location no
    /// player stands on. Returns the deleted ids.
    ///
    /// Advances the manager clock, so locations created afterwards measure
    /// their lifetime from `now_ms`.
    pub fn location_garbager(&mut self, now_ms: u64) -> Vec<LocationId> {
        self.now_ms = now_ms;
        let doomed: Vec<LocationId> = self
            .locations
            .values()
            .filter(|l| l.is_expired(now_ms) || (l.auto_garbage && self.location_is_empty(l)))
            .map(|l| l.id)
            .collect();
        for id in &doomed {
            self.delete_location(*id);
        }
        if !doomed.is_empty() {
            debug!(deleted = doomed.len(), "location garbager swept");
        }
        doomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::location::LocationProto;
    use hexworld_core::{DocValue, NullEvents};
    use hexworld_map::{CritterSpawn, ItemProto, ItemSpawn, MapProto};

    const TOWN: ProtoId = ProtoId(100);
    const STREET: ProtoId = ProtoId(10);
    const CELLAR: ProtoId = ProtoId(11);

    fn manager() -> MapManager {
        let mut mm = MapManager::new(EngineConfig::default(), Box::new(NullEvents)).unwrap();
        let mut street = MapProto::new(STREET, 20, 20);
        street.critter_spawns.push(CritterSpawn {
            proto: ProtoId(50),
            hex: HexPos::new(5, 5),
            dir: 2,
            multihex: 0,
            npc_role: 7,
        });
        street.item_spawns.push(ItemSpawn {
            hex: HexPos::new(6, 6),
            proto: ItemProto::new(ProtoId(60)).blocking(),
        });
        street.loop_periods = [100, 0, 0, 0, 0];
        mm.register_map_proto(street);
        mm.register_map_proto(MapProto::new(CELLAR, 10, 10));
        mm.register_location_proto(LocationProto::new(TOWN, [STREET, CELLAR]));
        mm
    }

    // ── Creation ────────────────────────────────────────────────

    #[test]
    fn create_location_builds_maps_and_spawns() {
        let mut mm = manager();
        let loc = mm.create_location(TOWN, 100, 200).unwrap();
        let maps = mm.get_location(loc).unwrap().maps.clone();
        assert_eq!(maps.len(), 2);

        let street = mm.get_map(maps[0]).unwrap();
        assert_eq!(street.pid(), STREET);
        assert_eq!(street.location(), Some(loc));
        assert_eq!(street.npcs_count(), 1);
        assert_eq!(street.items().count(), 1);
        assert_eq!(street.loops().period(0), 100);
        let npc = street.get_npc(7, Default::default(), 0).unwrap();
        assert_eq!(npc.dir, 2);
        assert_eq!(mm.whereabouts(npc.id), Some(Some(maps[0])));

        assert_eq!(mm.get_map(maps[1]).unwrap().loc_map_index(), 1);
        assert_eq!(mm.get_location_by_map(maps[1]).map(|l| l.id), Some(loc));
        assert_eq!(mm.get_map_by_pid(CELLAR, 0).map(|m| m.id()), Some(maps[1]));
    }

    #[test]
    fn broken_map_leaves_no_partial_location() {
        let mut mm = manager();
        mm.register_location_proto(LocationProto::new(ProtoId(101), [STREET, ProtoId(99)]));
        let err = mm.create_location(ProtoId(101), 0, 0).unwrap_err();
        assert!(matches!(err, ContentError::LocationMapFailed { map: ProtoId(99), .. }));
        assert_eq!(mm.locations_count(), 0);
        assert_eq!(mm.maps_count(), 0);
    }

    #[test]
    fn unknown_location_proto() {
        let mut mm = manager();
        assert_eq!(
            mm.create_location(ProtoId(5), 0, 0).unwrap_err(),
            ContentError::UnknownLocationProto { proto: ProtoId(5) }
        );
    }

    // ── Restoration ─────────────────────────────────────────────

    #[test]
    fn restore_location_then_maps_in_any_order() {
        let mut mm = manager();
        let doc = Document::new()
            .with("world_x", DocValue::Int(30))
            .with("world_y", DocValue::Int(40));
        mm.restore_location(LocationId(500), TOWN, &doc).unwrap();

        let cellar = Document::new()
            .with("loc_id", DocValue::Int(500))
            .with("loc_map_index", DocValue::Int(1))
            .with("lights", DocValue::Bool(true));
        mm.restore_map(MapId(502), CELLAR, &cellar).unwrap();
        let street = Document::new().with("loc_id", DocValue::Int(500));
        mm.restore_map(MapId(501), STREET, &street).unwrap();

        let loc = mm.get_location(LocationId(500)).unwrap();
        assert_eq!(loc.maps, vec![MapId(501), MapId(502)]);
        let restored = mm.get_map(MapId(502)).unwrap();
        assert_eq!(restored.properties().get_bool("lights"), Some(true));
        assert!(restored.properties().get("loc_id").is_none());
        assert_eq!(mm.get_map(MapId(501)).unwrap().npcs_count(), 0);
        assert!(mm.new_critter_id().0 > 502);
    }

    #[test]
    fn restore_rejects_duplicates_and_orphans() {
        let mut mm = manager();
        let doc = Document::new()
            .with("world_x", DocValue::Int(1))
            .with("world_y", DocValue::Int(1));
        mm.restore_location(LocationId(1), TOWN, &doc).unwrap();
        assert_eq!(
            mm.restore_location(LocationId(1), TOWN, &doc).unwrap_err(),
            ContentError::DuplicateId { id: 1 }
        );
        let orphan = Document::new().with("loc_id", DocValue::Int(77));
        assert_eq!(
            mm.restore_map(MapId(2), CELLAR, &orphan).unwrap_err(),
            ContentError::LocationNotFound {
                location: LocationId(77)
            }
        );
    }

    // ── Regeneration ────────────────────────────────────────────

    #[test]
    fn regenerate_replaces_npcs_and_keeps_players() {
        let mut mm = manager();
        let loc = mm.create_location(TOWN, 0, 0).unwrap();
        let street = mm.get_location(loc).unwrap().maps[0];
        let old_npc = mm.get_map(street).unwrap().npcs().next().unwrap().id;
        let player = Critter::player(CritterId(900), ProtoId(1));
        mm.add_cr_to_map(player, Some(street), HexPos::new(10, 10), 0)
            .unwrap();
        mm.set_map_property(street, "weather", DocValue::Int(3));

        mm.regenerate_map(street).unwrap();

        let map = mm.get_map(street).unwrap();
        assert_eq!(map.npcs_count(), 1);
        assert_ne!(map.npcs().next().unwrap().id, old_npc);
        assert_eq!(mm.whereabouts(old_npc), None);
        assert_eq!(map.get_critter(CritterId(900)).map(|c| c.hex), Some(HexPos::new(10, 10)));
        assert_eq!(map.properties().get_int("weather"), Some(3));
        assert_eq!(map.items().count(), 1);
    }

    // ── Deletion ────────────────────────────────────────────────

    #[test]
    fn delete_location_kicks_players() {
        let mut mm = manager();
        let loc = mm.create_location(TOWN, 70, 80).unwrap();
        let street = mm.get_location(loc).unwrap().maps[0];
        mm.add_cr_to_map(Critter::player(CritterId(900), ProtoId(1)), Some(street), HexPos::new(2, 2), 0)
            .unwrap();

        let kicked = mm.delete_location(loc).unwrap();
        assert_eq!(kicked, vec![CritterId(900)]);
        assert_eq!(mm.whereabouts(CritterId(900)), Some(None));
        assert_eq!(mm.get_critter(CritterId(900)).unwrap().world_pos, (70, 80));
        assert_eq!(mm.maps_count(), 0);
        assert_eq!(mm.locations_count(), 0);
        assert!(mm.delete_location(loc).is_none());
    }

    #[test]
    fn garbager_honours_lifetime_and_auto_garbage() {
        let mut mm = manager();
        mm.register_location_proto(LocationProto::new(ProtoId(200), [CELLAR]).with_lifetime(1_000));
        mm.register_location_proto(LocationProto::new(ProtoId(201), [CELLAR]).auto_garbage());
        let timed = mm.create_location(ProtoId(200), 0, 0).unwrap();
        let auto = mm.create_location(ProtoId(201), 0, 0).unwrap();
        let permanent = mm.create_location(TOWN, 0, 0).unwrap();

        let auto_map = mm.get_location(auto).unwrap().maps[0];
        mm.add_cr_to_map(Critter::player(CritterId(900), ProtoId(1)), Some(auto_map), HexPos::new(1, 1), 0)
            .unwrap();

        assert!(mm.location_garbager(500).is_empty());
        assert_eq!(mm.location_garbager(1_000), vec![timed]);

        mm.transit_to_global(CritterId(900), false).unwrap();
        assert_eq!(mm.location_garbager(1_001), vec![auto]);
        assert!(mm.get_location(permanent).is_some());
    }

    #[test]
    fn garbager_advances_the_clock_for_later_locations() {
        let mut mm = manager();
        mm.register_location_proto(LocationProto::new(ProtoId(200), [CELLAR]).with_lifetime(500));
        assert!(mm.location_garbager(1_000).is_empty());
        assert_eq!(mm.now_ms(), 1_000);

        let timed = mm.create_location(ProtoId(200), 0, 0).unwrap();
        assert_eq!(mm.get_location(timed).unwrap().expires_at, Some(1_500));
        assert!(mm.location_garbager(1_499).is_empty());
        assert_eq!(mm.location_garbager(1_500), vec![timed]);
    }
}
