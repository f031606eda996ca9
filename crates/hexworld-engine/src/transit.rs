//! Moving critters between maps and the global map.
//!
//! A transit is the one multi-step mutation in the engine: the critter
//! leaves its container, then enters the destination. Cheap checks run
//! first; if the placement itself is refused the critter is put back
//! exactly where it stood, so it is never in zero or two containers.
//!
//! Followers (critters whose `leader_id` names the mover) are dragged
//! along afterwards. A follower that does not fit stays behind; its
//! failure never undoes the leader's move.

use hexworld_core::{CritterId, HexPos, MapId};
use hexworld_map::{Critter, PlaceError};
use tracing::{debug, warn};

use crate::error::TransitError;
use crate::manager::MapManager;

impl MapManager {
    /// Hex arrivals without an explicit destination are placed near.
    pub fn get_map_work_hex(&self, map: MapId) -> Option<HexPos> {
        let pid = self.maps.get(&map)?.pid();
        self.map_protos.get(&pid).map(|p| p.work_hex)
    }

    /// Move a critter onto `to`, at `hex` or the nearest free hex within
    /// `radius`. Works within one map as well. Returns the hex taken.
    pub fn transit(
        &mut self,
        id: CritterId,
        to: MapId,
        hex: HexPos,
        dir: u8,
        radius: u32,
        force: bool,
    ) -> Result<HexPos, TransitError> {
        let from = self.whereabouts(id).ok_or(TransitError::CritterNotFound { critter: id })?;
        let placed = self.transit_one(id, to, hex, dir, radius, force)?;
        self.drag_followers(id, from, Some(to), placed, dir);
        Ok(placed)
    }

    /// Move a critter off its map onto the global map, at the world
    /// position of the map's location. A critter already on the global
    /// map stays put.
    ///
    /// Unless `force` is set, a locked critter refuses, and a follower
    /// may only go once its leader is on the global map.
    pub fn transit_to_global(&mut self, id: CritterId, force: bool) -> Result<(), TransitError> {
        let from = self.whereabouts(id).ok_or(TransitError::CritterNotFound { critter: id })?;
        if from.is_none() {
            return Ok(());
        }
        self.transit_to_global_one(id, force)?;
        self.drag_followers(id, from, None, HexPos::default(), 0);
        Ok(())
    }

    fn check_mover(&self, id: CritterId, force: bool) -> Result<&Critter, TransitError> {
        let cr = self
            .get_critter(id)
            .ok_or(TransitError::CritterNotFound { critter: id })?;
        if cr.transit_locked && !force {
            return Err(TransitError::Locked { critter: id });
        }
        if cr.multihex > self.config.critters.max_multihex {
            return Err(TransitError::MultihexTooLarge {
                critter: id,
                multihex: cr.multihex,
            });
        }
        Ok(cr)
    }

    fn transit_one(
        &mut self,
        id: CritterId,
        to: MapId,
        hex: HexPos,
        dir: u8,
        radius: u32,
        force: bool,
    ) -> Result<HexPos, TransitError> {
        self.check_mover(id, force)?;
        let from = self.whereabouts(id).ok_or(TransitError::CritterNotFound { critter: id })?;
        let map = self.maps.get(&to).ok_or(TransitError::MapNotFound { map: to })?;
        if !map.in_range(hex) {
            return Err(PlaceError::OutOfRange { hex }.into());
        }
        let limit = self.config.critters.max_per_map;
        if from != Some(to) && map.critters_count() >= limit {
            return Err(PlaceError::MapFull { map: to, limit }.into());
        }

        let (cr, _) = self.take_critter(id);
        let (old_hex, old_dir) = (cr.hex, cr.dir);
        match self.place_on(cr, to, hex, dir, radius) {
            Ok(placed) => {
                self.whereabouts.insert(id, Some(to));
                if from != Some(to) {
                    if let Some(cr) = self.get_critter_mut(id) {
                        cr.visible_critters.clear();
                        cr.visible_items.clear();
                    }
                    self.events.critter_transited(id, from, Some(to));
                }
                debug!(critter = %id, from = ?from, to = %to, hex = %placed, "critter transited");
                Ok(placed)
            }
            Err((mut cr, error)) => {
                cr.hex = old_hex;
                cr.dir = old_dir;
                self.put_back(cr, from);
                warn!(critter = %id, to = %to, %error, "transit refused, critter restored");
                Err(error)
            }
        }
    }

    fn place_on(
        &mut self,
        mut cr: Critter,
        to: MapId,
        hex: HexPos,
        dir: u8,
        radius: u32,
    ) -> Result<HexPos, (Critter, TransitError)> {
        let Some(map) = self.maps.get_mut(&to) else {
            return Err((cr, TransitError::MapNotFound { map: to }));
        };
        let Some(found) = map.find_start_hex(hex, cr.footprint_radius(), radius, false) else {
            let error = PlaceError::NoFreeHex {
                hex,
                seek_radius: radius,
            };
            return Err((cr, error.into()));
        };
        cr.hex = found;
        cr.dir = dir;
        map.try_add_critter(cr).map_err(|rejected| {
            let rejected = *rejected;
            (rejected.entity, TransitError::from(rejected.error))
        })?;
        Ok(found)
    }

    /// Reinsert a critter where [`take_critter`](Self::take_critter) found it.
    fn put_back(&mut self, cr: Critter, from: Option<MapId>) {
        let id = cr.id;
        match from {
            Some(map) => self
                .maps
                .get_mut(&map)
                .unwrap_or_else(|| panic!("critter {id} came from missing map {map}"))
                .add_critter(cr),
            None => {
                self.global.insert(id, cr);
            }
        }
        self.whereabouts.insert(id, from);
    }

    fn transit_to_global_one(&mut self, id: CritterId, force: bool) -> Result<(), TransitError> {
        let leader = self.check_mover(id, force)?.leader_id;
        if !force {
            if let Some(leader) = leader.filter(|l| *l != id) {
                if self.whereabouts(leader) != Some(None) {
                    return Err(PlaceError::LeaderMissing { leader }.into());
                }
            }
        }
        let world_pos = self.world_pos_of(self.whereabouts(id).flatten());
        let (mut cr, from) = self.take_critter(id);
        cr.world_pos = world_pos;
        cr.visible_critters.clear();
        cr.visible_items.clear();
        self.global.insert(id, cr);
        self.whereabouts.insert(id, None);
        self.events.critter_transited(id, from, None);
        debug!(critter = %id, from = ?from, "critter left for the global map");
        Ok(())
    }

    fn drag_followers(
        &mut self,
        leader: CritterId,
        from: Option<MapId>,
        to: Option<MapId>,
        near: HexPos,
        dir: u8,
    ) {
        let is_follower = |c: &&Critter| c.leader_id == Some(leader) && c.id != leader && !c.is_dead();
        let followers: Vec<CritterId> = match from {
            Some(map) => self
                .maps
                .get(&map)
                .map(|m| m.critters().filter(is_follower).map(|c| c.id).collect())
                .unwrap_or_default(),
            None => self.global.values().filter(is_follower).map(|c| c.id).collect(),
        };
        let seek = self.config.critters.seek_radius;
        for follower in followers {
            let result = match to {
                Some(map) => self
                    .transit_one(follower, map, near, dir, seek, false)
                    .map(|_| ()),
                None => self.transit_to_global_one(follower, false),
            };
            if let Err(error) = result {
                debug!(%leader, %follower, %error, "follower left behind");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use hexworld_core::{NullEvents, ProtoId};
    use hexworld_map::{ItemProto, MapProto, StaticItem};

    fn manager() -> (MapManager, MapId, MapId) {
        let mut mm = MapManager::new(EngineConfig::default(), Box::new(NullEvents)).unwrap();
        mm.register_map_proto(MapProto::new(ProtoId(1), 16, 16));
        let mut walled = MapProto::new(ProtoId(2), 16, 16);
        for x in 0..16 {
            for y in 0..16 {
                if (x, y) != (8, 8) {
                    walled.static_items.push(StaticItem {
                        hex: HexPos::new(x, y),
                        proto: ItemProto::new(ProtoId(3)).blocking(),
                    });
                }
            }
        }
        mm.register_map_proto(walled);
        let open = mm.create_map(ProtoId(1), None).unwrap();
        let cell = mm.create_map(ProtoId(2), None).unwrap();
        (mm, open, cell)
    }

    fn pc(id: u32) -> Critter {
        Critter::player(CritterId(id), ProtoId(9))
    }

    // ── Transit ─────────────────────────────────────────────────

    #[test]
    fn global_to_map_and_back() {
        let (mut mm, open, _) = manager();
        mm.add_cr_to_map(pc(1), None, HexPos::default(), 0).unwrap();
        let hex = mm.transit(CritterId(1), open, HexPos::new(4, 4), 3, 0, false).unwrap();
        assert_eq!(hex, HexPos::new(4, 4));
        assert_eq!(mm.whereabouts(CritterId(1)), Some(Some(open)));
        let cr = mm.get_critter(CritterId(1)).unwrap();
        assert_eq!((cr.hex, cr.dir, cr.map_id), (HexPos::new(4, 4), 3, Some(open)));

        mm.transit_to_global(CritterId(1), false).unwrap();
        assert_eq!(mm.whereabouts(CritterId(1)), Some(None));
        assert!(mm.get_map(open).unwrap().get_critter(CritterId(1)).is_none());
    }

    #[test]
    fn occupied_hex_shifts_within_radius() {
        let (mut mm, open, _) = manager();
        mm.add_cr_to_map(pc(1), Some(open), HexPos::new(4, 4), 0).unwrap();
        mm.add_cr_to_map(pc(2), None, HexPos::default(), 0).unwrap();
        let hex = mm.transit(CritterId(2), open, HexPos::new(4, 4), 0, 1, false).unwrap();
        assert_eq!(mm.geometry().distance(hex, HexPos::new(4, 4)), 1);
    }

    #[test]
    fn move_within_one_map() {
        let (mut mm, open, _) = manager();
        mm.add_cr_to_map(pc(1), Some(open), HexPos::new(4, 4), 0).unwrap();
        let hex = mm.transit(CritterId(1), open, HexPos::new(4, 5), 2, 0, false).unwrap();
        assert_eq!(hex, HexPos::new(4, 5));
        let map = mm.get_map(open).unwrap();
        assert!(!map.is_hex_critter(HexPos::new(4, 4)));
        assert!(map.is_hex_critter(HexPos::new(4, 5)));
    }

    #[test]
    fn refused_transit_restores_the_critter() {
        let (mut mm, open, cell) = manager();
        mm.add_cr_to_map(pc(1), Some(open), HexPos::new(4, 4), 5).unwrap();
        mm.add_cr_to_map(pc(2), Some(cell), HexPos::new(8, 8), 0).unwrap();

        let err = mm
            .transit(CritterId(1), cell, HexPos::new(8, 8), 0, 2, false)
            .unwrap_err();
        assert_eq!(
            err,
            TransitError::Place(PlaceError::NoFreeHex {
                hex: HexPos::new(8, 8),
                seek_radius: 2
            })
        );
        assert_eq!(mm.whereabouts(CritterId(1)), Some(Some(open)));
        let cr = mm.get_map(open).unwrap().get_critter(CritterId(1)).unwrap();
        assert_eq!((cr.hex, cr.dir), (HexPos::new(4, 4), 5));
        assert!(mm.get_map(cell).unwrap().get_critter(CritterId(1)).is_none());
        assert!(mm.get_map(open).unwrap().is_hex_critter(HexPos::new(4, 4)));
    }

    #[test]
    fn cheap_refusals() {
        let (mut mm, open, _) = manager();
        let mut locked = pc(1);
        locked.transit_locked = true;
        mm.add_cr_to_map(locked, None, HexPos::default(), 0).unwrap();

        assert_eq!(
            mm.transit(CritterId(1), open, HexPos::new(1, 1), 0, 0, false),
            Err(TransitError::Locked {
                critter: CritterId(1)
            })
        );
        assert!(mm.transit(CritterId(1), open, HexPos::new(1, 1), 0, 0, true).is_ok());
        assert_eq!(
            mm.transit(CritterId(1), MapId(999), HexPos::new(1, 1), 0, 0, true),
            Err(TransitError::MapNotFound { map: MapId(999) })
        );
        assert_eq!(
            mm.transit(CritterId(1), open, HexPos::new(40, 1), 0, 0, true),
            Err(TransitError::Place(PlaceError::OutOfRange {
                hex: HexPos::new(40, 1)
            }))
        );
        assert_eq!(
            mm.transit(CritterId(42), open, HexPos::new(1, 1), 0, 0, false),
            Err(TransitError::CritterNotFound {
                critter: CritterId(42)
            })
        );
        assert_eq!(mm.whereabouts(CritterId(1)), Some(Some(open)));
    }

    #[test]
    fn full_map_refuses_newcomers() {
        let mut cfg = EngineConfig::default();
        cfg.critters.max_per_map = 1;
        let mut mm = MapManager::new(cfg, Box::new(NullEvents)).unwrap();
        mm.register_map_proto(MapProto::new(ProtoId(1), 8, 8));
        let map = mm.create_map(ProtoId(1), None).unwrap();
        mm.add_cr_to_map(pc(1), Some(map), HexPos::new(1, 1), 0).unwrap();
        mm.add_cr_to_map(pc(2), None, HexPos::default(), 0).unwrap();

        assert_eq!(
            mm.transit(CritterId(2), map, HexPos::new(5, 5), 0, 0, false),
            Err(TransitError::Place(PlaceError::MapFull { map, limit: 1 }))
        );
        assert_eq!(mm.whereabouts(CritterId(2)), Some(None));
        // moving inside the full map is still allowed
        assert!(mm.transit(CritterId(1), map, HexPos::new(2, 2), 0, 0, false).is_ok());
    }

    // ── Followers ───────────────────────────────────────────────

    #[test]
    fn followers_are_dragged_to_a_map() {
        let (mut mm, open, _) = manager();
        mm.add_cr_to_map(pc(1), None, HexPos::default(), 0).unwrap();
        mm.add_cr_to_map(pc(2).following(CritterId(1)), None, HexPos::default(), 0)
            .unwrap();
        mm.add_cr_to_map(pc(3).following(CritterId(1)), None, HexPos::default(), 0)
            .unwrap();

        let hex = mm.transit(CritterId(1), open, HexPos::new(8, 8), 0, 0, false).unwrap();
        for f in [2, 3] {
            assert_eq!(mm.whereabouts(CritterId(f)), Some(Some(open)));
            let at = mm.get_critter(CritterId(f)).unwrap().hex;
            assert!(mm.geometry().distance(at, hex) <= mm.config().critters.seek_radius);
        }
    }

    #[test]
    fn follower_failure_keeps_the_leader_moved() {
        let (mut mm, _, cell) = manager();
        mm.add_cr_to_map(pc(1), None, HexPos::default(), 0).unwrap();
        mm.add_cr_to_map(pc(2).following(CritterId(1)), None, HexPos::default(), 0)
            .unwrap();

        mm.transit(CritterId(1), cell, HexPos::new(8, 8), 0, 0, false).unwrap();
        assert_eq!(mm.whereabouts(CritterId(1)), Some(Some(cell)));
        assert_eq!(mm.whereabouts(CritterId(2)), Some(None));
    }

    #[test]
    fn follower_waits_for_leader_on_global() {
        let (mut mm, open, _) = manager();
        mm.add_cr_to_map(pc(1), Some(open), HexPos::new(2, 2), 0).unwrap();
        mm.add_cr_to_map(pc(2).following(CritterId(1)), Some(open), HexPos::new(2, 3), 0)
            .unwrap();

        assert_eq!(
            mm.transit_to_global(CritterId(2), false),
            Err(TransitError::Place(PlaceError::LeaderMissing {
                leader: CritterId(1)
            }))
        );
        mm.transit_to_global(CritterId(1), false).unwrap();
        assert_eq!(mm.whereabouts(CritterId(2)), Some(None));
    }

    #[test]
    fn work_hex_defaults_to_centre() {
        let (mm, open, _) = manager();
        assert_eq!(mm.get_map_work_hex(open), Some(HexPos::new(8, 8)));
        assert_eq!(mm.get_map_work_hex(MapId(999)), None);
    }
}
