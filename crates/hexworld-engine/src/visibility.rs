//! Field-of-view bookkeeping, map effects and known locations.
//!
//! A critter sees every other critter and every non-hidden item on its
//! map within its look distance. The manager keeps each critter's last
//! view and reports only the differences.

use hexworld_core::{CritterId, HexPos, ItemId, LocationId, MapId, ProtoId};
use indexmap::IndexSet;
use smallvec::SmallVec;

use crate::manager::MapManager;

/// Diff of a recomputed view against the stored one.
struct ViewDiff<T> {
    appeared: SmallVec<[T; 8]>,
    disappeared: SmallVec<[T; 8]>,
}

fn diff<T: Copy + Eq + std::hash::Hash>(old: &IndexSet<T>, new: &IndexSet<T>) -> ViewDiff<T> {
    ViewDiff {
        appeared: new.iter().filter(|t| !old.contains(*t)).copied().collect(),
        disappeared: old.iter().filter(|t| !new.contains(*t)).copied().collect(),
    }
}

impl MapManager {
    // ── Field of view ───────────────────────────────────────────

    fn viewer_on_map(&self, viewer: CritterId) -> Option<(MapId, HexPos, u32)> {
        let map = self.whereabouts(viewer)??;
        let cr = self.maps.get(&map)?.get_critter(viewer)?;
        Some((map, cr.hex, cr.look_distance))
    }

    /// Recompute which critters `viewer` sees, emitting
    /// `critter_appeared` / `critter_disappeared` for the changes.
    ///
    /// A viewer on the global map sees nobody; its stale view is dropped
    /// silently. Unknown viewers are ignored.
    pub fn process_visible_critters(&mut self, viewer: CritterId) {
        let now: IndexSet<CritterId> = match self.viewer_on_map(viewer) {
            Some((map, hex, look)) => self.maps[&map]
                .critters()
                .filter(|c| c.id != viewer)
                .filter(|c| self.geom.distance(hex, c.hex) <= look + c.footprint_radius())
                .map(|c| c.id)
                .collect(),
            None => IndexSet::new(),
        };
        let on_map = matches!(self.whereabouts(viewer), Some(Some(_)));
        let Some(cr) = self.get_critter_mut(viewer) else {
            return;
        };
        let changes = diff(&cr.visible_critters, &now);
        cr.visible_critters = now;
        if !on_map {
            return;
        }
        for target in changes.disappeared {
            self.events.critter_disappeared(viewer, target);
        }
        for target in changes.appeared {
            self.events.critter_appeared(viewer, target);
        }
    }

    /// Recompute which items `viewer` sees, emitting `item_appeared` /
    /// `item_disappeared` for the changes. Hidden items are never seen.
    pub fn process_visible_items(&mut self, viewer: CritterId) {
        let now: IndexSet<ItemId> = match self.viewer_on_map(viewer) {
            Some((map, hex, look)) => self.maps[&map]
                .items()
                .filter(|i| !i.proto.hidden && self.geom.distance(hex, i.hex) <= look)
                .map(|i| i.id)
                .collect(),
            None => IndexSet::new(),
        };
        let on_map = matches!(self.whereabouts(viewer), Some(Some(_)));
        let Some(cr) = self.get_critter_mut(viewer) else {
            return;
        };
        let changes = diff(&cr.visible_items, &now);
        cr.visible_items = now;
        if !on_map {
            return;
        }
        for item in changes.disappeared {
            self.events.item_disappeared(viewer, item);
        }
        for item in changes.appeared {
            self.events.item_appeared(viewer, item);
        }
    }

    // ── Effects ─────────────────────────────────────────────────

    /// Show an effect of `radius` at `hex` to every critter on `map` whose
    /// look distance reaches its edge. Returns how many were told.
    pub fn send_effect(&mut self, map: MapId, effect: ProtoId, hex: HexPos, radius: u16) -> usize {
        let Some(rm) = self.maps.get(&map) else {
            return 0;
        };
        let viewers: SmallVec<[CritterId; 16]> = rm
            .critters()
            .filter(|c| self.geom.distance(c.hex, hex) <= c.look_distance + u32::from(radius))
            .map(|c| c.id)
            .collect();
        for &viewer in &viewers {
            self.events.effect(viewer, effect, hex, radius);
        }
        viewers.len()
    }

    /// Show a projectile flying `from` → `to` to every critter on `map`
    /// that sees either end. Returns how many were told.
    pub fn send_fly_effect(
        &mut self,
        map: MapId,
        effect: ProtoId,
        from_critter: Option<CritterId>,
        to_critter: Option<CritterId>,
        from: HexPos,
        to: HexPos,
    ) -> usize {
        let Some(rm) = self.maps.get(&map) else {
            return 0;
        };
        let viewers: SmallVec<[CritterId; 16]> = rm
            .critters()
            .filter(|c| {
                self.geom.distance(c.hex, from) <= c.look_distance
                    || self.geom.distance(c.hex, to) <= c.look_distance
            })
            .map(|c| c.id)
            .collect();
        for &viewer in &viewers {
            self.events
                .fly_effect(viewer, effect, from_critter, to_critter, from, to);
        }
        viewers.len()
    }

    // ── Known locations ─────────────────────────────────────────

    /// Whether `critter` knows location `loc`.
    pub fn check_known_loc_by_id(&self, critter: CritterId, loc: LocationId) -> bool {
        self.get_critter(critter)
            .is_some_and(|c| c.known_locations.contains(&loc))
    }

    /// Whether `critter` knows any live location of prototype `pid`.
    pub fn check_known_loc_by_pid(&self, critter: CritterId, pid: ProtoId) -> bool {
        let Some(cr) = self.get_critter(critter) else {
            return false;
        };
        cr.known_locations
            .iter()
            .filter_map(|id| self.locations.get(id))
            .any(|l| l.pid == pid)
    }

    /// Teach `critter` an existing location. Returns `false` if either is
    /// unknown or the location was already known.
    pub fn add_known_loc(&mut self, critter: CritterId, loc: LocationId) -> bool {
        if !self.locations.contains_key(&loc) {
            return false;
        }
        self.get_critter_mut(critter)
            .is_some_and(|c| c.known_locations.insert(loc))
    }

    /// Make `critter` forget a location. Returns whether it was known.
    pub fn erase_known_loc(&mut self, critter: CritterId, loc: LocationId) -> bool {
        self.get_critter_mut(critter)
            .is_some_and(|c| c.known_locations.shift_remove(&loc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::location::LocationProto;
    use hexworld_map::{Critter, Item, ItemProto, MapProto};
    use hexworld_test_utils::{Event, RecordingEvents};

    fn manager() -> (MapManager, RecordingEvents, MapId) {
        let rec = RecordingEvents::new();
        let mut mm = MapManager::new(EngineConfig::default(), Box::new(rec.clone())).unwrap();
        mm.register_map_proto(MapProto::new(ProtoId(1), 40, 40));
        let map = mm.create_map(ProtoId(1), None).unwrap();
        (mm, rec, map)
    }

    fn put(mm: &mut MapManager, id: u32, map: MapId, x: u16, y: u16, look: u32) {
        let cr = Critter::player(CritterId(id), ProtoId(9)).with_look(look);
        mm.add_cr_to_map(cr, Some(map), HexPos::new(x, y), 0).unwrap();
    }

    // ── Critters ────────────────────────────────────────────────

    #[test]
    fn critters_appear_and_disappear() {
        let (mut mm, rec, map) = manager();
        put(&mut mm, 1, map, 5, 5, 3);
        put(&mut mm, 2, map, 5, 7, 3);
        put(&mut mm, 3, map, 30, 30, 3);

        mm.process_visible_critters(CritterId(1));
        assert_eq!(
            rec.take(),
            vec![Event::CritterAppeared {
                viewer: CritterId(1),
                target: CritterId(2)
            }]
        );

        // no change, no events
        mm.process_visible_critters(CritterId(1));
        assert!(rec.take().is_empty());

        mm.transit(CritterId(2), map, HexPos::new(20, 20), 0, 0, false)
            .unwrap();
        rec.take();
        mm.process_visible_critters(CritterId(1));
        assert_eq!(
            rec.take(),
            vec![Event::CritterDisappeared {
                viewer: CritterId(1),
                target: CritterId(2)
            }]
        );
        assert!(mm.get_critter(CritterId(1)).unwrap().visible_critters.is_empty());
    }

    #[test]
    fn large_footprints_are_seen_from_further() {
        let (mut mm, _, map) = manager();
        put(&mut mm, 1, map, 5, 5, 3);
        let big = Critter::npc(CritterId(2), ProtoId(9), 0).with_multihex(1);
        mm.add_cr_to_map(big, Some(map), HexPos::new(5, 9), 0).unwrap();
        mm.process_visible_critters(CritterId(1));
        assert!(mm
            .get_critter(CritterId(1))
            .unwrap()
            .visible_critters
            .contains(&CritterId(2)));
    }

    #[test]
    fn global_viewer_forgets_quietly() {
        let (mut mm, rec, map) = manager();
        put(&mut mm, 1, map, 5, 5, 3);
        put(&mut mm, 2, map, 5, 6, 3);
        mm.process_visible_critters(CritterId(1));
        mm.transit_to_global(CritterId(1), false).unwrap();
        rec.take();

        mm.process_visible_critters(CritterId(1));
        assert!(rec.take().is_empty());
        assert!(mm.get_critter(CritterId(1)).unwrap().visible_critters.is_empty());
        // unknown viewers are ignored
        mm.process_visible_critters(CritterId(77));
    }

    // ── Items ───────────────────────────────────────────────────

    #[test]
    fn hidden_items_stay_unseen() {
        let (mut mm, rec, map) = manager();
        put(&mut mm, 1, map, 5, 5, 3);
        let rm = mm.get_map_mut(map).unwrap();
        rm.add_item(Item::new(ItemId(500), ItemProto::new(ProtoId(4))), HexPos::new(5, 6))
            .unwrap();
        rm.add_item(
            Item::new(ItemId(501), ItemProto::new(ProtoId(4)).hidden()),
            HexPos::new(5, 6),
        )
        .unwrap();

        mm.process_visible_items(CritterId(1));
        assert_eq!(
            rec.take(),
            vec![Event::ItemAppeared {
                viewer: CritterId(1),
                item: ItemId(500)
            }]
        );

        mm.get_map_mut(map).unwrap().erase_item(ItemId(500));
        mm.process_visible_items(CritterId(1));
        assert_eq!(
            rec.take(),
            vec![Event::ItemDisappeared {
                viewer: CritterId(1),
                item: ItemId(500)
            }]
        );
    }

    // ── Effects ─────────────────────────────────────────────────

    #[test]
    fn effects_reach_viewers_in_range() {
        let (mut mm, rec, map) = manager();
        put(&mut mm, 1, map, 5, 5, 3);
        put(&mut mm, 2, map, 30, 30, 3);

        assert_eq!(mm.send_effect(map, ProtoId(7), HexPos::new(5, 10), 2), 1);
        assert_eq!(
            rec.take(),
            vec![Event::Effect {
                viewer: CritterId(1),
                effect: ProtoId(7),
                hex: HexPos::new(5, 10),
                radius: 2
            }]
        );

        let told = mm.send_fly_effect(
            map,
            ProtoId(8),
            Some(CritterId(1)),
            Some(CritterId(2)),
            HexPos::new(5, 5),
            HexPos::new(30, 30),
        );
        assert_eq!(told, 2);
        assert_eq!(mm.send_effect(MapId(999), ProtoId(7), HexPos::new(0, 0), 0), 0);
    }

    // ── Known locations ─────────────────────────────────────────

    #[test]
    fn known_locations() {
        let (mut mm, _, map) = manager();
        put(&mut mm, 1, map, 5, 5, 3);
        mm.register_location_proto(LocationProto::new(ProtoId(20), vec![ProtoId(1)]));
        let loc = mm.create_location(ProtoId(20), 10, 10).unwrap();

        assert!(!mm.check_known_loc_by_id(CritterId(1), loc));
        assert!(mm.add_known_loc(CritterId(1), loc));
        assert!(!mm.add_known_loc(CritterId(1), loc));
        assert!(!mm.add_known_loc(CritterId(1), LocationId(999)));
        assert!(mm.check_known_loc_by_id(CritterId(1), loc));
        assert!(mm.check_known_loc_by_pid(CritterId(1), ProtoId(20)));
        assert!(!mm.check_known_loc_by_pid(CritterId(1), ProtoId(21)));

        assert!(mm.erase_known_loc(CritterId(1), loc));
        assert!(!mm.erase_known_loc(CritterId(1), loc));
        assert!(!mm.check_known_loc_by_pid(CritterId(1), ProtoId(20)));
    }
}
