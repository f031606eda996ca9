//! A live map instance: entity indexes plus the dynamic flag overlay.
//!
//! [`RuntimeMap`] is the single source of truth for "can something stand,
//! walk or shoot through this hex right now". Every mutation updates the
//! entity index and the overlay together, so no caller can observe the
//! two disagreeing. Misuse (out-of-range hexes, erasing an entity that is
//! not on the map, unbalanced flag unsets) panics.

use std::sync::Arc;

use hexworld_core::{CritterId, DocValue, Document, HexPos, ItemId, LocationId, MapId, ProtoId};
use hexworld_space::HexGeometry;
use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::debug;

use crate::entity::{Critter, CritterCondition, FindType, Item, ItemProto};
use crate::error::{PlaceError, Rejected};
use crate::flags::{FlagOverlay, HexFlags};
use crate::static_map::{StaticItem, StaticMapData};
use crate::timers::{LoopTimers, LOOP_COUNT};

type HexIndex<T> = IndexMap<HexPos, SmallVec<[T; 2]>>;

/// Centre, covered radius and dead flag: everything a critter's flags
/// depend on.
type Placement = (HexPos, u32, bool);

fn placement(cr: &Critter) -> Placement {
    (cr.hex, cr.footprint_radius(), cr.is_dead())
}

/// A live instance of a map prototype.
#[derive(Debug)]
pub struct RuntimeMap {
    id: MapId,
    location: Option<LocationId>,
    loc_map_index: u32,
    static_data: Arc<StaticMapData>,
    geom: HexGeometry,
    overlay: FlagOverlay,
    critters: IndexMap<CritterId, Critter>,
    critters_by_hex: HexIndex<CritterId>,
    items: IndexMap<ItemId, Item>,
    items_by_hex: HexIndex<ItemId>,
    triggers_by_hex: HexIndex<ItemId>,
    block_lines_by_hex: HexIndex<ItemId>,
    loops: LoopTimers,
    properties: Document,
}

impl RuntimeMap {
    /// An empty instance over shared static data.
    pub fn new(id: MapId, static_data: Arc<StaticMapData>, geom: HexGeometry) -> Self {
        let overlay = FlagOverlay::new(static_data.base_flags());
        Self {
            id,
            location: None,
            loc_map_index: 0,
            static_data,
            geom,
            overlay,
            critters: IndexMap::new(),
            critters_by_hex: IndexMap::new(),
            items: IndexMap::new(),
            items_by_hex: IndexMap::new(),
            triggers_by_hex: IndexMap::new(),
            block_lines_by_hex: IndexMap::new(),
            loops: LoopTimers::default(),
            properties: Document::new(),
        }
    }

    // ── Identity ────────────────────────────────────────────────

    /// Map id.
    pub fn id(&self) -> MapId {
        self.id
    }

    /// Prototype id.
    pub fn pid(&self) -> ProtoId {
        self.static_data.pid()
    }

    /// Owning location.
    pub fn location(&self) -> Option<LocationId> {
        self.location
    }

    /// Index of this map within its location.
    pub fn loc_map_index(&self) -> u32 {
        self.loc_map_index
    }

    /// Bind the map to a location slot.
    pub fn set_location(&mut self, location: Option<LocationId>, index: u32) {
        self.location = location;
        self.loc_map_index = index;
    }

    /// Width in hexes.
    pub fn width(&self) -> u16 {
        self.static_data.width()
    }

    /// Height in hexes.
    pub fn height(&self) -> u16 {
        self.static_data.height()
    }

    /// Grid geometry.
    pub fn geometry(&self) -> HexGeometry {
        self.geom
    }

    /// Shared static snapshot.
    pub fn static_data(&self) -> &Arc<StaticMapData> {
        &self.static_data
    }

    /// Whether `hex` lies on the map.
    pub fn in_range(&self, hex: HexPos) -> bool {
        hex.in_bounds(self.width(), self.height())
    }

    /// Convert signed coordinates to an on-map hex.
    pub fn hex_at(&self, x: i32, y: i32) -> Option<HexPos> {
        HexPos::from_signed(x, y, self.width(), self.height())
    }

    fn index_of(&self, hex: HexPos) -> usize {
        assert!(
            self.in_range(hex),
            "hex {hex} outside {}x{} map {}",
            self.width(),
            self.height(),
            self.id
        );
        hex.index(self.width())
    }

    /// On-map hexes within `radius` of `hex`, centre first.
    pub fn hexes_around(&self, hex: HexPos, radius: u32) -> impl Iterator<Item = HexPos> + '_ {
        let (x, y) = hex.signed();
        self.geom
            .disk(x, y, radius)
            .into_iter()
            .filter_map(move |(hx, hy)| self.hex_at(hx, hy))
    }

    // ── Flags ───────────────────────────────────────────────────

    /// Effective flags of a hex.
    pub fn hex_flags(&self, hex: HexPos) -> HexFlags {
        self.overlay.get(self.index_of(hex))
    }

    /// Recompute a hex's effective flags from its base flags and the
    /// current contributor counts.
    pub fn recache_hex_flags(&mut self, hex: HexPos) -> HexFlags {
        let i = self.index_of(hex);
        let base = self.static_data.base_flags()[i];
        self.overlay.recache(i, base)
    }

    /// Add one contributor for each dynamic bit in `flag` and recache.
    pub fn set_hex_flag(&mut self, hex: HexPos, flag: HexFlags) {
        let i = self.index_of(hex);
        self.overlay.increment(i, flag);
        self.recache_hex_flags(hex);
    }

    /// Remove one contributor for each dynamic bit in `flag` and recache.
    ///
    /// # Panics
    ///
    /// Panics if a bit has no contributor to remove.
    pub fn unset_hex_flag(&mut self, hex: HexPos, flag: HexFlags) {
        let i = self.index_of(hex);
        self.overlay.decrement(i, flag);
        self.recache_hex_flags(hex);
    }

    /// Flags of a hex derived from scratch by scanning every entity on
    /// the map, bypassing the overlay. Slow; meant for verification.
    pub fn derive_hex_flags(&self, hex: HexPos) -> HexFlags {
        let mut flags = self.static_data.base_flags_at(hex);
        for cr in self.critters.values() {
            if cr.is_dead() {
                if cr.hex == hex {
                    flags |= HexFlags::DEAD_CRITTER;
                }
            } else if self.geom.distance(cr.hex, hex) <= cr.footprint_radius() {
                flags |= HexFlags::CRITTER;
            }
        }
        for item in self.items.values() {
            if item.hex == hex {
                flags |= item_flags(&item.proto);
            }
            if self.block_line_hexes(item.hex, &item.proto).contains(&hex) {
                flags |= block_line_flags(&item.proto);
            }
        }
        flags
    }

    /// Walkable: no static or dynamic blocker.
    pub fn is_hex_passed(&self, hex: HexPos) -> bool {
        !self.hex_flags(hex).intersects(HexFlags::NO_WAY)
    }

    /// Walkable once the bits in `ignore` are disregarded.
    pub fn is_hex_passed_ignoring(&self, hex: HexPos, ignore: HexFlags) -> bool {
        !(self.hex_flags(hex) & !ignore).intersects(HexFlags::NO_WAY)
    }

    /// Shots and sight pass through.
    pub fn is_hex_raked(&self, hex: HexPos) -> bool {
        !self.hex_flags(hex).intersects(HexFlags::NO_SHOOT)
    }

    /// Every hex within `radius` of `hex` is on the map and walkable.
    pub fn is_hexes_passed(&self, hex: HexPos, radius: u32) -> bool {
        let (x, y) = hex.signed();
        self.geom
            .disk(x, y, radius)
            .into_iter()
            .all(|(hx, hy)| self.hex_at(hx, hy).is_some_and(|h| self.is_hex_passed(h)))
    }

    /// Whether a footprint of `multihex` centred on `hex` can step in
    /// `dir`: every hex it would newly cover must be on the map and
    /// walkable.
    pub fn is_move_passed(&self, hex: HexPos, dir: u8, multihex: u32) -> bool {
        self.is_move_passed_ignoring(hex, dir, multihex, HexFlags::empty())
    }

    /// [`is_move_passed`](Self::is_move_passed) disregarding the bits in
    /// `ignore` (e.g. critters a path may step over).
    pub fn is_move_passed_ignoring(
        &self,
        hex: HexPos,
        dir: u8,
        multihex: u32,
        ignore: HexFlags,
    ) -> bool {
        let (x, y) = hex.signed();
        self.geom
            .newly_covered(x, y, dir, multihex)
            .into_iter()
            .all(|(hx, hy)| {
                self.hex_at(hx, hy)
                    .is_some_and(|h| self.is_hex_passed_ignoring(h, ignore))
            })
    }

    /// A dynamic trigger item lies on the hex.
    pub fn is_hex_trigger(&self, hex: HexPos) -> bool {
        self.hex_flags(hex).contains(HexFlags::TRIGGER_ITEM)
    }

    /// A critter (living or dead) marks the hex.
    pub fn is_hex_critter(&self, hex: HexPos) -> bool {
        self.hex_flags(hex)
            .intersects(HexFlags::CRITTER | HexFlags::DEAD_CRITTER)
    }

    /// A gag item reserves the hex.
    pub fn is_hex_gag(&self, hex: HexPos) -> bool {
        self.hex_flags(hex).contains(HexFlags::GAG_ITEM)
    }

    /// Trigger scenery lies on the hex.
    pub fn is_hex_static_trigger(&self, hex: HexPos) -> bool {
        self.hex_flags(hex).contains(HexFlags::SCEN_TRIGGER)
    }

    /// A living (`dead == false`) or dead critter marks the hex.
    pub fn is_flag_critter(&self, hex: HexPos, dead: bool) -> bool {
        let bit = if dead {
            HexFlags::DEAD_CRITTER
        } else {
            HexFlags::CRITTER
        };
        self.hex_flags(hex).contains(bit)
    }

    /// Mark a critter footprint: the whole disk for a standing critter,
    /// the centre only for a dead one.
    pub fn set_flag_critter(&mut self, hex: HexPos, multihex: u32, dead: bool) {
        if dead {
            self.set_hex_flag(hex, HexFlags::DEAD_CRITTER);
        } else {
            for h in self.hexes_around(hex, multihex).collect::<Vec<_>>() {
                self.set_hex_flag(h, HexFlags::CRITTER);
            }
        }
    }

    /// Revert [`set_flag_critter`](Self::set_flag_critter).
    pub fn unset_flag_critter(&mut self, hex: HexPos, multihex: u32, dead: bool) {
        if dead {
            self.unset_hex_flag(hex, HexFlags::DEAD_CRITTER);
        } else {
            for h in self.hexes_around(hex, multihex).collect::<Vec<_>>() {
                self.unset_hex_flag(h, HexFlags::CRITTER);
            }
        }
    }

    // ── Critters ────────────────────────────────────────────────

    fn index_critter(&mut self, id: CritterId, (hex, radius, dead): Placement) {
        self.set_flag_critter(hex, radius, dead);
        for h in self.hexes_around(hex, radius).collect::<Vec<_>>() {
            self.critters_by_hex.entry(h).or_default().push(id);
        }
    }

    fn unindex_critter(&mut self, id: CritterId, (hex, radius, dead): Placement) {
        self.unset_flag_critter(hex, radius, dead);
        for h in self.hexes_around(hex, radius).collect::<Vec<_>>() {
            remove_from_hex(&mut self.critters_by_hex, h, id);
        }
    }

    fn placement_of(&self, id: CritterId) -> Placement {
        let cr = self
            .critters
            .get(&id)
            .unwrap_or_else(|| panic!("critter {id} is not on map {}", self.id));
        placement(cr)
    }

    /// Check whether `cr` could be placed at its current hex.
    pub fn can_place_critter(&self, cr: &Critter) -> Result<(), PlaceError> {
        if self.critters.contains_key(&cr.id) {
            return Err(PlaceError::AlreadyOnMap { critter: cr.id });
        }
        if !self.in_range(cr.hex) {
            return Err(PlaceError::OutOfRange { hex: cr.hex });
        }
        let radius = cr.footprint_radius();
        if !cr.is_dead() && !self.is_hexes_passed(cr.hex, radius) {
            return Err(PlaceError::HexesBlocked {
                hex: cr.hex,
                radius,
            });
        }
        Ok(())
    }

    /// Place a critter at its current hex without passability checks.
    ///
    /// # Panics
    ///
    /// Panics if the critter is already on the map or its hex is off-map.
    pub fn add_critter(&mut self, mut cr: Critter) {
        assert!(
            !self.critters.contains_key(&cr.id),
            "critter {} already on map {}",
            cr.id,
            self.id
        );
        self.index_of(cr.hex);
        cr.map_id = Some(self.id);
        self.index_critter(cr.id, placement(&cr));
        debug!(map = %self.id, critter = %cr.id, hex = %cr.hex, "critter added");
        self.critters.insert(cr.id, cr);
    }

    /// Validate then place a critter, handing it back on rejection.
    pub fn try_add_critter(&mut self, cr: Critter) -> Result<(), Box<Rejected<Critter>>> {
        match self.can_place_critter(&cr) {
            Ok(()) => {
                self.add_critter(cr);
                Ok(())
            }
            Err(error) => Err(Box::new(Rejected::new(cr, error))),
        }
    }

    /// Remove a critter and revert its flags.
    ///
    /// # Panics
    ///
    /// Panics if the critter is not on this map.
    pub fn erase_critter(&mut self, id: CritterId) -> Critter {
        let mut cr = self
            .critters
            .shift_remove(&id)
            .unwrap_or_else(|| panic!("critter {id} is not on map {}", self.id));
        self.unindex_critter(id, placement(&cr));
        cr.map_id = None;
        debug!(map = %self.id, critter = %id, "critter erased");
        cr
    }

    /// Move a critter's centre to `to`, facing `dir`. Passability is the
    /// caller's concern (see [`is_move_passed`](Self::is_move_passed)).
    pub fn move_critter(&mut self, id: CritterId, to: HexPos, dir: u8) {
        self.index_of(to);
        let (hex, radius, dead) = self.placement_of(id);
        self.unindex_critter(id, (hex, radius, dead));
        if let Some(cr) = self.critters.get_mut(&id) {
            cr.hex = to;
            cr.dir = dir;
        }
        self.index_critter(id, (to, radius, dead));
    }

    /// Change a critter's condition, re-marking its footprint.
    pub fn set_critter_condition(&mut self, id: CritterId, condition: CritterCondition) {
        let old = self.placement_of(id);
        self.unindex_critter(id, old);
        let mut new = old;
        if let Some(cr) = self.critters.get_mut(&id) {
            cr.condition = condition;
            new = placement(cr);
        }
        self.index_critter(id, new);
    }

    /// Critter by id.
    pub fn get_critter(&self, id: CritterId) -> Option<&Critter> {
        self.critters.get(&id)
    }

    /// Mutable critter by id.
    ///
    /// Position, footprint and condition must be changed through
    /// [`move_critter`](Self::move_critter) and
    /// [`set_critter_condition`](Self::set_critter_condition), never
    /// through this reference.
    pub fn get_critter_mut(&mut self, id: CritterId) -> Option<&mut Critter> {
        self.critters.get_mut(&id)
    }

    /// Ids of critters marking `hex`, in arrival order.
    pub fn critter_ids_at(&self, hex: HexPos) -> &[CritterId] {
        self.critters_by_hex
            .get(&hex)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// A living (`dead == false`) or dead critter covering `hex`.
    pub fn get_hex_critter(&self, hex: HexPos, dead: bool) -> Option<&Critter> {
        self.critter_ids_at(hex)
            .iter()
            .filter_map(|id| self.critters.get(id))
            .find(|cr| cr.is_dead() == dead)
    }

    /// Critters whose footprint reaches within `radius` of `hex`.
    pub fn get_critters_hex(&self, hex: HexPos, radius: u32, find: FindType) -> Vec<&Critter> {
        self.critters
            .values()
            .filter(|cr| find.matches(cr))
            .filter(|cr| self.geom.distance(cr.hex, hex) <= radius + cr.footprint_radius())
            .collect()
    }

    /// All critters in arrival order.
    pub fn critters(&self) -> impl Iterator<Item = &Critter> + '_ {
        self.critters.values()
    }

    /// Player critters.
    pub fn players(&self) -> impl Iterator<Item = &Critter> + '_ {
        self.critters.values().filter(|c| c.is_player())
    }

    /// NPC critters.
    pub fn npcs(&self) -> impl Iterator<Item = &Critter> + '_ {
        self.critters.values().filter(|c| c.is_npc())
    }

    /// Number of critters.
    pub fn critters_count(&self) -> usize {
        self.critters.len()
    }

    /// Number of players.
    pub fn players_count(&self) -> usize {
        self.players().count()
    }

    /// Number of NPCs.
    pub fn npcs_count(&self) -> usize {
        self.npcs().count()
    }

    /// The `skip`-th NPC with `role` matching `find`.
    pub fn get_npc(&self, role: i32, find: FindType, skip: usize) -> Option<&Critter> {
        self.npcs()
            .filter(|c| c.npc_role() == Some(role) && find.matches(c))
            .nth(skip)
    }

    /// Number of NPCs with `role` matching `find`.
    pub fn get_npc_count(&self, role: i32, find: FindType) -> usize {
        self.npcs()
            .filter(|c| c.npc_role() == Some(role) && find.matches(c))
            .count()
    }

    /// First hex within `seek_radius` of `hex` (the hex itself first, then
    /// ring by ring) where a footprint of `multihex` fits. With
    /// `skip_unsafe`, trigger hexes are rejected.
    pub fn find_start_hex(
        &self,
        hex: HexPos,
        multihex: u32,
        seek_radius: u32,
        skip_unsafe: bool,
    ) -> Option<HexPos> {
        let fits = |h: HexPos| {
            self.is_hexes_passed(h, multihex)
                && !(skip_unsafe && (self.is_hex_trigger(h) || self.is_hex_static_trigger(h)))
        };
        if self.in_range(hex) && fits(hex) {
            return Some(hex);
        }
        let (x, y) = hex.signed();
        (1..=seek_radius)
            .flat_map(|k| self.geom.ring(x, y, k))
            .filter_map(|(hx, hy)| self.hex_at(hx, hy))
            .find(|&h| fits(h))
    }

    // ── Items ───────────────────────────────────────────────────

    fn block_line_hexes(&self, hex: HexPos, proto: &ItemProto) -> SmallVec<[HexPos; 8]> {
        let mut out = SmallVec::new();
        let mut cur = hex;
        for &(dir, len) in &proto.block_lines {
            for _ in 0..len {
                match self.geom.move_by_dir(cur, dir, self.width(), self.height()) {
                    Some(next) => {
                        cur = next;
                        out.push(next);
                    }
                    None => return out,
                }
            }
        }
        out
    }

    /// Mark the hexes an item's block lines cover.
    pub fn place_item_blocks(&mut self, hex: HexPos, id: ItemId, proto: &ItemProto) {
        let flags = block_line_flags(proto);
        for h in self.block_line_hexes(hex, proto) {
            self.set_hex_flag(h, flags);
            self.block_lines_by_hex.entry(h).or_default().push(id);
        }
    }

    /// Revert [`place_item_blocks`](Self::place_item_blocks).
    pub fn remove_item_blocks(&mut self, hex: HexPos, id: ItemId, proto: &ItemProto) {
        let flags = block_line_flags(proto);
        for h in self.block_line_hexes(hex, proto) {
            self.unset_hex_flag(h, flags);
            remove_from_hex(&mut self.block_lines_by_hex, h, id);
        }
    }

    /// Put an item on the map, rejecting off-map hexes.
    pub fn add_item(&mut self, item: Item, hex: HexPos) -> Result<(), Box<Rejected<Item>>> {
        if !self.in_range(hex) {
            return Err(Box::new(Rejected::new(item, PlaceError::OutOfRange { hex })));
        }
        self.set_item(item, hex);
        Ok(())
    }

    /// Put an item on the map.
    ///
    /// # Panics
    ///
    /// Panics if the item is already on the map or `hex` is off-map.
    pub fn set_item(&mut self, mut item: Item, hex: HexPos) {
        self.index_of(hex);
        assert!(
            !self.items.contains_key(&item.id),
            "item {} already on map {}",
            item.id,
            self.id
        );
        item.hex = hex;
        let flags = item_flags(&item.proto);
        if !flags.is_empty() {
            self.set_hex_flag(hex, flags);
        }
        self.items_by_hex.entry(hex).or_default().push(item.id);
        if item.proto.trigger {
            self.triggers_by_hex.entry(hex).or_default().push(item.id);
        }
        self.place_item_blocks(hex, item.id, &item.proto);
        self.items.insert(item.id, item);
    }

    /// Take an item off the map and revert its flags.
    ///
    /// # Panics
    ///
    /// Panics if the item is not on this map.
    pub fn erase_item(&mut self, id: ItemId) -> Item {
        let item = self
            .items
            .shift_remove(&id)
            .unwrap_or_else(|| panic!("item {id} is not on map {}", self.id));
        let flags = item_flags(&item.proto);
        if !flags.is_empty() {
            self.unset_hex_flag(item.hex, flags);
        }
        remove_from_hex(&mut self.items_by_hex, item.hex, id);
        if item.proto.trigger {
            remove_from_hex(&mut self.triggers_by_hex, item.hex, id);
        }
        self.remove_item_blocks(item.hex, id, &item.proto);
        item
    }

    /// Item by id.
    pub fn get_item(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    /// All items in placement order.
    pub fn items(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.values()
    }

    fn items_in(&self, index: &HexIndex<ItemId>, hex: HexPos) -> Vec<&Item> {
        index
            .get(&hex)
            .into_iter()
            .flatten()
            .filter_map(|id| self.items.get(id))
            .collect()
    }

    /// Items on `hex`.
    pub fn get_items_hex(&self, hex: HexPos) -> Vec<&Item> {
        self.items_in(&self.items_by_hex, hex)
    }

    /// Items within `radius` of `hex`, optionally restricted to one prototype.
    pub fn get_items_hex_ex(&self, hex: HexPos, radius: u32, pid: Option<ProtoId>) -> Vec<&Item> {
        self.items
            .values()
            .filter(|i| pid.is_none_or(|p| i.pid() == p))
            .filter(|i| self.geom.distance(i.hex, hex) <= radius)
            .collect()
    }

    /// Items of one prototype anywhere on the map.
    pub fn get_items_pid(&self, pid: ProtoId) -> Vec<&Item> {
        self.items.values().filter(|i| i.pid() == pid).collect()
    }

    /// Trigger items on `hex`.
    pub fn get_items_trigger(&self, hex: HexPos) -> Vec<&Item> {
        self.items_in(&self.triggers_by_hex, hex)
    }

    /// Items whose block lines cross `hex`.
    pub fn get_items_block_line(&self, hex: HexPos) -> Vec<&Item> {
        self.items_in(&self.block_lines_by_hex, hex)
    }

    /// The first gag item on `hex`.
    pub fn get_item_gag(&self, hex: HexPos) -> Option<&Item> {
        self.get_items_hex(hex).into_iter().find(|i| i.proto.gag)
    }

    /// The first item of prototype `pid` on `hex`.
    pub fn get_item_hex(&self, hex: HexPos, pid: ProtoId) -> Option<&Item> {
        self.get_items_hex(hex).into_iter().find(|i| i.pid() == pid)
    }

    /// Whether an item of `proto` may be dropped on `hex`: the hex must be
    /// walkable, and its block lines must stay on the map and avoid
    /// critters.
    pub fn is_place_for_proto_item(&self, hex: HexPos, proto: &ItemProto) -> bool {
        if !self.in_range(hex) || !self.is_hex_passed(hex) {
            return false;
        }
        let line = self.block_line_hexes(hex, proto);
        let wanted: usize = proto.block_lines.iter().map(|&(_, n)| usize::from(n)).sum();
        line.len() == wanted && line.iter().all(|&h| !self.is_hex_critter(h))
    }

    // ── Static scenery ──────────────────────────────────────────

    /// Scenery of prototype `pid` on `hex`.
    pub fn get_static_item(&self, hex: HexPos, pid: ProtoId) -> Option<&StaticItem> {
        self.static_data.items_at(hex).find(|s| s.proto.pid == pid)
    }

    /// Scenery on `hex`.
    pub fn get_static_items_hex(&self, hex: HexPos) -> Vec<&StaticItem> {
        self.static_data.items_at(hex).collect()
    }

    /// Scenery within `radius` of `hex`, optionally of one prototype.
    pub fn get_static_items_hex_ex(
        &self,
        hex: HexPos,
        radius: u32,
        pid: Option<ProtoId>,
    ) -> Vec<&StaticItem> {
        self.static_data
            .static_items()
            .iter()
            .filter(|s| pid.is_none_or(|p| s.proto.pid == p))
            .filter(|s| self.geom.distance(s.hex, hex) <= radius)
            .collect()
    }

    /// Scenery of one prototype anywhere on the map.
    pub fn get_static_items_by_pid(&self, pid: ProtoId) -> Vec<&StaticItem> {
        self.static_data
            .static_items()
            .iter()
            .filter(|s| s.proto.pid == pid)
            .collect()
    }

    /// Trigger scenery on `hex`.
    pub fn get_static_item_triggers(&self, hex: HexPos) -> Vec<&StaticItem> {
        self.static_data.triggers_at(hex).collect()
    }

    // ── Loops & properties ──────────────────────────────────────

    /// Loop timers.
    pub fn loops(&self) -> &LoopTimers {
        &self.loops
    }

    /// Replace the loop timers.
    pub fn set_loops(&mut self, periods: [u32; LOOP_COUNT], now_ms: u64) {
        self.loops = LoopTimers::new(periods, now_ms);
    }

    /// Advance loop timers; returns the indices that fired.
    pub fn process(&mut self, now_ms: u64) -> SmallVec<[usize; LOOP_COUNT]> {
        self.loops.process(now_ms)
    }

    /// Custom properties.
    pub fn properties(&self) -> &Document {
        &self.properties
    }

    /// Set a custom property. Returns whether the value changed.
    pub fn set_property(&mut self, key: &str, value: DocValue) -> bool {
        if self.properties.get(key) == Some(&value) {
            return false;
        }
        self.properties.set(key, value);
        true
    }
}

fn item_flags(proto: &ItemProto) -> HexFlags {
    let mut flags = HexFlags::empty();
    flags.set(HexFlags::ITEM_BLOCK, !proto.passable);
    flags.set(HexFlags::ITEM_NO_SHOOT, !proto.shoot_thru);
    flags.set(HexFlags::GAG_ITEM, proto.gag);
    flags.set(HexFlags::TRIGGER_ITEM, proto.trigger);
    flags
}

fn block_line_flags(proto: &ItemProto) -> HexFlags {
    let mut flags = HexFlags::BLOCK_LINE;
    flags.set(HexFlags::ITEM_NO_SHOOT, !proto.shoot_thru);
    flags
}

fn remove_from_hex<T: PartialEq>(index: &mut HexIndex<T>, hex: HexPos, value: T) {
    if let Some(list) = index.get_mut(&hex) {
        if let Some(pos) = list.iter().position(|v| *v == value) {
            list.remove(pos);
        }
        if list.is_empty() {
            index.shift_remove(&hex);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::static_map::MapProto;

    fn map() -> RuntimeMap {
        let proto = MapProto::new(ProtoId(1), 12, 12);
        let data = Arc::new(StaticMapData::build(&proto).unwrap());
        RuntimeMap::new(MapId(1), data, HexGeometry::hexagonal())
    }

    fn player(id: u32, x: u16, y: u16) -> Critter {
        Critter::player(CritterId(id), ProtoId(1)).at(HexPos::new(x, y))
    }

    fn assert_consistent(m: &RuntimeMap) {
        for y in 0..m.height() {
            for x in 0..m.width() {
                let h = HexPos::new(x, y);
                assert_eq!(m.hex_flags(h), m.derive_hex_flags(h), "hex {h}");
            }
        }
    }

    // ── Critters ────────────────────────────────────────────────

    #[test]
    fn add_and_erase_critter_reverts_flags() {
        let mut m = map();
        m.add_critter(player(1, 5, 5));
        assert!(!m.is_hex_passed(HexPos::new(5, 5)));
        assert_eq!(m.get_critter(CritterId(1)).unwrap().map_id, Some(MapId(1)));
        let cr = m.erase_critter(CritterId(1));
        assert_eq!(cr.map_id, None);
        assert!(m.is_hex_passed(HexPos::new(5, 5)));
        assert_consistent(&m);
    }

    #[test]
    fn multihex_critter_covers_disk() {
        let mut m = map();
        m.add_critter(player(1, 5, 5).with_multihex(1));
        assert_eq!(m.hexes_around(HexPos::new(5, 5), 1).count(), 7);
        for h in m.hexes_around(HexPos::new(5, 5), 1).collect::<Vec<_>>() {
            assert!(m.is_flag_critter(h, false));
            assert_eq!(m.critter_ids_at(h), &[CritterId(1)]);
        }
        assert_consistent(&m);
    }

    #[test]
    fn dead_critter_marks_centre_only_and_does_not_block() {
        let mut m = map();
        m.add_critter(player(1, 5, 5).with_multihex(1));
        m.set_critter_condition(CritterId(1), CritterCondition::Dead);
        assert!(m.is_flag_critter(HexPos::new(5, 5), true));
        assert!(m.is_hex_passed(HexPos::new(5, 5)));
        assert!(m.critter_ids_at(HexPos::new(5, 4)).is_empty());
        assert_eq!(m.get_hex_critter(HexPos::new(5, 5), true).unwrap().id, CritterId(1));
        assert!(m.get_hex_critter(HexPos::new(5, 5), false).is_none());
        assert_consistent(&m);
    }

    #[test]
    fn move_critter_updates_indexes() {
        let mut m = map();
        m.add_critter(player(1, 5, 5));
        m.add_critter(player(2, 8, 8));
        m.move_critter(CritterId(1), HexPos::new(6, 5), 1);
        assert!(m.is_hex_passed(HexPos::new(5, 5)));
        assert!(!m.is_hex_passed(HexPos::new(6, 5)));
        let ids: Vec<_> = m.critters().map(|c| c.id).collect();
        assert_eq!(ids, vec![CritterId(1), CritterId(2)]);
        assert_eq!(m.get_critter(CritterId(1)).unwrap().dir, 1);
        assert_consistent(&m);
    }

    #[test]
    fn try_add_rejects_blocked_footprint() {
        let mut m = map();
        m.add_critter(player(1, 5, 4));
        let err = m
            .try_add_critter(player(2, 5, 5).with_multihex(1))
            .unwrap_err();
        assert!(matches!(err.error, PlaceError::HexesBlocked { radius: 1, .. }));
        assert_eq!(err.entity.id, CritterId(2));
        assert_eq!(m.critters_count(), 1);
        assert!(matches!(
            m.try_add_critter(player(1, 0, 0)).unwrap_err().error,
            PlaceError::AlreadyOnMap { .. }
        ));
    }

    #[test]
    #[should_panic(expected = "is not on map")]
    fn erasing_absent_critter_panics() {
        map().erase_critter(CritterId(42));
    }

    #[test]
    #[should_panic(expected = "outside 12x12")]
    fn off_map_flag_panics() {
        map().set_hex_flag(HexPos::new(12, 0), HexFlags::CRITTER);
    }

    #[test]
    fn move_blocked_by_other_critter_footprint() {
        let mut m = map();
        let from = HexPos::new(4, 4);
        m.add_critter(player(1, 4, 4).with_multihex(1));
        m.add_critter(player(2, 7, 4));
        assert_eq!(
            m.geometry().move_by_dir(from, 1, 12, 12),
            Some(HexPos::new(5, 4))
        );
        assert!(m.is_move_passed(from, 1, 1));
        m.add_critter(player(3, 6, 5));
        assert!(!m.is_move_passed(from, 1, 1));
        assert!(m.is_move_passed_ignoring(from, 1, 1, HexFlags::CRITTER));
    }

    #[test]
    fn queries_filter_by_kind_and_role() {
        let mut m = map();
        m.add_critter(player(1, 1, 1));
        m.add_critter(Critter::npc(CritterId(2), ProtoId(2), 7).at(HexPos::new(2, 2)));
        m.add_critter(Critter::npc(CritterId(3), ProtoId(2), 7).at(HexPos::new(3, 3)));
        assert_eq!(m.players_count(), 1);
        assert_eq!(m.npcs_count(), 2);
        assert_eq!(m.get_npc(7, FindType::ANY, 1).unwrap().id, CritterId(3));
        assert!(m.get_npc(7, FindType::ANY, 2).is_none());
        m.set_critter_condition(CritterId(2), CritterCondition::Dead);
        assert_eq!(m.get_npc_count(7, FindType::ALIVE), 1);
        let near = m.get_critters_hex(HexPos::new(1, 1), 0, FindType::ANY);
        assert_eq!(near.len(), 1);
    }

    #[test]
    fn find_start_hex_skips_occupied_and_unsafe() {
        let mut m = map();
        let centre = HexPos::new(5, 5);
        assert_eq!(m.find_start_hex(centre, 0, 2, true), Some(centre));
        m.add_critter(player(1, 5, 5));
        let found = m.find_start_hex(centre, 0, 2, true).unwrap();
        assert_eq!(m.geometry().distance(centre, found), 1);
        let trap = ItemProto::new(ProtoId(5)).trigger();
        m.set_item(Item::new(ItemId(1), trap.clone()), found);
        let next = m.find_start_hex(centre, 0, 2, true).unwrap();
        assert_ne!(next, found);
        assert_eq!(m.find_start_hex(centre, 0, 2, false), Some(found));
        assert_eq!(m.find_start_hex(centre, 0, 0, false), None);
    }

    // ── Items ───────────────────────────────────────────────────

    #[test]
    fn overlapping_blockers_either_order() {
        for first in [1u32, 2] {
            let mut m = map();
            let hex = HexPos::new(3, 3);
            let wall = ItemProto::new(ProtoId(9)).blocking();
            m.set_item(Item::new(ItemId(1), wall.clone()), hex);
            m.set_item(Item::new(ItemId(2), wall), hex);
            m.erase_item(ItemId(first));
            assert!(!m.is_hex_passed(hex));
            m.erase_item(ItemId(3 - first));
            assert!(m.is_hex_passed(hex));
            assert_consistent(&m);
        }
    }

    #[test]
    fn block_lines_mark_and_revert() {
        let mut m = map();
        let mut fence = ItemProto::new(ProtoId(3)).with_block_line(2, 3);
        fence.shoot_thru = false;
        m.set_item(Item::new(ItemId(1), fence.clone()), HexPos::new(4, 2));
        for y in 3..=5 {
            let h = HexPos::new(4, y);
            assert!(!m.is_hex_passed(h));
            assert!(!m.is_hex_raked(h));
            assert_eq!(m.get_items_block_line(h).len(), 1);
        }
        assert!(m.is_hex_passed(HexPos::new(4, 2)));
        assert_consistent(&m);
        m.erase_item(ItemId(1));
        assert!(m.is_hex_passed(HexPos::new(4, 4)));
        assert_consistent(&m);
    }

    #[test]
    fn item_lookups() {
        let mut m = map();
        let hex = HexPos::new(2, 2);
        m.set_item(Item::new(ItemId(1), ItemProto::new(ProtoId(4))), hex);
        m.set_item(Item::new(ItemId(2), ItemProto::new(ProtoId(5)).gag()), hex);
        m.set_item(Item::new(ItemId(3), ItemProto::new(ProtoId(4))), HexPos::new(9, 9));
        assert_eq!(m.get_items_hex(hex).len(), 2);
        assert_eq!(m.get_item_gag(hex).unwrap().id, ItemId(2));
        assert!(m.is_hex_gag(hex));
        assert_eq!(m.get_items_pid(ProtoId(4)).len(), 2);
        assert_eq!(m.get_items_hex_ex(hex, 1, Some(ProtoId(4))).len(), 1);
        assert_eq!(m.get_item_hex(hex, ProtoId(5)).unwrap().id, ItemId(2));
        assert!(m.add_item(Item::new(ItemId(4), ItemProto::new(ProtoId(4))), HexPos::new(20, 0)).is_err());
    }

    #[test]
    fn place_for_proto_item_respects_lines() {
        let mut m = map();
        let fence = ItemProto::new(ProtoId(3)).with_block_line(2, 2);
        assert!(m.is_place_for_proto_item(HexPos::new(4, 2), &fence));
        assert!(!m.is_place_for_proto_item(HexPos::new(4, 11), &fence));
        m.add_critter(player(1, 4, 3));
        assert!(!m.is_place_for_proto_item(HexPos::new(4, 2), &fence));
    }

    #[test]
    fn property_change_detection() {
        let mut m = map();
        assert!(m.set_property("rain", DocValue::Int(3)));
        assert!(!m.set_property("rain", DocValue::Int(3)));
        assert_eq!(m.properties().get_int("rain"), Some(3));
    }
}
