//! Map prototypes and their immutable, shared static snapshot.
//!
//! A [`MapProto`] is what the content loader hands over: dimensions,
//! tiles, scenery and spawn lists. [`StaticMapData::build`] validates it
//! once and bakes the base hex flags and per-hex scenery indexes. Every
//! runtime instance of the prototype shares the result through an `Arc`.

use hexworld_core::{ContentError, HexPos, ProtoId};
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::entity::ItemProto;
use crate::flags::HexFlags;

/// Largest accepted map side, in hexes.
pub const MAX_MAP_SIDE: u16 = 4000;

/// One floor or roof tile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapTile {
    /// Tile graphic id.
    pub name: ProtoId,
    /// Hex the tile is anchored at.
    pub hex: HexPos,
    /// Roof tile rather than floor tile.
    pub roof: bool,
    /// Draw layer.
    pub layer: u8,
}

/// A piece of scenery fixed to one hex.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StaticItem {
    /// Hex the scenery stands on.
    pub hex: HexPos,
    /// Occupancy properties.
    pub proto: ItemProto,
}

/// A critter created when a map's dynamic content is generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CritterSpawn {
    /// Critter prototype.
    pub proto: ProtoId,
    /// Spawn hex.
    pub hex: HexPos,
    /// Initial facing.
    pub dir: u8,
    /// Footprint radius.
    pub multihex: u8,
    /// NPC role.
    pub npc_role: i32,
}

/// A dynamic item created when a map's dynamic content is generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemSpawn {
    /// Spawn hex.
    pub hex: HexPos,
    /// Occupancy properties.
    pub proto: ItemProto,
}

/// A parsed map prototype.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapProto {
    /// Prototype id.
    pub pid: ProtoId,
    /// Width in hexes.
    pub width: u16,
    /// Height in hexes.
    pub height: u16,
    /// Hex critters arriving without a destination are placed near.
    pub work_hex: HexPos,
    /// Tile layout.
    pub tiles: Vec<MapTile>,
    /// Scenery (walls, static triggers, decorations).
    pub static_items: Vec<StaticItem>,
    /// NPCs generated with the map.
    pub critter_spawns: Vec<CritterSpawn>,
    /// Items generated with the map.
    pub item_spawns: Vec<ItemSpawn>,
    /// Loop timer periods in milliseconds (0 disables a loop).
    pub loop_periods: [u32; 5],
    /// Content hash of the tile layout.
    pub hash_tiles: u32,
    /// Content hash of the scenery.
    pub hash_scenery: u32,
}

impl MapProto {
    /// An empty prototype of the given size.
    pub fn new(pid: ProtoId, width: u16, height: u16) -> Self {
        Self {
            pid,
            width,
            height,
            work_hex: HexPos::new(width / 2, height / 2),
            tiles: Vec::new(),
            static_items: Vec::new(),
            critter_spawns: Vec::new(),
            item_spawns: Vec::new(),
            loop_periods: [0; 5],
            hash_tiles: 0,
            hash_scenery: 0,
        }
    }
}

/// Immutable per-prototype snapshot: base flags and scenery indexes.
#[derive(Debug)]
pub struct StaticMapData {
    pid: ProtoId,
    width: u16,
    height: u16,
    hash_tiles: u32,
    hash_scenery: u32,
    base_flags: Vec<HexFlags>,
    tiles: Vec<MapTile>,
    static_items: Vec<StaticItem>,
    items_by_hex: IndexMap<HexPos, SmallVec<[usize; 2]>>,
    triggers_by_hex: IndexMap<HexPos, SmallVec<[usize; 1]>>,
}

impl StaticMapData {
    /// Validate `proto` and bake its static snapshot.
    pub fn build(proto: &MapProto) -> Result<Self, ContentError> {
        let (w, h) = (proto.width, proto.height);
        if w == 0 || h == 0 || w > MAX_MAP_SIDE || h > MAX_MAP_SIDE {
            return Err(ContentError::InvalidMapSize {
                proto: proto.pid,
                width: w,
                height: h,
            });
        }
        let check = |what: &'static str, hex: HexPos| {
            if hex.in_bounds(w, h) {
                Ok(())
            } else {
                Err(ContentError::HexOutOfRange {
                    proto: proto.pid,
                    what,
                    hex,
                })
            }
        };
        check("work hex", proto.work_hex)?;
        for t in &proto.tiles {
            check("tile", t.hex)?;
        }
        for s in &proto.critter_spawns {
            check("critter spawn", s.hex)?;
        }
        for s in &proto.item_spawns {
            check("item spawn", s.hex)?;
        }

        let mut base_flags = vec![HexFlags::empty(); usize::from(w) * usize::from(h)];
        let mut items_by_hex: IndexMap<HexPos, SmallVec<[usize; 2]>> = IndexMap::new();
        let mut triggers_by_hex: IndexMap<HexPos, SmallVec<[usize; 1]>> = IndexMap::new();
        for (i, item) in proto.static_items.iter().enumerate() {
            check("static item", item.hex)?;
            let flags = &mut base_flags[item.hex.index(w)];
            if !item.proto.passable {
                *flags |= HexFlags::SCEN_BLOCK;
            }
            if !item.proto.shoot_thru {
                *flags |= HexFlags::SCEN_NO_SHOOT;
            }
            items_by_hex.entry(item.hex).or_default().push(i);
            if item.proto.trigger {
                *flags |= HexFlags::SCEN_TRIGGER;
                triggers_by_hex.entry(item.hex).or_default().push(i);
            }
        }

        Ok(Self {
            pid: proto.pid,
            width: w,
            height: h,
            hash_tiles: proto.hash_tiles,
            hash_scenery: proto.hash_scenery,
            base_flags,
            tiles: proto.tiles.clone(),
            static_items: proto.static_items.clone(),
            items_by_hex,
            triggers_by_hex,
        })
    }

    /// Prototype this snapshot was built from.
    pub fn pid(&self) -> ProtoId {
        self.pid
    }

    /// Width in hexes.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in hexes.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// `(tiles hash, scenery hash)` this snapshot was built from.
    pub fn hashes(&self) -> (u32, u32) {
        (self.hash_tiles, self.hash_scenery)
    }

    /// Whether the snapshot was built from a prototype with these hashes.
    pub fn is_current_for(&self, proto: &MapProto) -> bool {
        self.hashes() == (proto.hash_tiles, proto.hash_scenery)
            && self.width == proto.width
            && self.height == proto.height
    }

    /// Base flags for every hex, row-major.
    pub fn base_flags(&self) -> &[HexFlags] {
        &self.base_flags
    }

    /// Base flags of one hex.
    pub fn base_flags_at(&self, hex: HexPos) -> HexFlags {
        self.base_flags[hex.index(self.width)]
    }

    /// Tile layout.
    pub fn tiles(&self) -> &[MapTile] {
        &self.tiles
    }

    /// All scenery.
    pub fn static_items(&self) -> &[StaticItem] {
        &self.static_items
    }

    /// Scenery on `hex`.
    pub fn items_at(&self, hex: HexPos) -> impl Iterator<Item = &StaticItem> + '_ {
        self.items_by_hex
            .get(&hex)
            .into_iter()
            .flatten()
            .map(|&i| &self.static_items[i])
    }

    /// Trigger scenery on `hex`.
    pub fn triggers_at(&self, hex: HexPos) -> impl Iterator<Item = &StaticItem> + '_ {
        self.triggers_by_hex
            .get(&hex)
            .into_iter()
            .flatten()
            .map(|&i| &self.static_items[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proto() -> MapProto {
        MapProto::new(ProtoId(7), 10, 8)
    }

    #[test]
    fn scenery_bakes_base_flags() {
        let mut p = proto();
        let wall = ItemProto::new(ProtoId(1)).blocking();
        let glass = ItemProto::new(ProtoId(2)).window();
        let plate = ItemProto::new(ProtoId(3)).trigger();
        p.static_items.push(StaticItem { hex: HexPos::new(1, 1), proto: wall });
        p.static_items.push(StaticItem { hex: HexPos::new(2, 1), proto: glass });
        p.static_items.push(StaticItem { hex: HexPos::new(3, 1), proto: plate });
        let data = StaticMapData::build(&p).unwrap();

        assert_eq!(
            data.base_flags_at(HexPos::new(1, 1)),
            HexFlags::SCEN_BLOCK | HexFlags::SCEN_NO_SHOOT
        );
        assert_eq!(data.base_flags_at(HexPos::new(2, 1)), HexFlags::SCEN_BLOCK);
        assert_eq!(data.base_flags_at(HexPos::new(3, 1)), HexFlags::SCEN_TRIGGER);
        assert_eq!(data.triggers_at(HexPos::new(3, 1)).count(), 1);
        assert_eq!(data.items_at(HexPos::new(0, 0)).count(), 0);
    }

    #[test]
    fn stacked_scenery_keeps_strongest_flags() {
        let mut p = proto();
        let hex = HexPos::new(4, 4);
        p.static_items.push(StaticItem { hex, proto: ItemProto::new(ProtoId(1)).blocking() });
        p.static_items.push(StaticItem { hex, proto: ItemProto::new(ProtoId(2)) });
        let data = StaticMapData::build(&p).unwrap();
        assert!(data.base_flags_at(hex).contains(HexFlags::SCEN_BLOCK | HexFlags::SCEN_NO_SHOOT));
        assert_eq!(data.items_at(hex).count(), 2);
    }

    #[test]
    fn rejects_zero_size() {
        let p = MapProto::new(ProtoId(7), 0, 8);
        assert!(matches!(
            StaticMapData::build(&p),
            Err(ContentError::InvalidMapSize { width: 0, .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_scenery() {
        let mut p = proto();
        p.static_items.push(StaticItem {
            hex: HexPos::new(10, 0),
            proto: ItemProto::new(ProtoId(1)),
        });
        assert!(matches!(
            StaticMapData::build(&p),
            Err(ContentError::HexOutOfRange { what: "static item", .. })
        ));
    }

    #[test]
    fn hash_change_is_detected() {
        let mut p = proto();
        let data = StaticMapData::build(&p).unwrap();
        assert!(data.is_current_for(&p));
        p.hash_scenery = 99;
        assert!(!data.is_current_for(&p));
    }
}
