//! Map prototype builder and entity shorthands.

use std::sync::Arc;

use hexworld_core::{CritterId, HexPos, ItemId, MapId, ProtoId};
use hexworld_map::{
    Critter, CritterSpawn, Item, ItemProto, ItemSpawn, MapProto, RuntimeMap, StaticItem,
    StaticMapData,
};
use hexworld_space::HexGeometry;

/// Fluent builder for [`MapProto`] test fixtures.
#[derive(Clone, Debug)]
pub struct MapBuilder {
    proto: MapProto,
}

impl MapBuilder {
    pub fn new(name: &str, width: u16, height: u16) -> Self {
        Self {
            proto: MapProto::new(ProtoId::from_name(name), width, height),
        }
    }

    /// Scenery that blocks walking and shooting.
    pub fn wall(mut self, x: u16, y: u16) -> Self {
        self.proto.static_items.push(StaticItem {
            hex: HexPos::new(x, y),
            proto: ItemProto::new(ProtoId::from_name("wall")).blocking(),
        });
        self
    }

    /// Walls on every hex of column `x` between rows `y0..=y1`.
    pub fn wall_column(mut self, x: u16, y0: u16, y1: u16) -> Self {
        for y in y0..=y1 {
            self = self.wall(x, y);
        }
        self
    }

    /// Scenery that blocks walking but not shooting.
    pub fn window(mut self, x: u16, y: u16) -> Self {
        self.proto.static_items.push(StaticItem {
            hex: HexPos::new(x, y),
            proto: ItemProto::new(ProtoId::from_name("window")).window(),
        });
        self
    }

    /// Trigger scenery.
    pub fn static_trigger(mut self, x: u16, y: u16) -> Self {
        self.proto.static_items.push(StaticItem {
            hex: HexPos::new(x, y),
            proto: ItemProto::new(ProtoId::from_name("plate")).trigger(),
        });
        self
    }

    /// An NPC generated with the map.
    pub fn npc_spawn(mut self, x: u16, y: u16, role: i32) -> Self {
        self.proto.critter_spawns.push(CritterSpawn {
            proto: ProtoId::from_name("npc"),
            hex: HexPos::new(x, y),
            dir: 0,
            multihex: 0,
            npc_role: role,
        });
        self
    }

    /// An item generated with the map.
    pub fn item_spawn(mut self, x: u16, y: u16, proto: ItemProto) -> Self {
        self.proto.item_spawns.push(ItemSpawn {
            hex: HexPos::new(x, y),
            proto,
        });
        self
    }

    pub fn work_hex(mut self, x: u16, y: u16) -> Self {
        self.proto.work_hex = HexPos::new(x, y);
        self
    }

    pub fn loops(mut self, periods: [u32; 5]) -> Self {
        self.proto.loop_periods = periods;
        self
    }

    pub fn hashes(mut self, tiles: u32, scenery: u32) -> Self {
        self.proto.hash_tiles = tiles;
        self.proto.hash_scenery = scenery;
        self
    }

    pub fn build(self) -> MapProto {
        self.proto
    }
}

/// An empty `width × height` prototype.
pub fn open_map(name: &str, width: u16, height: u16) -> MapProto {
    MapBuilder::new(name, width, height).build()
}

/// A hexagonal runtime map over `proto`.
pub fn runtime_map(id: u32, proto: &MapProto) -> RuntimeMap {
    let data = StaticMapData::build(proto).expect("fixture prototype must be valid");
    RuntimeMap::new(MapId(id), Arc::new(data), HexGeometry::hexagonal())
}

/// A player at `(x, y)`.
pub fn player(id: u32, x: u16, y: u16) -> Critter {
    Critter::player(CritterId(id), ProtoId::from_name("player")).at(HexPos::new(x, y))
}

/// An NPC with `role` at `(x, y)`.
pub fn npc(id: u32, role: i32, x: u16, y: u16) -> Critter {
    Critter::npc(CritterId(id), ProtoId::from_name("npc"), role).at(HexPos::new(x, y))
}

/// A dynamic item that blocks walking and shooting.
pub fn blocker(id: u32) -> Item {
    Item::new(ItemId(id), ItemProto::new(ProtoId::from_name("crate")).blocking())
}
