//! Critter and item records owned by a runtime map.

use hexworld_core::{CritterId, HexPos, ItemId, LocationId, MapId, ProtoId};
use indexmap::IndexSet;
use smallvec::SmallVec;

// ── Items ──────────────────────────────────────────────────────────

/// Item properties that matter to occupancy, shared by static scenery
/// and dynamic items.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemProto {
    /// Prototype id.
    pub pid: ProtoId,
    /// Critters can walk through the item's hex.
    pub passable: bool,
    /// Bullets and sight pass through the item's hex.
    pub shoot_thru: bool,
    /// The item is a gag (temporary hex reservation, e.g. a closed door).
    pub gag: bool,
    /// Stepping onto the item's hex fires a trigger.
    pub trigger: bool,
    /// Hidden items keep their flags but are never shown to viewers.
    pub hidden: bool,
    /// Block lines as `(direction, length)` segments walked from the
    /// item's hex. Each covered hex becomes impassable.
    pub block_lines: SmallVec<[(u8, u8); 4]>,
}

impl ItemProto {
    /// A passable, shoot-through item with no special behaviour.
    pub fn new(pid: ProtoId) -> Self {
        Self {
            pid,
            passable: true,
            shoot_thru: true,
            gag: false,
            trigger: false,
            hidden: false,
            block_lines: SmallVec::new(),
        }
    }

    /// Make the item stop walking and shooting.
    pub fn blocking(mut self) -> Self {
        self.passable = false;
        self.shoot_thru = false;
        self
    }

    /// Make the item stop walking but not shooting.
    pub fn window(mut self) -> Self {
        self.passable = false;
        self.shoot_thru = true;
        self
    }

    /// Mark the item as a gag.
    pub fn gag(mut self) -> Self {
        self.gag = true;
        self
    }

    /// Mark the item as a trigger.
    pub fn trigger(mut self) -> Self {
        self.trigger = true;
        self
    }

    /// Hide the item from viewers.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Attach a block line segment.
    pub fn with_block_line(mut self, dir: u8, len: u8) -> Self {
        self.block_lines.push((dir, len));
        self
    }
}

/// A dynamic item placed on a map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Unique id.
    pub id: ItemId,
    /// Occupancy-relevant properties.
    pub proto: ItemProto,
    /// Position; meaningful only while the item is on a map.
    pub hex: HexPos,
}

impl Item {
    /// Create an item from its prototype.
    pub fn new(id: ItemId, proto: ItemProto) -> Self {
        Self {
            id,
            proto,
            hex: HexPos::default(),
        }
    }

    /// Prototype id shortcut.
    pub fn pid(&self) -> ProtoId {
        self.proto.pid
    }
}

// ── Critters ───────────────────────────────────────────────────────

/// Health condition of a critter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CritterCondition {
    /// Alive and acting.
    #[default]
    Alive,
    /// Unconscious; still occupies its whole footprint.
    Knockout,
    /// Dead; only the centre hex is marked, and it does not block.
    Dead,
}

/// Player or NPC.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CritterKind {
    /// Controlled by a connected client.
    Player,
    /// Server-controlled.
    Npc {
        /// Script-defined role used by role lookups.
        role: i32,
    },
}

/// A critter on a map or on the global map.
#[derive(Clone, Debug)]
pub struct Critter {
    /// Unique id.
    pub id: CritterId,
    /// Critter prototype.
    pub proto: ProtoId,
    /// Player or NPC.
    pub kind: CritterKind,
    /// Centre hex.
    pub hex: HexPos,
    /// Facing direction.
    pub dir: u8,
    /// Footprint radius; 0 for a single hex.
    pub multihex: u8,
    /// Health condition.
    pub condition: CritterCondition,
    /// Map the critter is on, or `None` on the global map. An id lookup
    /// only; the map owns the critter record, not the other way round.
    pub map_id: Option<MapId>,
    /// Group leader whose transits drag this critter along.
    pub leader_id: Option<CritterId>,
    /// World-map position, used while on the global map.
    pub world_pos: (u16, u16),
    /// Refuses transits while set (e.g. during a scripted scene).
    pub transit_locked: bool,
    /// Sight radius in hexes.
    pub look_distance: u32,
    /// Locations the critter has discovered.
    pub known_locations: IndexSet<LocationId>,
    /// Critters this critter currently sees.
    pub visible_critters: IndexSet<CritterId>,
    /// Items this critter currently sees.
    pub visible_items: IndexSet<ItemId>,
}

impl Critter {
    fn with_kind(id: CritterId, proto: ProtoId, kind: CritterKind) -> Self {
        Self {
            id,
            proto,
            kind,
            hex: HexPos::default(),
            dir: 0,
            multihex: 0,
            condition: CritterCondition::Alive,
            map_id: None,
            leader_id: None,
            world_pos: (0, 0),
            transit_locked: false,
            look_distance: 0,
            known_locations: IndexSet::new(),
            visible_critters: IndexSet::new(),
            visible_items: IndexSet::new(),
        }
    }

    /// A player critter.
    pub fn player(id: CritterId, proto: ProtoId) -> Self {
        Self::with_kind(id, proto, CritterKind::Player)
    }

    /// An NPC with the given role.
    pub fn npc(id: CritterId, proto: ProtoId, role: i32) -> Self {
        Self::with_kind(id, proto, CritterKind::Npc { role })
    }

    /// Builder: place at `hex`.
    pub fn at(mut self, hex: HexPos) -> Self {
        self.hex = hex;
        self
    }

    /// Builder: footprint radius.
    pub fn with_multihex(mut self, radius: u8) -> Self {
        self.multihex = radius;
        self
    }

    /// Builder: follow `leader`.
    pub fn following(mut self, leader: CritterId) -> Self {
        self.leader_id = Some(leader);
        self
    }

    /// Builder: sight radius.
    pub fn with_look(mut self, look: u32) -> Self {
        self.look_distance = look;
        self
    }

    /// Whether the critter is a player.
    pub fn is_player(&self) -> bool {
        self.kind == CritterKind::Player
    }

    /// Whether the critter is an NPC.
    pub fn is_npc(&self) -> bool {
        matches!(self.kind, CritterKind::Npc { .. })
    }

    /// NPC role, if an NPC.
    pub fn npc_role(&self) -> Option<i32> {
        match self.kind {
            CritterKind::Npc { role } => Some(role),
            CritterKind::Player => None,
        }
    }

    /// Whether the critter is dead.
    pub fn is_dead(&self) -> bool {
        self.condition == CritterCondition::Dead
    }

    /// Whether the critter is alive and conscious.
    pub fn is_alive(&self) -> bool {
        self.condition == CritterCondition::Alive
    }

    /// Radius of the hexes the critter covers: its multihex radius while
    /// standing or knocked out, 0 once dead.
    pub fn footprint_radius(&self) -> u32 {
        if self.is_dead() {
            0
        } else {
            u32::from(self.multihex)
        }
    }
}

/// Critter selector used by hex, radius and role lookups.
///
/// Condition bits and kind bits combine: a critter matches when its
/// condition bit is set and, if a kind restriction is present, its kind
/// matches too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FindType(u8);

impl FindType {
    /// Alive critters.
    pub const ALIVE: Self = Self(0x01);
    /// Knocked-out critters.
    pub const KNOCKOUT: Self = Self(0x02);
    /// Dead critters.
    pub const DEAD: Self = Self(0x04);
    /// Any condition.
    pub const ANY: Self = Self(0x07);
    /// Alive or knocked out.
    pub const NOT_DEAD: Self = Self(0x03);
    /// Restrict to players.
    pub const ONLY_PLAYERS: Self = Self(0x10);
    /// Restrict to NPCs.
    pub const ONLY_NPCS: Self = Self(0x20);

    /// Combine two selectors.
    pub const fn with(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Whether `critter` is selected.
    pub fn matches(self, critter: &Critter) -> bool {
        let cond = match critter.condition {
            CritterCondition::Alive => Self::ALIVE,
            CritterCondition::Knockout => Self::KNOCKOUT,
            CritterCondition::Dead => Self::DEAD,
        };
        if self.0 & cond.0 == 0 {
            return false;
        }
        if self.0 & Self::ONLY_PLAYERS.0 != 0 && !critter.is_player() {
            return false;
        }
        if self.0 & Self::ONLY_NPCS.0 != 0 && !critter.is_npc() {
            return false;
        }
        true
    }
}

impl Default for FindType {
    fn default() -> Self {
        Self::ANY
    }
}
