//! Strongly-typed entity identifiers.
//!
//! Critters, items, maps and locations share one id space allocated by
//! the map manager. Prototype ids are content hashes of prototype names.

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u32> for $name {
            fn from(v: u32) -> Self {
                Self(v)
            }
        }
    };
}

entity_id!(
    /// Identifies a critter (player or NPC).
    CritterId
);

entity_id!(
    /// Identifies a dynamic item placed on a map.
    ItemId
);

entity_id!(
    /// Identifies a runtime map instance.
    ///
    /// Two instances of the same prototype have different `MapId`s but
    /// share one static snapshot.
    MapId
);

entity_id!(
    /// Identifies a location: a group of maps anchored at one world-map
    /// coordinate.
    LocationId
);

entity_id!(
    /// Identifies a prototype (map, location, item or critter template).
    ///
    /// Prototype ids are stable across restarts; use [`ProtoId::from_name`]
    /// to derive one from a prototype name.
    ProtoId
);

impl ProtoId {
    /// Derive a prototype id from its name (32-bit FNV-1a).
    pub fn from_name(name: &str) -> Self {
        let mut hash: u32 = 0x811c_9dc5;
        for byte in name.bytes() {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
        Self(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prints_inner_value() {
        assert_eq!(CritterId(7).to_string(), "7");
        assert_eq!(MapId::from(12).to_string(), "12");
    }

    #[test]
    fn proto_id_from_name_is_stable() {
        assert_eq!(ProtoId::from_name("den"), ProtoId::from_name("den"));
        assert_ne!(ProtoId::from_name("den"), ProtoId::from_name("klamath"));
        assert_eq!(ProtoId::from_name(""), ProtoId(0x811c_9dc5));
    }
}
