//! Placement outcomes.

use std::error::Error;
use std::fmt;

use hexworld_core::{CritterId, HexPos, MapId};

/// Why a critter or item could not be placed.
///
/// These are expected gameplay outcomes; callers branch on them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaceError {
    /// The hex lies outside the map.
    OutOfRange {
        /// The rejected hex.
        hex: HexPos,
    },
    /// The footprint around the hex is not passable.
    HexesBlocked {
        /// Footprint centre.
        hex: HexPos,
        /// Footprint radius.
        radius: u32,
    },
    /// No free hex was found around the preferred one.
    NoFreeHex {
        /// Preferred hex.
        hex: HexPos,
        /// Search radius used.
        seek_radius: u32,
    },
    /// The map holds its maximum number of critters.
    MapFull {
        /// The full map.
        map: MapId,
        /// Configured limit.
        limit: usize,
    },
    /// The critter's group leader is not where the placement requires.
    LeaderMissing {
        /// The required leader.
        leader: CritterId,
    },
    /// The critter is already on this map.
    AlreadyOnMap {
        /// The critter.
        critter: CritterId,
    },
}

impl fmt::Display for PlaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange { hex } => write!(f, "hex {hex} is outside the map"),
            Self::HexesBlocked { hex, radius } => {
                write!(f, "hexes around {hex} (radius {radius}) are not passable")
            }
            Self::NoFreeHex { hex, seek_radius } => {
                write!(f, "no free hex within {seek_radius} of {hex}")
            }
            Self::MapFull { map, limit } => write!(f, "map {map} is full ({limit} critters)"),
            Self::LeaderMissing { leader } => write!(f, "leader {leader} is not on the map"),
            Self::AlreadyOnMap { critter } => write!(f, "critter {critter} is already on the map"),
        }
    }
}

impl Error for PlaceError {}

/// A rejected placement, handing the entity back to the caller.
#[derive(Debug)]
pub struct Rejected<T> {
    /// The entity that was not placed.
    pub entity: T,
    /// Why.
    pub error: PlaceError,
}

impl<T> Rejected<T> {
    /// Pair an entity with the reason it was rejected.
    pub fn new(entity: T, error: PlaceError) -> Self {
        Self { entity, error }
    }
}
