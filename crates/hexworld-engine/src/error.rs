//! Transit outcomes.

use std::error::Error;
use std::fmt;

use hexworld_core::{CritterId, MapId};
use hexworld_map::PlaceError;

/// Why a critter could not be moved between containers.
///
/// A failed transit never changes where the critter is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransitError {
    /// The critter is not on any map nor on the global map.
    CritterNotFound {
        /// The missing critter.
        critter: CritterId,
    },
    /// The destination map does not exist.
    MapNotFound {
        /// The missing map.
        map: MapId,
    },
    /// The critter refuses transits and the move was not forced.
    Locked {
        /// The locked critter.
        critter: CritterId,
    },
    /// The footprint radius exceeds the configured maximum.
    MultihexTooLarge {
        /// The critter.
        critter: CritterId,
        /// Its footprint radius.
        multihex: u8,
    },
    /// The destination refused the placement.
    Place(PlaceError),
}

impl fmt::Display for TransitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CritterNotFound { critter } => write!(f, "critter {critter} not found"),
            Self::MapNotFound { map } => write!(f, "map {map} not found"),
            Self::Locked { critter } => write!(f, "critter {critter} is transit-locked"),
            Self::MultihexTooLarge { critter, multihex } => {
                write!(f, "critter {critter} footprint radius {multihex} is too large")
            }
            Self::Place(e) => write!(f, "placement refused: {e}"),
        }
    }
}

impl Error for TransitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Place(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlaceError> for TransitError {
    fn from(e: PlaceError) -> Self {
        Self::Place(e)
    }
}
