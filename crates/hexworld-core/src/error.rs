//! Infrastructure error types.
//!
//! Business outcomes (path not found, hex occupied, transit refused) are
//! typed results owned by the crates that produce them. [`ContentError`]
//! is the third tier: missing or inconsistent content detected while
//! loading prototypes or restoring persisted state. It is meant to abort
//! startup or a content reload, not to be handled per call.

use std::error::Error;
use std::fmt;

use crate::hex::HexPos;
use crate::id::{LocationId, ProtoId};

/// Errors raised while loading or restoring map content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentError {
    /// No map prototype is registered under this id.
    UnknownMapProto {
        /// The requested prototype.
        proto: ProtoId,
    },
    /// No location prototype is registered under this id.
    UnknownLocationProto {
        /// The requested prototype.
        proto: ProtoId,
    },
    /// Static data for a referenced map prototype could not be built.
    MissingStaticMap {
        /// The map prototype whose static data is missing.
        proto: ProtoId,
        /// Why the build failed.
        reason: String,
    },
    /// A map prototype declares an unusable size.
    InvalidMapSize {
        /// The offending prototype.
        proto: ProtoId,
        /// Declared width.
        width: u16,
        /// Declared height.
        height: u16,
    },
    /// A prototype places an entity outside its map.
    HexOutOfRange {
        /// The offending prototype.
        proto: ProtoId,
        /// What was being placed (e.g. `"static item"`).
        what: &'static str,
        /// The out-of-range coordinate.
        hex: HexPos,
    },
    /// A location prototype references a map prototype that failed to load.
    LocationMapFailed {
        /// The location prototype.
        location: ProtoId,
        /// The failing map prototype.
        map: ProtoId,
        /// The underlying failure.
        reason: Box<ContentError>,
    },
    /// A persisted document lacks a required field.
    MissingField {
        /// Entity being restored.
        entity: u32,
        /// Missing field name.
        field: String,
    },
    /// A persisted document field has an unusable value.
    InvalidField {
        /// Entity being restored.
        entity: u32,
        /// Field name.
        field: String,
        /// Description of the problem.
        reason: String,
    },
    /// A restored map references a location that does not exist.
    LocationNotFound {
        /// The referenced location.
        location: LocationId,
    },
    /// An entity id is already in use.
    DuplicateId {
        /// The duplicated id.
        id: u32,
    },
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMapProto { proto } => write!(f, "unknown map prototype {proto}"),
            Self::UnknownLocationProto { proto } => {
                write!(f, "unknown location prototype {proto}")
            }
            Self::MissingStaticMap { proto, reason } => {
                write!(f, "static data for map prototype {proto} unavailable: {reason}")
            }
            Self::InvalidMapSize {
                proto,
                width,
                height,
            } => write!(f, "map prototype {proto} has invalid size {width}x{height}"),
            Self::HexOutOfRange { proto, what, hex } => {
                write!(f, "map prototype {proto}: {what} at {hex} is outside the map")
            }
            Self::LocationMapFailed {
                location,
                map,
                reason,
            } => write!(
                f,
                "location prototype {location}: map prototype {map} failed to load: {reason}"
            ),
            Self::MissingField { entity, field } => {
                write!(f, "entity {entity}: missing field '{field}'")
            }
            Self::InvalidField {
                entity,
                field,
                reason,
            } => write!(f, "entity {entity}: invalid field '{field}': {reason}"),
            Self::LocationNotFound { location } => write!(f, "location {location} not found"),
            Self::DuplicateId { id } => write!(f, "entity id {id} already in use"),
        }
    }
}

impl Error for ContentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::LocationMapFailed { reason, .. } => Some(reason.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_map_failure_exposes_source() {
        let inner = ContentError::UnknownMapProto { proto: ProtoId(3) };
        let err = ContentError::LocationMapFailed {
            location: ProtoId(1),
            map: ProtoId(3),
            reason: Box::new(inner.clone()),
        };
        let source = err.source().expect("source");
        assert_eq!(source.to_string(), inner.to_string());
        assert!(err.to_string().contains("map prototype 3"));
    }
}
