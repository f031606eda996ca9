//! Hexworld: the map simulation core of a hex-grid multiplayer game server.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all hexworld sub-crates. For most users, adding `hexworld` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use hexworld::prelude::*;
//!
//! let mut manager = MapManager::new(EngineConfig::default(), Box::new(NullEvents)).unwrap();
//! manager.register_map_proto(MapProto::new(ProtoId(1), 32, 32));
//! manager.register_location_proto(LocationProto::new(ProtoId(100), [ProtoId(1)]));
//!
//! let town = manager.create_location(ProtoId(100), 40, 40).unwrap();
//! let street = manager.get_location(town).unwrap().maps[0];
//!
//! let hero = manager.new_critter_id();
//! manager
//!     .add_cr_to_map(Critter::player(hero, ProtoId(7)), None, HexPos::default(), 0)
//!     .unwrap();
//! let hex = manager.transit(hero, street, HexPos::new(4, 4), 0, 2, false).unwrap();
//!
//! let request = PathRequest::new(hex, HexPos::new(10, 4)).moving(hero);
//! match manager.find_path(street, &request) {
//!     PathOutcome::Found(found) => assert_eq!(found.target, HexPos::new(10, 4)),
//!     other => panic!("no path: {other:?}"),
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `hexworld-core` | Ids, `HexPos`, `Document`, content errors, `WorldEvents` |
//! | [`space`] | `hexworld-space` | Hex geometry and line walking |
//! | [`arena`] | `hexworld-arena` | Generation-checked path pool |
//! | [`map`] | `hexworld-map` | Hex flags, static map data, runtime maps, entities |
//! | [`nav`] | `hexworld-nav` | Path finding and bullet tracing |
//! | [`engine`] | `hexworld-engine` | Map manager, locations, transit, zones |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Ids, positions, documents and the outbound event trait (`hexworld-core`).
pub use hexworld_core as types;

/// Hex grid geometry (`hexworld-space`).
///
/// [`space::HexGeometry`] answers neighbour, distance, ring and direction
/// questions; [`space::LineWalk`] steps along a straight line.
pub use hexworld_space as space;

/// Path storage (`hexworld-arena`).
pub use hexworld_arena as arena;

/// Per-map state (`hexworld-map`).
///
/// [`map::StaticMapData`] is shared between every instance of a
/// prototype; [`map::RuntimeMap`] layers critters, items and dynamic
/// flags on top.
pub use hexworld_map as map;

/// Movement and line-of-fire queries (`hexworld-nav`).
pub use hexworld_nav as nav;

/// World orchestration (`hexworld-engine`).
///
/// [`engine::MapManager`] owns every map, location and global-map critter.
pub use hexworld_engine as engine;

/// Common imports for typical hexworld usage.
///
/// ```rust
/// use hexworld::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use hexworld_core::{
        ContentError, CritterId, DocValue, Document, HexPos, ItemId, LocationId, MapId,
        NullEvents, ProtoId, WorldEvents,
    };

    // Geometry
    pub use hexworld_space::{GridLayout, HexGeometry};

    // Paths
    pub use hexworld_arena::{ArenaError, PathToken};
    pub use hexworld_nav::{
        OccupantPolicy, PathOutcome, PathRequest, PathStep, TraceRequest, TraceResult,
    };

    // Maps and entities
    pub use hexworld_map::{
        Critter, HexFlags, Item, ItemProto, MapProto, PlaceError, RuntimeMap, StaticMapData,
    };

    // Engine
    pub use hexworld_engine::{EngineConfig, Location, LocationProto, MapManager, TransitError};
}
