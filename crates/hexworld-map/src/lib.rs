//! Static map data and the runtime occupancy model for hexworld.
//!
//! A map prototype is baked once into a shared [`StaticMapData`]
//! (base hex flags plus scenery indexes). Each live instance is a
//! [`RuntimeMap`] layering a reference-counted [`FlagOverlay`] over
//! those base flags and owning the critters and items placed on it.
//!
//! ```text
//! MapProto ──build──▶ Arc<StaticMapData> ──┬──▶ RuntimeMap #1
//!                                          └──▶ RuntimeMap #2
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod entity;
pub mod error;
pub mod flags;
pub mod runtime_map;
pub mod static_map;
pub mod timers;

pub use entity::{Critter, CritterCondition, CritterKind, FindType, Item, ItemProto};
pub use error::{PlaceError, Rejected};
pub use flags::{FlagOverlay, HexFlags};
pub use runtime_map::RuntimeMap;
pub use static_map::{CritterSpawn, ItemSpawn, MapProto, MapTile, StaticItem, StaticMapData};
pub use timers::{LoopTimers, LOOP_COUNT};
