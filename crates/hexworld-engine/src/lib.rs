//! World orchestration for hexworld: the [`MapManager`].
//!
//! The manager owns every [`RuntimeMap`](hexworld_map::RuntimeMap), every
//! [`Location`] and every critter standing on the global map. It is the
//! single writer for cross-container moves, so a critter is always in
//! exactly one place.
//!
//! Observable changes leave through the
//! [`WorldEvents`](hexworld_core::WorldEvents) sink handed to
//! [`MapManager::new`].
//!
//! ```text
//!            ┌──────────── MapManager ─────────────┐
//! config ──▶ │ protos ─▶ static cache ─▶ maps      │ ──▶ WorldEvents
//!            │ locations   global critters         │
//!            │ whereabouts  path pool + finder     │
//!            └─────────────────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
mod lifecycle;
pub mod location;
pub mod manager;
mod transit;
mod visibility;
pub mod zones;

pub use config::{ConfigError, CritterConfig, EngineConfig, GlobalMapConfig, PathConfig, MAX_MULTIHEX};
pub use error::TransitError;
pub use location::{Location, LocationProto};
pub use manager::MapManager;
pub use zones::{is_intersect_zone, zone_of, WorldArea};
