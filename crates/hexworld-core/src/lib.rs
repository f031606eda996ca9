//! Core types and traits for hexworld maps.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the identifiers, hex coordinates, persistence documents, error types
//! and the outbound event trait shared by every other hexworld crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod document;
pub mod error;
pub mod events;
pub mod hex;
pub mod id;

pub use document::{DocValue, Document};
pub use error::ContentError;
pub use events::{NullEvents, WorldEvents};
pub use hex::HexPos;
pub use id::{CritterId, ItemId, LocationId, MapId, ProtoId};
