//! Hex grid geometry for hexworld maps.
//!
//! Everything here is pure and side-effect free: direction offsets,
//! distances, direction and angle between hexes, rings and disks, and the
//! straight-line hex walk used by bullet tracing.
//!
//! # Layouts
//!
//! - [`GridLayout::Hexagonal`]: flat-top hexes in an odd-column offset
//!   grid, six directions, cube distance.
//! - [`GridLayout::Square`]: square cells, eight directions, Chebyshev
//!   distance.
//!
//! Callers are responsible for range-checking coordinates against their
//! map; the signed `(i32, i32)` helpers happily produce coordinates
//! outside any map.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod geometry;
pub mod line;

pub use geometry::{GridLayout, HexGeometry};
pub use line::LineWalk;
