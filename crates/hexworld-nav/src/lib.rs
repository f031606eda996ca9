//! Movement and line-of-fire queries over hexworld runtime maps.
//!
//! Both services are read-only with respect to the map:
//!
//! - [`PathFinder`] searches for a walkable route, honouring multihex
//!   footprints, step-over policies for critters and gag items, and an
//!   optional "stop where the target can be shot" goal.
//! - [`trace_bullet`] walks a straight line and reports what it crosses.
//!
//! ```text
//! PathRequest ──▶ PathFinder::find ──▶ PathOutcome<Vec<PathStep>>
//!                      │
//!                      └── trace goal ──▶ trace_bullet ◀── TraceRequest
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod pathfind;
pub mod tracer;

pub use pathfind::{
    Blocker, FoundPath, OccupantPolicy, PathFinder, PathLimits, PathOutcome, PathRequest,
    PathStep, Reach, TraceGoal, DEFAULT_MAX_EXPLORED, MAX_PATH_LEN,
};
pub use tracer::{
    trace_bullet, CritterFilter, HexCallback, TraceRequest, TraceResult, TraceTarget, TraceWants,
};
