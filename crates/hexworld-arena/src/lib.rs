//! Generation-checked recycling pool for in-flight path buffers.
//!
//! Completed paths are written into a bounded ring of reusable step
//! buffers. Callers hold a [`PathToken`] (slot index + generation) and
//! read the path back while the token is live. Once the ring wraps the
//! oldest slot is reused and its generation bumped, so a token that
//! outlived its slot is reported as [`ArenaError::StaleHandle`] instead
//! of silently reading someone else's path.
//!
//! ```text
//! PathPool
//! ├── Slot × capacity (lazily created, buffers reused)
//! │   ├── generation: u32 (bumped on every store/release)
//! │   └── data: Vec<T>
//! └── cursor (next slot to overwrite)
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod handle;
pub mod pool;

pub use config::PoolConfig;
pub use error::ArenaError;
pub use handle::PathToken;
pub use pool::PathPool;
