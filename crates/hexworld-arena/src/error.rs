//! Pool-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur when resolving a [`PathToken`](crate::PathToken).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The slot was recycled or released after the token was issued.
    StaleHandle {
        /// Slot index encoded in the token.
        index: u32,
        /// Generation encoded in the token.
        handle_generation: u32,
        /// Generation the slot holds now.
        current_generation: u32,
    },
    /// The token's index is outside this pool.
    InvalidIndex {
        /// Slot index encoded in the token.
        index: u32,
        /// Number of slots in the pool.
        capacity: u32,
    },
    /// A pool was configured with zero slots.
    ZeroCapacity,
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleHandle {
                index,
                handle_generation,
                current_generation,
            } => write!(
                f,
                "stale path token: slot {index} generation {handle_generation}, current {current_generation}"
            ),
            Self::InvalidIndex { index, capacity } => {
                write!(f, "path token index {index} outside pool of {capacity}")
            }
            Self::ZeroCapacity => write!(f, "path pool capacity must be at least 1"),
        }
    }
}

impl Error for ArenaError {}
