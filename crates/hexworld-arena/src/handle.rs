//! Path tokens.
//!
//! A [`PathToken`] names one slot of the pool at one generation. The
//! generation allows O(1) staleness checks without a lookup table.

use std::fmt;

/// Handle to a stored path.
///
/// Valid until the pool recycles its slot, i.e. for at most `capacity`
/// subsequent stores, or until it is released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[must_use]
pub struct PathToken {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl PathToken {
    pub(crate) fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index within the pool.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Slot generation this token was issued for.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathToken(slot={}, gen={})", self.index, self.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_accessors() {
        let t = PathToken::new(3, 42);
        assert_eq!(t.index(), 3);
        assert_eq!(t.generation(), 42);
        assert_eq!(t.to_string(), "PathToken(slot=3, gen=42)");
    }
}
