//! Per-hex flag bits and the reference-counted dynamic overlay.
//!
//! A hex's effective flags are its static base flags (baked from scenery
//! when the prototype is loaded) combined with dynamic bits contributed
//! by critters and items currently on the map. Several entities can
//! contribute the same dynamic bit to one hex, so every dynamic bit is
//! backed by a per-hex counter and stays set until the last contributor
//! is removed.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Bitset of hex flags.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HexFlags(u16);

impl HexFlags {
    /// Static scenery blocks walking.
    pub const SCEN_BLOCK: Self = Self(1 << 0);
    /// Static scenery blocks shooting and sight.
    pub const SCEN_NO_SHOOT: Self = Self(1 << 1);
    /// Static trigger scenery lies on the hex.
    pub const SCEN_TRIGGER: Self = Self(1 << 2);

    /// A living or knocked-out critter covers the hex.
    pub const CRITTER: Self = Self(1 << 8);
    /// A dead critter lies on the hex.
    pub const DEAD_CRITTER: Self = Self(1 << 9);
    /// A blocking item lies on the hex.
    pub const ITEM_BLOCK: Self = Self(1 << 10);
    /// An item that stops shots lies on the hex.
    pub const ITEM_NO_SHOOT: Self = Self(1 << 11);
    /// A gag item reserves the hex.
    pub const GAG_ITEM: Self = Self(1 << 12);
    /// A trigger item lies on the hex.
    pub const TRIGGER_ITEM: Self = Self(1 << 13);
    /// An item's block line crosses the hex.
    pub const BLOCK_LINE: Self = Self(1 << 14);

    /// Bits that make a hex impassable.
    pub const NO_WAY: Self = Self(
        Self::SCEN_BLOCK.0
            | Self::CRITTER.0
            | Self::ITEM_BLOCK.0
            | Self::GAG_ITEM.0
            | Self::BLOCK_LINE.0,
    );
    /// Bits that stop a bullet trace.
    pub const NO_SHOOT: Self = Self(Self::SCEN_NO_SHOOT.0 | Self::ITEM_NO_SHOOT.0);

    /// Bits owned by static scenery.
    pub const STATIC_MASK: Self = Self(0x00ff);
    /// Bits owned by dynamic contributors.
    pub const DYNAMIC_MASK: Self = Self(0xff00);

    /// No flags set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Raw bit pattern.
    pub const fn bits(self) -> u16 {
        self.0
    }

    /// Flags from a raw bit pattern.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Whether every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Whether no bits are set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Set or clear `other`.
    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl BitOr for HexFlags {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for HexFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for HexFlags {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for HexFlags {
    type Output = Self;
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for HexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HexFlags({:#06x})", self.0)
    }
}

/// Dynamic bits in counter order.
const DYNAMIC_BITS: [HexFlags; 7] = [
    HexFlags::CRITTER,
    HexFlags::DEAD_CRITTER,
    HexFlags::ITEM_BLOCK,
    HexFlags::ITEM_NO_SHOOT,
    HexFlags::GAG_ITEM,
    HexFlags::TRIGGER_ITEM,
    HexFlags::BLOCK_LINE,
];

/// Reference counts for the dynamic bits of every hex, plus the cached
/// effective flags.
///
/// Indexed by [`HexPos::index`](hexworld_core::HexPos::index). The cache
/// is refreshed by [`recache`](Self::recache), which callers run after
/// every count change on a hex.
#[derive(Clone, Debug)]
pub struct FlagOverlay {
    counts: Vec<[u16; 7]>,
    cached: Vec<HexFlags>,
}

impl FlagOverlay {
    /// Overlay with zero counts, cache seeded from the static base flags.
    pub fn new(base: &[HexFlags]) -> Self {
        Self {
            counts: vec![[0; 7]; base.len()],
            cached: base.to_vec(),
        }
    }

    /// Number of hexes covered.
    pub fn len(&self) -> usize {
        self.cached.len()
    }

    /// Whether the overlay covers no hexes.
    pub fn is_empty(&self) -> bool {
        self.cached.is_empty()
    }

    /// Cached effective flags of a hex.
    pub fn get(&self, index: usize) -> HexFlags {
        self.cached[index]
    }

    /// Current contributor count of one dynamic bit.
    ///
    /// # Panics
    ///
    /// Panics if `flag` is not exactly one dynamic bit.
    pub fn count(&self, index: usize, flag: HexFlags) -> u16 {
        self.counts[index][slot_of(flag)]
    }

    /// Add one contributor for every dynamic bit in `flags`.
    ///
    /// # Panics
    ///
    /// Panics if `flags` contains static bits.
    pub fn increment(&mut self, index: usize, flags: HexFlags) {
        assert_dynamic(flags);
        let counts = &mut self.counts[index];
        for (slot, bit) in DYNAMIC_BITS.iter().enumerate() {
            if flags.contains(*bit) {
                counts[slot] += 1;
            }
        }
    }

    /// Remove one contributor for every dynamic bit in `flags`.
    ///
    /// # Panics
    ///
    /// Panics if a bit has no contributor left to remove; that means an
    /// entity is being erased twice or was never registered.
    pub fn decrement(&mut self, index: usize, flags: HexFlags) {
        assert_dynamic(flags);
        let counts = &mut self.counts[index];
        for (slot, bit) in DYNAMIC_BITS.iter().enumerate() {
            if flags.contains(*bit) {
                assert!(
                    counts[slot] > 0,
                    "unset of {bit:?} at hex index {index} without a matching set"
                );
                counts[slot] -= 1;
            }
        }
    }

    /// Dynamic bits with a non-zero count.
    pub fn dynamic(&self, index: usize) -> HexFlags {
        let counts = &self.counts[index];
        DYNAMIC_BITS
            .iter()
            .zip(counts)
            .filter(|&(_, &c)| c > 0)
            .fold(HexFlags::empty(), |acc, (bit, _)| acc | *bit)
    }

    /// Recompute the cached flags of a hex from `base` and the counts.
    pub fn recache(&mut self, index: usize, base: HexFlags) -> HexFlags {
        let flags = (base & HexFlags::STATIC_MASK) | self.dynamic(index);
        self.cached[index] = flags;
        flags
    }
}

fn slot_of(flag: HexFlags) -> usize {
    DYNAMIC_BITS
        .iter()
        .position(|b| *b == flag)
        .unwrap_or_else(|| panic!("{flag:?} is not a single dynamic flag"))
}

fn assert_dynamic(flags: HexFlags) {
    assert!(
        (flags & HexFlags::STATIC_MASK).is_empty(),
        "static flags {flags:?} cannot be reference-counted"
    );
}
