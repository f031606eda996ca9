//! Hex coordinate type.

use std::fmt;

/// A hex coordinate `(x, y)` in an offset grid.
///
/// `x` is the column and `y` the row. Whether a coordinate is addressable
/// depends on the owning map's width and height; `HexPos` itself carries
/// no bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexPos {
    /// Column.
    pub x: u16,
    /// Row.
    pub y: u16,
}

impl HexPos {
    /// Create a coordinate.
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Convert signed coordinates, returning `None` if either is outside
    /// `0..width` / `0..height`.
    pub fn from_signed(x: i32, y: i32, width: u16, height: u16) -> Option<Self> {
        if x < 0 || y < 0 || x >= i32::from(width) || y >= i32::from(height) {
            return None;
        }
        Some(Self::new(x as u16, y as u16))
    }

    /// Whether this coordinate lies inside a `width × height` map.
    pub fn in_bounds(self, width: u16, height: u16) -> bool {
        self.x < width && self.y < height
    }

    /// Flat row-major index for a map of the given width.
    pub fn index(self, width: u16) -> usize {
        self.y as usize * width as usize + self.x as usize
    }

    /// Signed `(x, y)` pair for geometry arithmetic.
    pub fn signed(self) -> (i32, i32) {
        (i32::from(self.x), i32::from(self.y))
    }
}

impl fmt::Display for HexPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(u16, u16)> for HexPos {
    fn from((x, y): (u16, u16)) -> Self {
        Self::new(x, y)
    }
}
