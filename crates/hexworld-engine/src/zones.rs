//! World-map zone arithmetic.
//!
//! The world map is cut into square zones of `zone_length` units. A
//! location covers the zones its `(x ± radius, y ± radius)` box touches.

/// A world-map position with a radius.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldArea {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
    /// Radius in world units.
    pub radius: i32,
}

impl WorldArea {
    /// An area centred on `(x, y)`.
    pub fn new(x: i32, y: i32, radius: i32) -> Self {
        Self { x, y, radius }
    }

    /// Inclusive zone box `(left, top, right, bottom)`, widened by `grow` zones.
    fn zone_box(self, zone_length: i32, grow: i32) -> (i32, i32, i32, i32) {
        (
            (self.x - self.radius).div_euclid(zone_length) - grow,
            (self.y - self.radius).div_euclid(zone_length) - grow,
            (self.x + self.radius).div_euclid(zone_length) + grow,
            (self.y + self.radius).div_euclid(zone_length) + grow,
        )
    }
}

/// Whether the zones `a` covers, widened by `zones`, overlap the zones `b` covers.
///
/// # Panics
///
/// Panics if `zone_length` is zero.
pub fn is_intersect_zone(a: WorldArea, b: WorldArea, zones: i32, zone_length: u32) -> bool {
    assert!(zone_length > 0, "zone_length must be at least 1");
    let zl = i32::try_from(zone_length).unwrap_or(i32::MAX);
    let (l1, t1, r1, b1) = a.zone_box(zl, zones);
    let (l2, t2, r2, b2) = b.zone_box(zl, 0);
    l1 <= r2 && l2 <= r1 && t1 <= b2 && t2 <= b1
}

/// Zone containing world position `(x, y)`.
pub fn zone_of(x: i32, y: i32, zone_length: u32) -> (i32, i32) {
    let zl = i32::try_from(zone_length.max(1)).unwrap_or(i32::MAX);
    (x.div_euclid(zl), y.div_euclid(zl))
}
