//! Direction, distance and angle math for both grid layouts.

use hexworld_core::HexPos;
use smallvec::SmallVec;
use std::fmt;

/// Flat-top hex offsets in axial `(dq, dr)` order: NE, SE, S, SW, NW, N.
///
/// Directions are numbered clockwise starting at north-east, so the
/// reverse of `d` is `(d + 3) % 6`.
const HEX_AXIAL_OFFSETS: [(i32, i32); 6] = [
    (1, -1), // NE
    (1, 0),  // SE
    (0, 1),  // S
    (-1, 1), // SW
    (-1, 0), // NW
    (0, -1), // N
];

/// Square offsets in `(dx, dy)` order: NE, E, SE, S, SW, W, NW, N.
const SQUARE_OFFSETS: [(i32, i32); 8] = [
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
];

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Grid topology of a map.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GridLayout {
    /// Six-direction flat-top hex grid, odd columns shifted down by half a hex.
    #[default]
    Hexagonal,
    /// Eight-direction square grid.
    Square,
}

impl fmt::Display for GridLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hexagonal => write!(f, "hexagonal"),
            Self::Square => write!(f, "square"),
        }
    }
}

/// Coordinate math for one [`GridLayout`].
///
/// Cheap to copy; every component that needs geometry keeps its own copy
/// rather than reaching for a global.
///
/// # Examples
///
/// ```
/// use hexworld_core::HexPos;
/// use hexworld_space::HexGeometry;
///
/// let geom = HexGeometry::hexagonal();
/// assert_eq!(geom.dir_count(), 6);
///
/// let a = HexPos::new(4, 4);
/// let b = geom.move_by_dir(a, 1, 10, 10).unwrap();
/// assert_eq!(geom.distance(a, b), 1);
/// assert_eq!(geom.direction(a, b), 1);
/// assert_eq!(geom.reverse_dir(1), 4);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HexGeometry {
    layout: GridLayout,
}

impl HexGeometry {
    /// Geometry for the given layout.
    pub const fn new(layout: GridLayout) -> Self {
        Self { layout }
    }

    /// Six-direction hex geometry.
    pub const fn hexagonal() -> Self {
        Self::new(GridLayout::Hexagonal)
    }

    /// Eight-direction square geometry.
    pub const fn square() -> Self {
        Self::new(GridLayout::Square)
    }

    /// The layout this geometry computes for.
    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    /// Number of movement directions (6 or 8).
    pub fn dir_count(&self) -> u8 {
        match self.layout {
            GridLayout::Hexagonal => 6,
            GridLayout::Square => 8,
        }
    }

    /// The opposite direction.
    pub fn reverse_dir(&self, dir: u8) -> u8 {
        let n = self.dir_count();
        (dir % n + n / 2) % n
    }

    // ── Coordinate conversion ───────────────────────────────────

    /// Offset `(x, y)` to axial `(q, r)`. Identity on the square layout.
    pub fn to_axial(&self, x: i32, y: i32) -> (i32, i32) {
        match self.layout {
            GridLayout::Hexagonal => (x, y - (x - (x & 1)) / 2),
            GridLayout::Square => (x, y),
        }
    }

    /// Axial `(q, r)` back to offset `(x, y)`.
    pub fn from_axial(&self, q: i32, r: i32) -> (i32, i32) {
        match self.layout {
            GridLayout::Hexagonal => (q, r + (q - (q & 1)) / 2),
            GridLayout::Square => (q, r),
        }
    }

    /// Centre of a hex in abstract pixel space (adjacent hex centres are
    /// `sqrt(3)` apart on the hex layout and 1 apart orthogonally on the
    /// square layout). `y` grows downwards.
    pub fn pixel_center(&self, x: i32, y: i32) -> (f64, f64) {
        match self.layout {
            GridLayout::Hexagonal => (
                1.5 * f64::from(x),
                SQRT_3 * (f64::from(y) + 0.5 * f64::from(x & 1)),
            ),
            GridLayout::Square => (f64::from(x), f64::from(y)),
        }
    }

    /// The hex whose centre is nearest to a pixel-space point.
    pub fn hex_at_pixel(&self, px: f64, py: f64) -> (i32, i32) {
        match self.layout {
            GridLayout::Hexagonal => {
                let q = px / 1.5;
                let r = py / SQRT_3 - q / 2.0;
                let (q, r) = cube_round(q, r);
                self.from_axial(q, r)
            }
            GridLayout::Square => (px.round() as i32, py.round() as i32),
        }
    }

    // ── Movement ────────────────────────────────────────────────

    /// Step one hex in `dir` without any range check.
    pub fn move_by_dir_unchecked(&self, x: i32, y: i32, dir: u8) -> (i32, i32) {
        match self.layout {
            GridLayout::Hexagonal => {
                let (dq, dr) = HEX_AXIAL_OFFSETS[(dir % 6) as usize];
                let (q, r) = self.to_axial(x, y);
                self.from_axial(q + dq, r + dr)
            }
            GridLayout::Square => {
                let (dx, dy) = SQUARE_OFFSETS[(dir % 8) as usize];
                (x + dx, y + dy)
            }
        }
    }

    /// Step one hex in `dir`, returning `None` when the result falls
    /// outside a `width × height` map.
    pub fn move_by_dir(&self, pos: HexPos, dir: u8, width: u16, height: u16) -> Option<HexPos> {
        let (x, y) = pos.signed();
        let (nx, ny) = self.move_by_dir_unchecked(x, y, dir);
        HexPos::from_signed(nx, ny, width, height)
    }

    /// All direct neighbours in direction order, unfiltered.
    pub fn neighbours(&self, x: i32, y: i32) -> SmallVec<[(i32, i32); 8]> {
        (0..self.dir_count())
            .map(|dir| self.move_by_dir_unchecked(x, y, dir))
            .collect()
    }

    // ── Distance & direction ────────────────────────────────────

    /// Grid distance between signed coordinates.
    pub fn distance_xy(&self, x1: i32, y1: i32, x2: i32, y2: i32) -> u32 {
        match self.layout {
            GridLayout::Hexagonal => {
                let (q1, r1) = self.to_axial(x1, y1);
                let (q2, r2) = self.to_axial(x2, y2);
                let dq = (q1 - q2).abs();
                let dr = (r1 - r2).abs();
                let ds = ((q1 + r1) - (q2 + r2)).abs();
                dq.max(dr).max(ds) as u32
            }
            GridLayout::Square => (x1 - x2).abs().max((y1 - y2).abs()) as u32,
        }
    }

    /// Grid distance: cube distance on hexes, Chebyshev on squares.
    pub fn distance(&self, a: HexPos, b: HexPos) -> u32 {
        let (x1, y1) = a.signed();
        let (x2, y2) = b.signed();
        self.distance_xy(x1, y1, x2, y2)
    }

    /// Whether `a` and `b` are at most `dist` apart.
    pub fn check_dist(&self, a: HexPos, b: HexPos, dist: u32) -> bool {
        self.distance(a, b) <= dist
    }

    /// Screen angle from `from` to `to` in degrees, `[0, 360)`.
    ///
    /// 0 points east (+x) and angles grow clockwise on screen. Equal
    /// coordinates yield 0.
    pub fn angle(&self, from: HexPos, to: HexPos) -> f32 {
        let (fx, fy) = from.signed();
        let (tx, ty) = to.signed();
        self.angle_xy(fx, fy, tx, ty) as f32
    }

    fn angle_xy(&self, fx: i32, fy: i32, tx: i32, ty: i32) -> f64 {
        let (ax, ay) = self.pixel_center(fx, fy);
        let (bx, by) = self.pixel_center(tx, ty);
        let deg = (by - ay).atan2(bx - ax).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }

    /// The direction whose sector contains the line `from → to`.
    ///
    /// For a direct neighbour this is exactly the direction that reaches
    /// it. Equal coordinates yield 0.
    pub fn direction(&self, from: HexPos, to: HexPos) -> u8 {
        if from == to {
            return 0;
        }
        let (fx, fy) = from.signed();
        let (tx, ty) = to.signed();
        self.direction_for_angle(self.angle_xy(fx, fy, tx, ty) as f32)
    }

    /// Map a screen angle (degrees) to the direction whose sector holds it.
    pub fn direction_for_angle(&self, degrees: f32) -> u8 {
        let a = f64::from(degrees).rem_euclid(360.0);
        match self.layout {
            // Sector centres: SE 30, S 90, SW 150, NW 210, N 270, NE 330.
            GridLayout::Hexagonal => (((a / 60.0).floor() as u8) + 1) % 6,
            // Sector centres: E 0, SE 45, ... NE 315.
            GridLayout::Square => ((((a + 22.5) / 45.0).floor() as u8) + 1) % 8,
        }
    }

    /// The hex `dist` hexes away from `from` along a screen angle.
    ///
    /// The result may lie outside the map. On the hex layout the projected
    /// point is far enough that the grid distance is at least `dist`.
    pub fn hex_at_angle(&self, from: HexPos, degrees: f32, dist: u32) -> (i32, i32) {
        let (x, y) = from.signed();
        let (px, py) = self.pixel_center(x, y);
        let rad = f64::from(degrees).to_radians();
        let (sin, cos) = rad.sin_cos();
        let scale = match self.layout {
            GridLayout::Hexagonal => SQRT_3 * (f64::from(dist) + 1.0),
            GridLayout::Square => f64::from(dist) / cos.abs().max(sin.abs()),
        };
        self.hex_at_pixel(px + cos * scale, py + sin * scale)
    }

    // ── Rings & disks ───────────────────────────────────────────

    /// Hexes at exactly `radius` from `(x, y)`, unfiltered.
    ///
    /// Hex rings hold `6 * radius` hexes, square rings `8 * radius`.
    /// Radius 0 yields the centre alone.
    pub fn ring(&self, x: i32, y: i32, radius: u32) -> Vec<(i32, i32)> {
        if radius == 0 {
            return vec![(x, y)];
        }
        let k = radius as i32;
        match self.layout {
            GridLayout::Hexagonal => {
                let mut out = Vec::with_capacity(6 * radius as usize);
                let (q, r) = self.to_axial(x, y);
                let (sq, sr) = HEX_AXIAL_OFFSETS[4];
                let (mut cq, mut cr) = (q + sq * k, r + sr * k);
                for (dq, dr) in HEX_AXIAL_OFFSETS {
                    for _ in 0..k {
                        out.push(self.from_axial(cq, cr));
                        cq += dq;
                        cr += dr;
                    }
                }
                out
            }
            GridLayout::Square => {
                let mut out = Vec::with_capacity(8 * radius as usize);
                let (mut cx, mut cy) = (x - k, y - k);
                for (dx, dy) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
                    for _ in 0..2 * k {
                        out.push((cx, cy));
                        cx += dx;
                        cy += dy;
                    }
                }
                out
            }
        }
    }

    /// Every hex within `radius` of `(x, y)`, centre first then ring by ring.
    pub fn disk(&self, x: i32, y: i32, radius: u32) -> Vec<(i32, i32)> {
        let mut out = vec![(x, y)];
        for k in 1..=radius {
            out.extend(self.ring(x, y, k));
        }
        out
    }

    /// Hexes a footprint of `radius` newly covers when its centre steps
    /// from `(x, y)` in `dir`: the disk around the new centre minus the
    /// disk around the old one.
    pub fn newly_covered(&self, x: i32, y: i32, dir: u8, radius: u32) -> Vec<(i32, i32)> {
        let (nx, ny) = self.move_by_dir_unchecked(x, y, dir);
        if radius == 0 {
            return vec![(nx, ny)];
        }
        self.ring(nx, ny, radius)
            .into_iter()
            .chain(std::iter::once((nx, ny)))
            .filter(|&(hx, hy)| self.distance_xy(x, y, hx, hy) > radius)
            .collect()
    }
}

/// Round fractional axial coordinates to the nearest hex.
pub(crate) fn cube_round(q: f64, r: f64) -> (i32, i32) {
    let s = -q - r;
    let mut rq = q.round();
    let mut rr = r.round();
    let rs = s.round();
    let dq = (rq - q).abs();
    let dr = (rr - r).abs();
    let ds = (rs - s).abs();
    if dq > dr && dq > ds {
        rq = -rr - rs;
    } else if dr > ds {
        rr = -rq - rs;
    }
    (rq as i32, rr as i32)
}
