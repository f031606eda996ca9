//! Straight-line hex walking.
//!
//! [`LineWalk`] samples the ideal continuous line between two hex centres
//! and yields the nearest hex at each step. Sampling continues past the
//! target along the same line, so a tracer can shoot "through" its aim
//! point up to any distance.

use crate::geometry::{cube_round, GridLayout, HexGeometry};

/// Tie-break nudge applied to the start point so samples never land
/// exactly on a hex edge.
const NUDGE_A: f64 = 1e-6;
const NUDGE_B: f64 = 2e-6;

/// Iterator over the hexes of a straight line, excluding the start hex.
///
/// The step count between the endpoints equals their grid distance `n`,
/// so the first `n` yielded hexes end exactly on the target and each is
/// adjacent to the one before. Beyond the target the walk keeps going
/// indefinitely; callers bound it with [`Iterator::take`]. A line whose
/// endpoints coincide yields nothing.
///
/// ```
/// use hexworld_space::{HexGeometry, LineWalk};
///
/// let geom = HexGeometry::hexagonal();
/// let hexes: Vec<_> = LineWalk::new(geom, (2, 2), (2, 6)).take(4).collect();
/// assert_eq!(hexes, vec![(2, 3), (2, 4), (2, 5), (2, 6)]);
/// ```
#[derive(Clone, Debug)]
pub struct LineWalk {
    geom: HexGeometry,
    origin: (f64, f64),
    delta: (f64, f64),
    steps: u32,
    taken: u32,
}

impl LineWalk {
    /// Walk from `from` towards `to` (signed offset coordinates).
    pub fn new(geom: HexGeometry, from: (i32, i32), to: (i32, i32)) -> Self {
        let steps = geom.distance_xy(from.0, from.1, to.0, to.1);
        let (a, b) = match geom.layout() {
            GridLayout::Hexagonal => (geom.to_axial(from.0, from.1), geom.to_axial(to.0, to.1)),
            GridLayout::Square => (from, to),
        };
        let origin = (f64::from(a.0) + NUDGE_A, f64::from(a.1) + NUDGE_B);
        let delta = if steps == 0 {
            (0.0, 0.0)
        } else {
            let n = f64::from(steps);
            (f64::from(b.0 - a.0) / n, f64::from(b.1 - a.1) / n)
        };
        Self {
            geom,
            origin,
            delta,
            steps,
            taken: 0,
        }
    }

    /// Grid distance between the endpoints.
    pub fn steps_to_target(&self) -> u32 {
        self.steps
    }

    /// Whether the endpoints coincide (the walk is empty).
    pub fn is_degenerate(&self) -> bool {
        self.steps == 0
    }
}

impl Iterator for LineWalk {
    type Item = (i32, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.steps == 0 {
            return None;
        }
        self.taken = self.taken.checked_add(1)?;
        let t = f64::from(self.taken);
        let u = self.origin.0 + self.delta.0 * t;
        let v = self.origin.1 + self.delta.1 * t;
        Some(match self.geom.layout() {
            GridLayout::Hexagonal => {
                let (q, r) = cube_round(u, v);
                self.geom.from_axial(q, r)
            }
            GridLayout::Square => (u.round() as i32, v.round() as i32),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn degenerate_line_is_empty() {
        let mut walk = LineWalk::new(HexGeometry::hexagonal(), (3, 3), (3, 3));
        assert!(walk.is_degenerate());
        assert_eq!(walk.next(), None);
    }

    #[test]
    fn square_diagonal_line() {
        let walk = LineWalk::new(HexGeometry::square(), (0, 0), (3, 3));
        let hexes: Vec<_> = walk.take(3).collect();
        assert_eq!(hexes, vec![(1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn walk_continues_past_target() {
        let geom = HexGeometry::hexagonal();
        let hexes: Vec<_> = LineWalk::new(geom, (4, 4), (4, 6)).take(5).collect();
        assert_eq!(hexes, vec![(4, 5), (4, 6), (4, 7), (4, 8), (4, 9)]);
    }

    proptest! {
        #[test]
        fn line_hits_target_with_adjacent_steps(
            square in any::<bool>(),
            ax in -30i32..30, ay in -30i32..30,
            bx in -30i32..30, by in -30i32..30,
            extra in 0u32..10,
        ) {
            let geom = if square { HexGeometry::square() } else { HexGeometry::hexagonal() };
            let walk = LineWalk::new(geom, (ax, ay), (bx, by));
            let n = walk.steps_to_target();
            prop_assume!(n > 0);
            let hexes: Vec<_> = walk.take((n + extra) as usize).collect();
            prop_assert_eq!(hexes[(n - 1) as usize], (bx, by));
            let mut prev = (ax, ay);
            for (i, &hex) in hexes.iter().enumerate() {
                prop_assert_eq!(geom.distance_xy(prev.0, prev.1, hex.0, hex.1), 1, "step {}", i);
                prop_assert_eq!(geom.distance_xy(ax, ay, hex.0, hex.1), i as u32 + 1);
                prev = hex;
            }
        }
    }
}
