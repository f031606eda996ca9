//! Bounded shortest-path search over a runtime map.
//!
//! [`PathFinder::find`] runs a bucketed Dijkstra from the origin. Every
//! step costs 1, plus a penalty when it crosses a critter or gag item the
//! request allows stepping over; with no penalties the search is a plain
//! breadth-first expansion. The search ends when a hex within `cut` of
//! the destination is settled, when the explored-node budget runs out,
//! or when the frontier empties.
//!
//! Classification happens in this order:
//!
//! 1. invalid coordinates → [`PathOutcome::InvalidHexes`]
//! 2. origin within `cut` of destination → [`PathOutcome::AlreadyHere`]
//! 3. destination farther than the path length limit → [`PathOutcome::TooFar`]
//! 4. destination footprint held by a dynamic occupant (cut 0) → [`PathOutcome::HexBusy`]
//! 5. every neighbour of the destination blocked, at least one of them
//!    dynamically (cut ≤ 1) → [`PathOutcome::HexBusyRing`]
//! 6. search, trace-back, occupant truncation, trace goal.
//!
//! The trace-back only follows cheapest predecessors, so the route is
//! already as short as it can be. Smoothing is the choice among equally
//! cheap predecessors: the scan order flips after every tie, turning a
//! diagonal into a zig-zag rather than an L, and the smooth switcher
//! picks which mirror image comes out.

use hexworld_core::{CritterId, HexPos, ItemId};
use hexworld_map::{HexFlags, RuntimeMap};
use smallvec::SmallVec;
use tracing::debug;

use crate::tracer::{trace_bullet, TraceRequest};

/// Longest path, in steps, the finder will produce.
pub const MAX_PATH_LEN: u32 = 400;

/// Default explored-node budget per search.
pub const DEFAULT_MAX_EXPLORED: usize = 40_000;

/// Search bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathLimits {
    /// Longest path in steps. Default: [`MAX_PATH_LEN`].
    pub max_path_len: u32,
    /// Nodes settled before the search gives up. Default: [`DEFAULT_MAX_EXPLORED`].
    pub max_explored: usize,
}

impl Default for PathLimits {
    fn default() -> Self {
        Self {
            max_path_len: MAX_PATH_LEN,
            max_explored: DEFAULT_MAX_EXPLORED,
        }
    }
}

/// How the search treats hexes held by a kind of occupant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OccupantPolicy {
    /// Impassable.
    #[default]
    Block,
    /// Passable at `1 + penalty` per step. The returned path is cut
    /// before the first such hex and the occupant reported as blocker.
    StepOver {
        /// Extra cost of entering an occupied hex.
        penalty: u32,
    },
}

impl OccupantPolicy {
    fn penalty(self) -> Option<u32> {
        match self {
            Self::Block => None,
            Self::StepOver { penalty } => Some(penalty),
        }
    }
}

/// Shoot-from-path requirement: the path ends at the first hex from
/// which a bullet trace reaches `target`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceGoal {
    /// Critter that must be hittable.
    pub target: CritterId,
    /// Longest acceptable shot.
    pub max_dist: u32,
}

/// A path search request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathRequest {
    /// Start hex (the mover's centre).
    pub from: HexPos,
    /// Destination hex.
    pub to: HexPos,
    /// Mover's footprint radius.
    pub multihex: u32,
    /// Mark every step as running.
    pub run: bool,
    /// Stop once within this distance of `to`.
    pub cut: u32,
    /// The moving critter; its own footprint never blocks.
    pub mover: Option<CritterId>,
    /// Treatment of other critters.
    pub critters: OccupantPolicy,
    /// Treatment of gag items.
    pub gags: OccupantPolicy,
    /// Optional shoot-from-path requirement.
    pub trace: Option<TraceGoal>,
}

impl PathRequest {
    /// Walk from `from` to exactly `to`, blocked by critters and gags.
    pub fn new(from: HexPos, to: HexPos) -> Self {
        Self {
            from,
            to,
            multihex: 0,
            run: false,
            cut: 0,
            mover: None,
            critters: OccupantPolicy::Block,
            gags: OccupantPolicy::Block,
            trace: None,
        }
    }

    /// Builder: stop within `cut` hexes.
    pub fn with_cut(mut self, cut: u32) -> Self {
        self.cut = cut;
        self
    }

    /// Builder: mover footprint radius.
    pub fn with_multihex(mut self, multihex: u32) -> Self {
        self.multihex = multihex;
        self
    }

    /// Builder: moving critter.
    pub fn moving(mut self, mover: CritterId) -> Self {
        self.mover = Some(mover);
        self
    }

    /// Builder: run.
    pub fn running(mut self) -> Self {
        self.run = true;
        self
    }

    /// Builder: critter policy.
    pub fn critters(mut self, policy: OccupantPolicy) -> Self {
        self.critters = policy;
        self
    }

    /// Builder: gag item policy.
    pub fn gags(mut self, policy: OccupantPolicy) -> Self {
        self.gags = policy;
        self
    }

    /// Builder: trace goal.
    pub fn tracing(mut self, target: CritterId, max_dist: u32) -> Self {
        self.trace = Some(TraceGoal { target, max_dist });
        self
    }
}

/// One step of a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathStep {
    /// Hex entered.
    pub hex: HexPos,
    /// Direction of the step.
    pub dir: u8,
    /// Movement cost of this step.
    pub cost: u32,
    /// Running rather than walking.
    pub run: bool,
}

/// Occupant the path was cut short at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Blocker {
    /// A critter.
    Critter(CritterId),
    /// An item (gag or blocking).
    Item(ItemId),
}

/// How close a found path gets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reach {
    /// Ends on the destination.
    Exact,
    /// Ends short of it (within `cut`, before a blocker, or at a trace goal).
    CutShort,
}

/// A successful search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FoundPath<P> {
    /// The steps, or a handle to them.
    pub path: P,
    /// Exact or cut short.
    pub reach: Reach,
    /// Hex the path ends on.
    pub target: HexPos,
    /// Occupant the path stopped before.
    pub blocker: Option<Blocker>,
}

/// Result of a path search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathOutcome<P> {
    /// A path was found.
    Found(FoundPath<P>),
    /// The origin is already within `cut` of the destination.
    AlreadyHere,
    /// The map does not exist.
    MapNotFound,
    /// Origin or destination is off the map.
    InvalidHexes,
    /// A dynamic occupant holds the destination.
    HexBusy {
        /// The occupant, when identifiable.
        blocker: Option<Blocker>,
    },
    /// Every neighbour of the destination is blocked.
    HexBusyRing,
    /// The budget or path length limit ran out first.
    TooFar,
    /// No route exists.
    Deadlock,
    /// No hex on the path can hit the trace target.
    TraceFailed,
    /// The trace target is not on the map.
    TraceTargetMissing,
}

impl<P> PathOutcome<P> {
    /// Transform the path payload.
    pub fn map_path<Q>(self, f: impl FnOnce(P) -> Q) -> PathOutcome<Q> {
        match self {
            Self::Found(found) => PathOutcome::Found(FoundPath {
                path: f(found.path),
                reach: found.reach,
                target: found.target,
                blocker: found.blocker,
            }),
            Self::AlreadyHere => PathOutcome::AlreadyHere,
            Self::MapNotFound => PathOutcome::MapNotFound,
            Self::InvalidHexes => PathOutcome::InvalidHexes,
            Self::HexBusy { blocker } => PathOutcome::HexBusy { blocker },
            Self::HexBusyRing => PathOutcome::HexBusyRing,
            Self::TooFar => PathOutcome::TooFar,
            Self::Deadlock => PathOutcome::Deadlock,
            Self::TraceFailed => PathOutcome::TraceFailed,
            Self::TraceTargetMissing => PathOutcome::TraceTargetMissing,
        }
    }

    /// The found path, if any.
    pub fn found(&self) -> Option<&FoundPath<P>> {
        match self {
            Self::Found(found) => Some(found),
            _ => None,
        }
    }
}

/// Reusable path search state.
///
/// Per-hex scratch buffers are stamped with a search counter instead of
/// being cleared, so a search costs time proportional to the nodes it
/// touches rather than the map size.
#[derive(Debug)]
pub struct PathFinder {
    limits: PathLimits,
    smooth_switcher: bool,
    stamp: u32,
    seen: Vec<u32>,
    cost: Vec<u32>,
    steps: Vec<u32>,
    buckets: Vec<Vec<(usize, u32)>>,
}

impl PathFinder {
    /// A finder with the given bounds.
    pub fn new(limits: PathLimits) -> Self {
        Self {
            limits,
            smooth_switcher: false,
            stamp: 0,
            seen: Vec::new(),
            cost: Vec::new(),
            steps: Vec::new(),
            buckets: Vec::new(),
        }
    }

    /// Search bounds.
    pub fn limits(&self) -> PathLimits {
        self.limits
    }

    /// Current tie-break preference.
    pub fn smooth_switcher(&self) -> bool {
        self.smooth_switcher
    }

    /// Pin the tie-break preference (for reproducible paths).
    pub fn set_smooth_switcher(&mut self, on: bool) {
        self.smooth_switcher = on;
    }

    /// Find a path on `map`.
    ///
    /// Every successful trace-back toggles the smooth switcher, so
    /// consecutive equal requests alternate between mirror-image routes.
    pub fn find(&mut self, map: &RuntimeMap, req: &PathRequest) -> PathOutcome<Vec<PathStep>> {
        let outcome = self.find_inner(map, req);
        match &outcome {
            PathOutcome::Found(found) => debug!(
                map = %map.id(),
                from = %req.from,
                to = %req.to,
                steps = found.path.len(),
                reach = ?found.reach,
                "path found"
            ),
            other => debug!(
                map = %map.id(),
                from = %req.from,
                to = %req.to,
                outcome = ?other.clone().map_path(|_| ()),
                "path not found"
            ),
        }
        outcome
    }

    fn find_inner(&mut self, map: &RuntimeMap, req: &PathRequest) -> PathOutcome<Vec<PathStep>> {
        if !map.in_range(req.from) || !map.in_range(req.to) {
            return PathOutcome::InvalidHexes;
        }
        let geom = map.geometry();
        let dist = geom.distance(req.from, req.to);
        if dist <= req.cut {
            return PathOutcome::AlreadyHere;
        }
        if dist > self.limits.max_path_len + req.cut {
            return PathOutcome::TooFar;
        }
        let probe = Probe { map, req };
        if req.cut == 0 {
            if let Some(busy) = probe.destination_busy() {
                return busy;
            }
        }
        if req.cut <= 1 && req.multihex == 0 && probe.ring_busy() {
            return PathOutcome::HexBusyRing;
        }

        let end = match self.search(&probe) {
            Ok(end) => end,
            Err(outcome) => return outcome,
        };
        let mut steps = self.trace_back(&probe, end);
        self.smooth_switcher = !self.smooth_switcher;

        let blocker = truncate_at_occupant(&probe, &mut steps);
        if let Some(goal) = req.trace {
            let Some(target) = map.get_critter(goal.target) else {
                return PathOutcome::TraceTargetMissing;
            };
            let target_hex = target.hex;
            let hit = steps.iter().position(|s| {
                geom.distance(s.hex, target_hex) <= goal.max_dist
                    && can_hit(map, s.hex, target_hex, goal.target, req.mover)
            });
            match hit {
                Some(i) => steps.truncate(i + 1),
                None => return PathOutcome::TraceFailed,
            }
        }

        let target = steps.last().map_or(req.from, |s| s.hex);
        let reach = if target == req.to {
            Reach::Exact
        } else {
            Reach::CutShort
        };
        PathOutcome::Found(FoundPath {
            path: steps,
            reach,
            target,
            blocker,
        })
    }

    fn reset_scratch(&mut self, len: usize) {
        if self.seen.len() < len {
            self.seen.resize(len, 0);
            self.cost.resize(len, 0);
            self.steps.resize(len, 0);
        }
        self.stamp = self.stamp.wrapping_add(1);
        if self.stamp == 0 {
            self.seen.iter_mut().for_each(|s| *s = 0);
            self.stamp = 1;
        }
    }

    fn cost_of(&self, index: usize) -> Option<u32> {
        (self.seen[index] == self.stamp).then(|| self.cost[index])
    }

    /// Bucketed Dijkstra. Returns the settled end hex or a failure outcome.
    fn search(&mut self, probe: &Probe<'_>) -> Result<HexPos, PathOutcome<Vec<PathStep>>> {
        let map = probe.map;
        let req = probe.req;
        let geom = map.geometry();
        let width = map.width();
        self.reset_scratch(usize::from(width) * usize::from(map.height()));

        let max_step = 1 + req.critters.penalty().unwrap_or(0) + req.gags.penalty().unwrap_or(0);
        let nbuckets = max_step as usize + 1;
        self.buckets.iter_mut().for_each(Vec::clear);
        self.buckets.resize_with(nbuckets.max(self.buckets.len()), Vec::new);

        let start = req.from.index(width);
        self.seen[start] = self.stamp;
        self.cost[start] = 0;
        self.steps[start] = 0;
        self.buckets[0].push((start, 0));

        let mut pending = 1usize;
        let mut current = 0u32;
        let mut explored = 0usize;
        let mut limited = false;

        while pending > 0 {
            let slot = current as usize % nbuckets;
            let Some((index, cost)) = self.buckets[slot].pop() else {
                current += 1;
                continue;
            };
            pending -= 1;
            if self.cost_of(index) != Some(cost) {
                continue;
            }
            explored += 1;
            if explored > self.limits.max_explored {
                return Err(PathOutcome::TooFar);
            }

            let hex = HexPos::new((index % usize::from(width)) as u16, (index / usize::from(width)) as u16);
            if geom.distance(hex, req.to) <= req.cut {
                return Ok(hex);
            }
            let steps = self.steps[index];
            if steps >= self.limits.max_path_len {
                limited = true;
                continue;
            }
            for dir in 0..geom.dir_count() {
                let Some(next) = geom.move_by_dir(hex, dir, width, map.height()) else {
                    continue;
                };
                let Some(step_cost) = probe.step_cost(hex, dir) else {
                    continue;
                };
                let ni = next.index(width);
                let nc = cost + step_cost;
                if self.cost_of(ni).is_some_and(|c| c <= nc) {
                    continue;
                }
                self.seen[ni] = self.stamp;
                self.cost[ni] = nc;
                self.steps[ni] = steps + 1;
                self.buckets[nc as usize % nbuckets].push((ni, nc));
                pending += 1;
            }
        }
        Err(if limited {
            PathOutcome::TooFar
        } else {
            PathOutcome::Deadlock
        })
    }

    /// Walk settled costs back from `end` to the origin.
    ///
    /// Where several predecessors are equally cheap, the direction scan
    /// order decides: forward when the switcher is set, backward
    /// otherwise, flipping after every tie so diagonals come out as
    /// zig-zags instead of an L. A predecessor must also sit exactly one
    /// step closer to the origin, so the route never outgrows the length
    /// limit the search honoured.
    fn trace_back(&self, probe: &Probe<'_>, end: HexPos) -> Vec<PathStep> {
        let map = probe.map;
        let geom = map.geometry();
        let width = map.width();
        let n = geom.dir_count();
        let mut forward = self.smooth_switcher;
        let mut out = Vec::new();
        let mut cur = end;

        while cur != probe.req.from {
            let ci = cur.index(width);
            let (here, here_steps) = (self.cost[ci], self.steps[ci]);
            let candidates: SmallVec<[(HexPos, u8, u32); 8]> = (0..n)
                .filter_map(|d| {
                    let prev = geom.move_by_dir(cur, d, width, map.height())?;
                    let back = geom.reverse_dir(d);
                    let pi = prev.index(width);
                    let pc = self.cost_of(pi)?;
                    let sc = probe.step_cost(prev, back)?;
                    // hexes settled at the length limit were never expanded
                    (pc + sc == here && self.steps[pi] + 1 == here_steps)
                        .then_some((prev, back, sc))
                })
                .collect();
            let pick = if forward {
                candidates.first()
            } else {
                candidates.last()
            };
            let Some(&(prev, dir, cost)) = pick else {
                break;
            };
            if candidates.len() > 1 {
                forward = !forward;
            }
            out.push(PathStep {
                hex: cur,
                dir,
                cost,
                run: probe.req.run,
            });
            cur = prev;
        }
        out.reverse();
        out
    }
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new(PathLimits::default())
    }
}

/// Request-bound passability checks.
struct Probe<'a> {
    map: &'a RuntimeMap,
    req: &'a PathRequest,
}

impl Probe<'_> {
    /// Blocking bits of `hex` after discounting the mover's own footprint.
    fn blocking(&self, hex: HexPos) -> HexFlags {
        let mut flags = self.map.hex_flags(hex) & HexFlags::NO_WAY;
        if flags.contains(HexFlags::CRITTER) && self.only_mover(hex) {
            flags.set(HexFlags::CRITTER, false);
        }
        flags
    }

    fn only_mover(&self, hex: HexPos) -> bool {
        let Some(mover) = self.req.mover else {
            return false;
        };
        self.map
            .critter_ids_at(hex)
            .iter()
            .filter_map(|id| self.map.get_critter(*id))
            .filter(|c| !c.is_dead())
            .all(|c| c.id == mover)
    }

    /// Cost of stepping from `hex` in `dir`, or `None` if blocked.
    fn step_cost(&self, hex: HexPos, dir: u8) -> Option<u32> {
        let (x, y) = hex.signed();
        let mut critter_penalty = 0;
        let mut gag_penalty = 0;
        for (hx, hy) in self.map.geometry().newly_covered(x, y, dir, self.req.multihex) {
            let h = self.map.hex_at(hx, hy)?;
            let mut blocking = self.blocking(h);
            if blocking.contains(HexFlags::CRITTER) {
                critter_penalty = self.req.critters.penalty()?;
                blocking.set(HexFlags::CRITTER, false);
            }
            if blocking.contains(HexFlags::GAG_ITEM) {
                gag_penalty = self.req.gags.penalty()?;
                blocking.set(HexFlags::GAG_ITEM, false);
            }
            if !blocking.is_empty() {
                return None;
            }
        }
        Some(1 + critter_penalty + gag_penalty)
    }

    /// The dynamic occupant holding `hex`, if identifiable.
    fn occupant(&self, hex: HexPos) -> Option<Blocker> {
        let map = self.map;
        if let Some(cr) = map
            .critter_ids_at(hex)
            .iter()
            .filter_map(|id| map.get_critter(*id))
            .find(|c| !c.is_dead() && Some(c.id) != self.req.mover)
        {
            return Some(Blocker::Critter(cr.id));
        }
        let items = map.get_items_hex(hex);
        items
            .iter()
            .find(|i| i.proto.gag)
            .or_else(|| items.iter().find(|i| !i.proto.passable))
            .copied()
            .or_else(|| map.get_items_block_line(hex).into_iter().next())
            .map(|i| Blocker::Item(i.id))
    }

    fn destination_busy(&self) -> Option<PathOutcome<Vec<PathStep>>> {
        let hexes: SmallVec<[HexPos; 8]> = self
            .map
            .hexes_around(self.req.to, self.req.multihex)
            .collect();
        if hexes
            .iter()
            .any(|&h| self.map.hex_flags(h).contains(HexFlags::SCEN_BLOCK))
        {
            return None;
        }
        let busy = hexes.iter().find(|&&h| !self.blocking(h).is_empty())?;
        Some(PathOutcome::HexBusy {
            blocker: self.occupant(*busy),
        })
    }

    /// Every on-map neighbour of the destination is impassable and not
    /// just a gag, and at least one is held by a dynamic occupant. A
    /// mover already standing next to the destination is never ringed. A fully static enclosure falls through to the
    /// search and ends as a deadlock instead.
    fn ring_busy(&self) -> bool {
        let map = self.map;
        let (x, y) = self.req.to.signed();
        let mut dynamic = false;
        for (nx, ny) in map.geometry().neighbours(x, y) {
            let Some(h) = map.hex_at(nx, ny) else {
                continue;
            };
            if h == self.req.from {
                return false;
            }
            let blocking = self.blocking(h);
            if blocking.is_empty() || blocking.contains(HexFlags::GAG_ITEM) {
                return false;
            }
            if !blocking.contains(HexFlags::SCEN_BLOCK) {
                dynamic = true;
            }
        }
        dynamic
    }
}

/// Cut the path before the first hex a step-over occupant holds.
fn truncate_at_occupant(probe: &Probe<'_>, steps: &mut Vec<PathStep>) -> Option<Blocker> {
    let step_over = HexFlags::CRITTER | HexFlags::GAG_ITEM;
    let geom = probe.map.geometry();
    let mut prev = probe.req.from;
    for (i, step) in steps.iter().enumerate() {
        let (x, y) = prev.signed();
        for (hx, hy) in geom.newly_covered(x, y, step.dir, probe.req.multihex) {
            let Some(h) = probe.map.hex_at(hx, hy) else {
                continue;
            };
            if probe.blocking(h).intersects(step_over) {
                let blocker = probe.occupant(h);
                steps.truncate(i);
                return blocker;
            }
        }
        prev = step.hex;
    }
    None
}

/// A bullet fired from `from` reaches `target` standing on `target_hex`.
fn can_hit(
    map: &RuntimeMap,
    from: HexPos,
    target_hex: HexPos,
    target: CritterId,
    shooter: Option<CritterId>,
) -> bool {
    let mut trace = TraceRequest::to_hex(from, target_hex).find_critter(target);
    if let Some(shooter) = shooter {
        trace = trace.ignoring(shooter);
    }
    trace_bullet(map, trace).critter_found
}
