//! Bullet tracing: straight-line walks across a runtime map.
//!
//! A trace starts at an origin hex and follows the ideal line towards a
//! target hex (or along a screen angle) for a bounded number of hexes.
//! It stops at the first hex that does not let shots through, at the map
//! edge, or on the first critter matching an optional filter. Outputs the
//! caller did not ask for stay empty.

use hexworld_core::{CritterId, HexPos};
use hexworld_map::{FindType, RuntimeMap};
use hexworld_space::LineWalk;

/// Where a trace is aimed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TraceTarget {
    /// Towards a hex; the walk continues past it up to the trace distance.
    Hex(HexPos),
    /// Along a screen angle in degrees (0 = east, clockwise).
    Angle(f32),
}

/// Critter matching rules applied to every hex the trace crosses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CritterFilter {
    /// Stop when this critter is hit.
    pub target: Option<CritterId>,
    /// Which critters count.
    pub find: FindType,
    /// With no `target`, stop at the first matching critter.
    pub stop_on_first: bool,
}

/// Which outputs to compute.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TraceWants {
    /// Collect every matching critter crossed.
    pub critters: bool,
    /// Report the blocking hex and the hex before it.
    pub block: bool,
    /// Report the last walkable hex before the first obstacle.
    pub last_passed: bool,
}

/// Per-hex callback: `(previous hex, hex, direction of the step)`.
pub type HexCallback<'a> = &'a mut dyn FnMut(HexPos, HexPos, u8);

/// A single trace request.
pub struct TraceRequest<'a> {
    /// Origin; never itself inspected.
    pub from: HexPos,
    /// Aim.
    pub target: TraceTarget,
    /// Hexes to walk. 0 with a hex target means "up to the target".
    pub dist: u32,
    /// Critter matching.
    pub filter: Option<CritterFilter>,
    /// Critter never reported (usually the shooter).
    pub ignore: Option<CritterId>,
    /// Let `last_passed` advance across hexes blocked only by critters.
    pub last_passed_skip_critters: bool,
    /// Requested outputs.
    pub wants: TraceWants,
    /// Called for every hex entered, before any checks.
    pub on_hex: Option<HexCallback<'a>>,
}

impl<'a> TraceRequest<'a> {
    /// Trace from `from` up to (and including) `to`.
    pub fn to_hex(from: HexPos, to: HexPos) -> Self {
        Self::new(from, TraceTarget::Hex(to), 0)
    }

    /// Trace `dist` hexes along `degrees`.
    pub fn at_angle(from: HexPos, degrees: f32, dist: u32) -> Self {
        Self::new(from, TraceTarget::Angle(degrees), dist)
    }

    fn new(from: HexPos, target: TraceTarget, dist: u32) -> Self {
        Self {
            from,
            target,
            dist,
            filter: None,
            ignore: None,
            last_passed_skip_critters: false,
            wants: TraceWants::default(),
            on_hex: None,
        }
    }

    /// Walk exactly `dist` hexes (continuing past a hex target).
    pub fn with_dist(mut self, dist: u32) -> Self {
        self.dist = dist;
        self
    }

    /// Report `block` / `pre_block`.
    pub fn want_block(mut self) -> Self {
        self.wants.block = true;
        self
    }

    /// Report `last_passed`.
    pub fn want_last_passed(mut self, skip_critters: bool) -> Self {
        self.wants.last_passed = true;
        self.last_passed_skip_critters = skip_critters;
        self
    }

    /// Collect critters matching `find`.
    pub fn collect_critters(mut self, find: FindType) -> Self {
        self.wants.critters = true;
        self.filter.get_or_insert_with(CritterFilter::default).find = find;
        self
    }

    /// Stop when `target` is hit.
    pub fn find_critter(mut self, target: CritterId) -> Self {
        self.filter.get_or_insert_with(CritterFilter::default).target = Some(target);
        self
    }

    /// Stop at the first critter matching `find`.
    pub fn stop_on_first(mut self, find: FindType) -> Self {
        let filter = self.filter.get_or_insert_with(CritterFilter::default);
        filter.find = find;
        filter.stop_on_first = true;
        self
    }

    /// Never report `critter`.
    pub fn ignoring(mut self, critter: CritterId) -> Self {
        self.ignore = Some(critter);
        self
    }

    /// Call `cb` for every hex entered.
    pub fn on_hex(mut self, cb: HexCallback<'a>) -> Self {
        self.on_hex = Some(cb);
        self
    }
}

/// Outputs of a trace. Fields the request did not ask for stay empty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceResult {
    /// Matching critters crossed, in order, without duplicates.
    pub critters: Vec<CritterId>,
    /// Critter the trace stopped on.
    pub found: Option<CritterId>,
    /// Hex before the block.
    pub pre_block: Option<HexPos>,
    /// First hex that stopped the trace.
    pub block: Option<HexPos>,
    /// Last walkable hex before the first obstacle; the origin if none.
    pub last_passed: Option<HexPos>,
    /// Hexes entered (including the block hex).
    pub visited: u32,
    /// The full distance was walked without stopping.
    pub is_full_trace: bool,
    /// The trace stopped on a critter matching the filter.
    pub critter_found: bool,
}

/// Walk a straight line over `map`.
pub fn trace_bullet(map: &RuntimeMap, mut req: TraceRequest<'_>) -> TraceResult {
    let geom = map.geometry();
    let from = req.from;
    let (aim, dist) = match req.target {
        TraceTarget::Hex(to) => {
            let dist = if req.dist == 0 {
                geom.distance(from, to)
            } else {
                req.dist
            };
            (to.signed(), dist)
        }
        TraceTarget::Angle(deg) => (geom.hex_at_angle(from, deg, req.dist), req.dist),
    };

    let mut result = TraceResult::default();
    if req.wants.last_passed {
        result.last_passed = Some(from);
    }
    let walk = LineWalk::new(geom, from.signed(), aim);
    if walk.is_degenerate() {
        result.is_full_trace = dist == 0;
        return result;
    }

    let mut last_passed_done = false;
    let mut prev = from;
    for (hx, hy) in walk.take(dist as usize) {
        let Some(hex) = map.hex_at(hx, hy) else {
            return result;
        };
        result.visited += 1;
        if let Some(cb) = req.on_hex.as_deref_mut() {
            cb(prev, hex, geom.direction(prev, hex));
        }

        if req.wants.last_passed && !last_passed_done {
            if map.is_hex_passed(hex) {
                result.last_passed = Some(hex);
            } else if !(req.last_passed_skip_critters && map.is_flag_critter(hex, false)) {
                last_passed_done = true;
            }
        }

        if !map.is_hex_raked(hex) {
            if req.wants.block {
                result.block = Some(hex);
                result.pre_block = Some(prev);
            }
            return result;
        }

        if map.is_hex_critter(hex) {
            let find = req.filter.map(|f| f.find).unwrap_or_default();
            let hits = map
                .critter_ids_at(hex)
                .iter()
                .filter(|&&id| Some(id) != req.ignore)
                .filter_map(|id| map.get_critter(*id))
                .filter(|cr| find.matches(cr));
            for cr in hits {
                if req.wants.critters && !result.critters.contains(&cr.id) {
                    result.critters.push(cr.id);
                }
                if let Some(f) = req.filter {
                    let stop = match f.target {
                        Some(target) => target == cr.id,
                        None => f.stop_on_first,
                    };
                    if stop {
                        result.found = Some(cr.id);
                        result.critter_found = true;
                        return result;
                    }
                }
            }
        }
        prev = hex;
    }
    result.is_full_trace = true;
    result
}
