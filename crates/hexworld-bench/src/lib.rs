//! Benchmark profiles for the hexworld map core.
//!
//! Provides pre-built map prototypes for benchmarking:
//!
//! - [`reference_profile`]: 200x200 map with 15% scattered walls
//! - [`maze_profile`]: 200x200 map of wall columns with alternating gaps
//! - [`runtime_map`]: instantiate a profile as a [`RuntimeMap`]
//!
//! Obstacle scatter is deterministic per seed so runs are comparable.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use hexworld_core::{HexPos, MapId, ProtoId};
use hexworld_map::{ItemProto, MapProto, RuntimeMap, StaticItem, StaticMapData};
use hexworld_space::HexGeometry;
use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Hex every profile keeps clear as a path origin.
pub const ORIGIN: HexPos = HexPos { x: 2, y: 2 };
/// Hex every profile keeps clear as a path destination.
pub const GOAL: HexPos = HexPos { x: 197, y: 197 };

const SIDE: u16 = 200;

fn wall(hex: HexPos) -> StaticItem {
    StaticItem {
        hex,
        proto: ItemProto::new(ProtoId::from_name("bench_wall")).blocking(),
    }
}

fn keep_clear(hex: HexPos) -> bool {
    let near = |a: u16, b: u16| a.abs_diff(b) <= 1;
    (near(hex.x, ORIGIN.x) && near(hex.y, ORIGIN.y)) || (near(hex.x, GOAL.x) && near(hex.y, GOAL.y))
}

/// Build a reference profile: 200x200 map, walls on 15% of hexes.
pub fn reference_profile(seed: u64) -> MapProto {
    scatter_profile(SIDE, SIDE, 15, seed)
}

/// A `width × height` map with walls on roughly `percent`% of hexes,
/// placed by a ChaCha8 stream seeded with `seed`. The hexes around
/// [`ORIGIN`] and [`GOAL`] stay clear.
pub fn scatter_profile(width: u16, height: u16, percent: u32, seed: u64) -> MapProto {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut proto = MapProto::new(ProtoId::from_name("bench_scatter"), width, height);
    for y in 0..height {
        for x in 0..width {
            let hex = HexPos::new(x, y);
            if rng.next_u32() % 100 < percent && !keep_clear(hex) {
                proto.static_items.push(wall(hex));
            }
        }
    }
    proto.hash_scenery = u32::try_from(proto.static_items.len()).unwrap_or(u32::MAX);
    proto
}

/// Build a maze profile: wall columns every fourth column, each with a
/// single gap alternating between the top and bottom rows. The shortest
/// route from [`ORIGIN`] to [`GOAL`] snakes across the whole map.
pub fn maze_profile() -> MapProto {
    let mut proto = MapProto::new(ProtoId::from_name("bench_maze"), SIDE, SIDE);
    for (n, x) in (4..SIDE - 4).step_by(4).enumerate() {
        let gap = if n % 2 == 0 { SIDE - 2 } else { 1 };
        for y in (0..SIDE).filter(|&y| y != gap) {
            proto.static_items.push(wall(HexPos::new(x, y)));
        }
    }
    proto
}

/// Instantiate `proto` as a hexagonal runtime map.
///
/// # Panics
///
/// Panics if the prototype has a zero dimension.
pub fn runtime_map(proto: &MapProto) -> RuntimeMap {
    let data = match StaticMapData::build(proto) {
        Ok(data) => data,
        Err(e) => panic!("benchmark profile is invalid: {e}"),
    };
    RuntimeMap::new(MapId(1), Arc::new(data), HexGeometry::hexagonal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profile_is_deterministic() {
        let a = reference_profile(42);
        let b = reference_profile(42);
        let c = reference_profile(43);
        assert_eq!(a.static_items, b.static_items);
        assert_ne!(a.static_items, c.static_items);
    }

    #[test]
    fn reference_profile_density() {
        let walls = reference_profile(7).static_items.len();
        let hexes = usize::from(SIDE) * usize::from(SIDE);
        // 15% ± 2%
        assert!(walls > hexes * 13 / 100 && walls < hexes * 17 / 100, "{walls}");
    }

    #[test]
    fn endpoints_stay_clear() {
        let map = runtime_map(&reference_profile(1));
        assert!(map.is_hex_passed(ORIGIN));
        assert!(map.is_hex_passed(GOAL));
        let maze = runtime_map(&maze_profile());
        assert!(maze.is_hex_passed(ORIGIN));
        assert!(maze.is_hex_passed(GOAL));
        assert!(!maze.is_hex_passed(HexPos::new(4, 100)));
    }
}
