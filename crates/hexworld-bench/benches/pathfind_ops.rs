//! Criterion micro-benchmarks for path searches.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use hexworld_bench::{maze_profile, reference_profile, runtime_map, GOAL, ORIGIN};
use hexworld_core::HexPos;
use hexworld_nav::{OccupantPolicy, PathFinder, PathLimits, PathRequest};
use hexworld_test_utils::npc;

fn unbounded() -> PathFinder {
    PathFinder::new(PathLimits {
        max_path_len: 4_000,
        max_explored: usize::MAX,
    })
}

/// Benchmark: corner-to-corner search on the scattered reference map.
fn bench_reference_corner_to_corner(c: &mut Criterion) {
    let map = runtime_map(&reference_profile(42));
    let mut pf = unbounded();
    let req = PathRequest::new(ORIGIN, GOAL);

    c.bench_function("pathfind_reference_corner_to_corner", |b| {
        b.iter(|| black_box(pf.find(&map, &req)));
    });
}

/// Benchmark: the snaking maze route, which settles most of the map.
fn bench_maze(c: &mut Criterion) {
    let map = runtime_map(&maze_profile());
    let mut pf = unbounded();
    let req = PathRequest::new(ORIGIN, GOAL);

    c.bench_function("pathfind_maze", |b| {
        b.iter(|| black_box(pf.find(&map, &req)));
    });
}

/// Benchmark: 1000 short searches (≤ 20 hexes) with a multihex footprint.
fn bench_short_multihex(c: &mut Criterion) {
    let map = runtime_map(&reference_profile(7));
    let mut pf = PathFinder::default();
    let reqs: Vec<PathRequest> = (0u16..1000)
        .map(|i| {
            let from = HexPos::new(20 + i % 150, 20 + (i * 7) % 150);
            let to = HexPos::new(from.x + 10, from.y + 10);
            PathRequest::new(from, to).with_multihex(1).with_cut(1)
        })
        .collect();

    c.bench_function("pathfind_short_multihex_1k", |b| {
        b.iter(|| {
            for req in &reqs {
                black_box(pf.find(&map, req));
            }
        });
    });
}

/// Benchmark: crossing a crowd with a step-over policy.
fn bench_step_over_crowd(c: &mut Criterion) {
    let mut map = runtime_map(&reference_profile(3));
    let mut id = 1;
    for y in (10..190).step_by(3) {
        for x in (10..190).step_by(5) {
            let hex = HexPos::new(x, y);
            if map.is_hex_passed(hex) {
                map.add_critter(npc(id, 0, x, y));
                id += 1;
            }
        }
    }
    let mut pf = unbounded();
    let req = PathRequest::new(ORIGIN, GOAL).critters(OccupantPolicy::StepOver { penalty: 4 });

    c.bench_function("pathfind_step_over_crowd", |b| {
        b.iter(|| black_box(pf.find(&map, &req)));
    });
}

criterion_group!(
    benches,
    bench_reference_corner_to_corner,
    bench_maze,
    bench_short_multihex,
    bench_step_over_crowd
);
criterion_main!(benches);
