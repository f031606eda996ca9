//! Criterion micro-benchmarks for bullet tracing.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use hexworld_bench::{reference_profile, runtime_map, ORIGIN};
use hexworld_core::HexPos;
use hexworld_map::FindType;
use hexworld_nav::{trace_bullet, TraceRequest};
use hexworld_test_utils::npc;

/// Benchmark: 360 traces fanned out at one-degree steps, stopping at walls.
fn bench_fan_to_block(c: &mut Criterion) {
    let map = runtime_map(&reference_profile(42));
    let from = HexPos::new(100, 100);

    c.bench_function("trace_fan_360_to_block", |b| {
        b.iter(|| {
            for deg in 0..360u16 {
                let req = TraceRequest::at_angle(from, f32::from(deg), 60).want_block();
                black_box(trace_bullet(&map, req));
            }
        });
    });
}

/// Benchmark: a long diagonal trace collecting every critter it crosses.
fn bench_collect_critters(c: &mut Criterion) {
    let mut map = runtime_map(&hexworld_test_utils::open_map("range", 200, 200));
    for i in 0..150u16 {
        map.add_critter(npc(u32::from(i) + 1, 0, 3 + i, 3 + i));
    }

    c.bench_function("trace_collect_critters_diagonal", |b| {
        b.iter(|| {
            let req = TraceRequest::to_hex(ORIGIN, HexPos::new(190, 190))
                .with_dist(400)
                .collect_critters(FindType::ANY);
            black_box(trace_bullet(&map, req))
        });
    });
}

criterion_group!(benches, bench_fan_to_block, bench_collect_critters);
criterion_main!(benches);
