//! Found paths are contiguous, walkable and as short as a plain BFS says.

use std::collections::VecDeque;

use hexworld_core::HexPos;
use hexworld_map::RuntimeMap;
use hexworld_nav::{PathFinder, PathOutcome, PathRequest, Reach};
use hexworld_test_utils::{runtime_map, MapBuilder};
use proptest::prelude::*;

const W: u16 = 12;
const H: u16 = 12;

fn bfs_len(map: &RuntimeMap, from: HexPos, to: HexPos) -> Option<usize> {
    let geom = map.geometry();
    let mut dist = vec![usize::MAX; usize::from(W) * usize::from(H)];
    let mut queue = VecDeque::from([from]);
    dist[from.index(W)] = 0;
    while let Some(hex) = queue.pop_front() {
        let d = dist[hex.index(W)];
        if hex == to {
            return Some(d);
        }
        for dir in 0..geom.dir_count() {
            let Some(next) = geom.move_by_dir(hex, dir, W, H) else {
                continue;
            };
            if map.is_hex_passed(next) && dist[next.index(W)] == usize::MAX {
                dist[next.index(W)] = d + 1;
                queue.push_back(next);
            }
        }
    }
    None
}

fn scenario() -> impl Strategy<Value = (Vec<(u16, u16)>, (u16, u16), (u16, u16))> {
    (
        proptest::collection::vec((0..W, 0..H), 0..40),
        (0..W, 0..H),
        (0..W, 0..H),
    )
}

proptest! {
    #[test]
    fn matches_breadth_first_search((walls, from, to) in scenario()) {
        let from = HexPos::new(from.0, from.1);
        let to = HexPos::new(to.0, to.1);
        let mut builder = MapBuilder::new("scatter", W, H);
        for (x, y) in walls {
            let h = HexPos::new(x, y);
            if h != from && h != to {
                builder = builder.wall(x, y);
            }
        }
        let map = runtime_map(1, &builder.build());
        let geom = map.geometry();
        let mut pf = PathFinder::default();

        let outcome = pf.find(&map, &PathRequest::new(from, to));
        if from == to {
            prop_assert_eq!(outcome, PathOutcome::AlreadyHere);
            return Ok(());
        }
        match (bfs_len(&map, from, to), outcome) {
            (Some(len), PathOutcome::Found(found)) => {
                prop_assert_eq!(found.path.len(), len);
                prop_assert_eq!(found.reach, Reach::Exact);
                prop_assert_eq!(found.target, to);
                let mut prev = from;
                for step in &found.path {
                    prop_assert_eq!(geom.distance(prev, step.hex), 1);
                    prop_assert!(map.is_hex_passed(step.hex));
                    prev = step.hex;
                }
            }
            (None, PathOutcome::Deadlock) => {}
            (expected, got) => {
                prop_assert!(false, "bfs {:?} but finder gave {:?}", expected, got.map_path(|p| p.len()));
            }
        }
    }
}

#[test]
fn pinned_switcher_is_deterministic() {
    let map = runtime_map(1, &MapBuilder::new("fence", W, H).wall_column(5, 2, 9).build());
    let req = PathRequest::new(HexPos::new(1, 5), HexPos::new(10, 6));
    let run = || {
        let mut pf = PathFinder::default();
        pf.set_smooth_switcher(true);
        pf.find(&map, &req)
    };
    assert_eq!(run(), run());
}
