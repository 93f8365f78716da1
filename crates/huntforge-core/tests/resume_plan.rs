//! Functional tests for save, load and resume semantics.
//!
//! A loaded save must rebuild exactly the pending work: every position that
//! is neither excluded nor fully resolved, once each, in sweep order.

use huntforge_atlas::{snapshot, Atlas, Coordinates, Direction, Hint, MapBounds};
use huntforge_core::WorkQueue;
use std::collections::HashSet;

fn settle_empty(atlas: &mut Atlas, coordinates: Coordinates) {
    for direction in Direction::ALL {
        atlas.write_direction(coordinates, direction, Vec::new());
    }
    atlas.settle_position(coordinates);
}

fn resolve_with_hint(atlas: &mut Atlas, coordinates: Coordinates) {
    atlas.write_direction(
        coordinates,
        Direction::North,
        vec![Hint {
            dist: 1,
            x: coordinates.x,
            y: coordinates.y + 1,
            ids: vec!["n".to_string()],
        }],
    );
    for direction in [Direction::East, Direction::South, Direction::West] {
        atlas.write_direction(coordinates, direction, Vec::new());
    }
    atlas.settle_position(coordinates);
}

fn drain(mut queue: WorkQueue) -> Vec<Coordinates> {
    let mut items = Vec::new();
    while let Some(item) = queue.pop() {
        assert!(item.direction.is_none(), "fresh items probe all directions");
        items.push(item.coordinates);
    }
    items
}

/// Tenet: a 5x5 sweep with one previously excluded position yields 24 items
/// in row-major order starting at the minimum corner.
#[test]
fn one_excluded_position_leaves_24_items() {
    let bounds = MapBounds::new(-2, -2, 2, 2).unwrap();
    let mut atlas = Atlas::new();
    settle_empty(&mut atlas, Coordinates::new(0, 0));

    let items = drain(WorkQueue::build(&bounds, &atlas));
    assert_eq!(items.len(), 24);
    assert_eq!(items[0], Coordinates::new(-2, -2));
    assert_eq!(items[1], Coordinates::new(-2, -1));
    assert!(!items.contains(&Coordinates::new(0, 0)));
}

/// Tenet: resume survives the disk round trip; the rebuilt queue from a
/// loaded save matches the one from the live atlas.
#[test]
fn resume_is_identical_after_save_and_load() {
    let bounds = MapBounds::new(-2, -2, 2, 2).unwrap();
    let mut atlas = Atlas::new();
    settle_empty(&mut atlas, Coordinates::new(0, 0));
    resolve_with_hint(&mut atlas, Coordinates::new(1, 1));
    // a half-probed position must come back into the queue
    atlas.write_direction(Coordinates::new(-1, 2), Direction::South, Vec::new());

    let dir = tempfile::tempdir().unwrap();
    snapshot::save(dir.path(), &atlas).unwrap();
    let loaded = snapshot::load(dir.path()).unwrap();

    let live = drain(WorkQueue::build(&bounds, &atlas));
    let resumed = drain(WorkQueue::build(&bounds, &loaded));
    assert_eq!(live, resumed);
    assert_eq!(resumed.len(), 23);
    assert!(resumed.contains(&Coordinates::new(-1, 2)));
}

/// Tenet: queued positions and settled positions partition the rectangle;
/// nothing is duplicated, nothing is lost.
#[test]
fn queue_and_settled_partition_the_rectangle() {
    let bounds = MapBounds::new(0, 0, 3, 3).unwrap();
    let mut atlas = Atlas::new();
    settle_empty(&mut atlas, Coordinates::new(0, 3));
    settle_empty(&mut atlas, Coordinates::new(2, 1));
    resolve_with_hint(&mut atlas, Coordinates::new(3, 3));

    let queued: HashSet<_> = drain(WorkQueue::build(&bounds, &atlas)).into_iter().collect();
    let mut settled = 0;
    for coordinates in bounds.iter() {
        let in_queue = queued.contains(&coordinates);
        let is_settled = atlas.is_settled(coordinates);
        assert!(
            in_queue != is_settled,
            "{coordinates} must be exactly one of queued/settled"
        );
        settled += usize::from(is_settled);
    }
    assert_eq!(queued.len() + settled, bounds.position_count());
}
