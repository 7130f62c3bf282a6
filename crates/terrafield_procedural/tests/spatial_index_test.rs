//! # Spatial Index Integration Test
//!
//! Drives many entities on random walks and checks after every step that
//! each one is a member of exactly the cell containing it, and that the
//! proximity queries agree with a brute-force scan.

use std::collections::HashSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use terrafield_procedural::{Body, CellCoord, EntityId, EntityKind, Grid, Occupant};
use terrafield_shared::Vec2;

fn spawn_bodies(rng: &mut ChaCha8Rng, count: u64, extent: f64) -> Vec<Body> {
    (0..count)
        .map(|id| {
            let position = Vec2::new(
                rng.gen_range(-extent..extent),
                rng.gen_range(-extent..extent),
            );
            let kind = if id % 3 == 0 { EntityKind::Plant } else { EntityKind::Animal };
            Body::new(EntityId::new(id), kind, position)
        })
        .collect()
}

fn assert_index_consistent(grid: &Grid, bodies: &[Body]) {
    let mut seen = HashSet::new();
    for cell in grid.cells() {
        for id in cell.entity_ids() {
            assert!(seen.insert(id), "{id:?} is a member of more than one cell");
        }
    }

    for body in bodies {
        let Some(coord) = body.current_cell() else {
            assert!(!seen.contains(&body.id), "untracked {:?} still indexed", body.id);
            continue;
        };
        assert_eq!(coord, grid.world_to_cell(body.position.x, body.position.y));
        let cell = grid.existing_cell(coord).expect("back-reference names a missing cell");
        assert!(cell.contains(body.id), "{:?} missing from {coord:?}", body.id);
    }

    let tracked = bodies.iter().filter(|b| b.current_cell().is_some()).count();
    assert_eq!(seen.len(), tracked);
    assert_eq!(grid.tracked_entity_count(), tracked);
}

/// Test: membership stays exact across 200 steps of 300 wandering entities.
#[test]
fn test_random_walk_keeps_index_consistent() {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut grid = Grid::default();
    let mut bodies = spawn_bodies(&mut rng, 300, 500.0);

    for body in &mut bodies {
        grid.add_entity(body);
    }
    assert_index_consistent(&grid, &bodies);

    for step in 0..200 {
        for body in &mut bodies {
            let stride = rng.gen_range(0.0..80.0);
            let heading = Vec2::from_angle(rng.gen_range(0.0..std::f64::consts::TAU));
            body.move_to(body.position + heading * stride);
            grid.update_entity(body);
        }

        // Periodically drop and re-add a slice of the population
        if step % 25 == 0 {
            for body in bodies.iter_mut().skip(step % 7).step_by(11) {
                assert!(grid.remove_entity(body));
            }
            assert_index_consistent(&grid, &bodies);
            for body in bodies.iter_mut().filter(|b| b.current_cell().is_none()) {
                grid.add_entity(body);
            }
        }

        assert_index_consistent(&grid, &bodies);
    }

    println!("Cells materialized: {}", grid.cell_count());
}

/// Test: radius queries match a brute-force distance scan.
#[test]
fn test_radius_query_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut grid = Grid::default();
    let mut bodies = spawn_bodies(&mut rng, 500, 400.0);
    for body in &mut bodies {
        grid.add_entity(body);
    }

    for _ in 0..200 {
        let (cx, cy) = (rng.gen_range(-450.0..450.0), rng.gen_range(-450.0..450.0));
        let radius = rng.gen_range(0.0..300.0);

        let found: HashSet<EntityId> = grid
            .entities_in_radius(cx, cy, radius)
            .into_iter()
            .map(|o| o.id)
            .collect();
        let expected: HashSet<EntityId> = bodies
            .iter()
            .filter(|b| b.position.distance_squared(Vec2::new(cx, cy)) <= radius * radius)
            .map(|b| b.id)
            .collect();

        assert_eq!(found, expected, "radius query at ({cx}, {cy}) r={radius}");
    }
}

/// Test: area queries match a brute-force rectangle scan.
#[test]
fn test_area_query_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let mut grid = Grid::default();
    let mut bodies = spawn_bodies(&mut rng, 500, 400.0);
    for body in &mut bodies {
        grid.add_entity(body);
    }

    for _ in 0..200 {
        let (x, y) = (rng.gen_range(-450.0..450.0), rng.gen_range(-450.0..450.0));
        let (w, h) = (rng.gen_range(0.0..400.0), rng.gen_range(0.0..400.0));

        let found: HashSet<EntityId> = grid
            .entities_in_area(x, y, w, h)
            .into_iter()
            .map(|o| o.id)
            .collect();
        let expected: HashSet<EntityId> = bodies
            .iter()
            .filter(|b| {
                (x..=x + w).contains(&b.position.x) && (y..=y + h).contains(&b.position.y)
            })
            .map(|b| b.id)
            .collect();

        assert_eq!(found, expected, "area query at ({x}, {y}) {w}x{h}");
    }
}

/// Test: queries report the position recorded at the last update.
#[test]
fn test_query_uses_recorded_position() {
    let mut grid = Grid::default();
    let mut body = Body::new(EntityId::new(1), EntityKind::Animal, Vec2::new(10.0, 10.0));
    grid.add_entity(&mut body);

    // Moved but not yet re-indexed
    body.move_to(Vec2::new(500.0, 500.0));
    assert_eq!(grid.entities_in_radius(10.0, 10.0, 1.0).len(), 1);
    assert!(grid.entities_in_radius(500.0, 500.0, 1.0).is_empty());

    grid.update_entity(&mut body);
    assert!(grid.entities_in_radius(10.0, 10.0, 1.0).is_empty());
    let found = grid.entities_in_radius(500.0, 500.0, 1.0);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, EntityKind::Animal);
    assert_eq!(body.current_cell(), Some(CellCoord::new(10, 10)));
}

/// Test: queries far from any entity create no cells.
#[test]
fn test_queries_are_read_only() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut grid = Grid::default();
    let mut bodies = spawn_bodies(&mut rng, 50, 100.0);
    for body in &mut bodies {
        grid.add_entity(body);
    }
    let before = grid.cell_count();

    for _ in 0..100 {
        let (x, y) = (rng.gen_range(-1e6..1e6), rng.gen_range(-1e6..1e6));
        let _ = grid.entities_in_radius(x, y, 1_000.0);
        let _ = grid.entities_in_area(x, y, 1_000.0, 1_000.0);
    }

    assert_eq!(grid.cell_count(), before);
}
