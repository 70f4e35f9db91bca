//! Geometric lookups for the input layer. Linear scans are fine at the grid
//! sizes the game uses.

use glam::Vec3;

use super::{HexGrid, TileId};
use crate::error::{Outcome, Rejection};
use crate::runtime::TileRuntimeStore;

/// Closest tile to `point`, optionally no farther than `max_distance`.
pub fn nearest_tile(grid: &HexGrid, point: Vec3, max_distance: Option<f32>) -> Outcome<TileId> {
    nearest_matching(grid, point, max_distance, |_| true)
}

/// Closest unoccupied tile to `point`.
pub fn nearest_free_tile(
    grid: &HexGrid,
    store: &TileRuntimeStore,
    point: Vec3,
    max_distance: Option<f32>,
) -> Outcome<TileId> {
    nearest_matching(grid, point, max_distance, |id| !store.is_occupied(id))
}

fn nearest_matching(
    grid: &HexGrid,
    point: Vec3,
    max_distance: Option<f32>,
    mut accept: impl FnMut(TileId) -> bool,
) -> Outcome<TileId> {
    let mut best_sqr = max_distance.map_or(f32::INFINITY, |d| d * d);
    let mut found = None;
    for tile in grid.tiles() {
        if !accept(tile.id) {
            continue;
        }
        let d = point.distance_squared(tile.position);
        if d < best_sqr {
            best_sqr = d;
            found = Some(tile.id);
        }
    }
    found.ok_or(Rejection::NoTileInRange)
}
