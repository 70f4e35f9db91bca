//! Animal habitat paths: chains of adjacent tiles whose biomes spell out an
//! animal's pattern.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::deck::TileType;
use crate::grid::{HexGrid, TileId};
use crate::runtime::TileRuntimeStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Biome {
    Plain,
    Forest,
    Bushes,
    Rocks,
    Water,
}

impl Biome {
    /// Single-letter code used by level designers.
    pub fn code(self) -> char {
        match self {
            Biome::Plain => 'x',
            Biome::Forest => 'y',
            Biome::Bushes => 'z',
            Biome::Rocks => 'w',
            Biome::Water => 'r',
        }
    }
}

impl From<TileType> for Biome {
    fn from(tile_type: TileType) -> Self {
        match tile_type {
            TileType::Field => Biome::Plain,
            TileType::Bushes => Biome::Bushes,
            TileType::Forest => Biome::Forest,
            TileType::Rocks => Biome::Rocks,
            TileType::Water => Biome::Water,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimalType {
    Deer,
    Beaver,
    Bear,
}

impl AnimalType {
    pub const ALL: [AnimalType; 3] = [AnimalType::Deer, AnimalType::Beaver, AnimalType::Bear];

    pub fn pattern(self) -> &'static [Biome] {
        use Biome::*;
        match self {
            AnimalType::Deer => &[Plain, Plain, Forest, Bushes, Water],
            AnimalType::Beaver => &[Forest, Forest, Bushes, Water, Water],
            AnimalType::Bear => &[Plain, Forest, Rocks, Rocks, Water],
        }
    }
}

/// Biome of a tile, read from the type it was drawn as. Untouched tiles are
/// plain fields.
pub fn biome_of(store: &TileRuntimeStore, tile: TileId) -> Biome {
    store
        .lookup(tile)
        .map(|runtime| runtime.tile_type)
        .unwrap_or_default()
        .into()
}

/// First simple path of adjacent tiles matching `animal`'s pattern.
///
/// Start tiles are tried in ascending `(q, r)` order and neighbors in
/// [`crate::grid::AXIAL_DIRECTIONS`] order, so the result is deterministic.
pub fn find_path(
    grid: &HexGrid,
    store: &TileRuntimeStore,
    animal: AnimalType,
) -> Option<Vec<TileId>> {
    let pattern = animal.pattern();
    let first = *pattern.first()?;

    let mut starts: Vec<_> = grid.tiles().iter().collect();
    starts.sort_by_key(|tile| (tile.q(), tile.r()));

    let mut visited = HashSet::new();
    let mut path = Vec::with_capacity(pattern.len());
    for start in starts {
        if biome_of(store, start.id) != first {
            continue;
        }
        if extend(grid, store, pattern, start.id, &mut visited, &mut path) {
            return Some(path);
        }
    }
    None
}

fn extend(
    grid: &HexGrid,
    store: &TileRuntimeStore,
    pattern: &[Biome],
    current: TileId,
    visited: &mut HashSet<TileId>,
    path: &mut Vec<TileId>,
) -> bool {
    visited.insert(current);
    path.push(current);
    if path.len() == pattern.len() {
        return true;
    }

    let expected = pattern[path.len()];
    for neighbor in grid.neighbors(current) {
        if visited.contains(&neighbor) || biome_of(store, neighbor) != expected {
            continue;
        }
        if extend(grid, store, pattern, neighbor, visited, path) {
            return true;
        }
    }

    path.pop();
    visited.remove(&current);
    false
}
