//! Hex lattice generation and axial neighbor topology.
//!
//! A grid is built once from `rows x cols` and owns every [`Tile`]. Building
//! again is a full reset: the generation counter moves on, so ids handed out by
//! the previous build no longer resolve and any runtime state keyed by them is
//! invalid. There is no in-place resize.

pub mod query;

use std::collections::HashMap;

use glam::Vec3;
use hexx::{Hex, HexLayout, HexOrientation};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MIN_SPAN: f32 = 0.0001;

/// Axial offsets of the six neighbors, in lookup order.
pub const AXIAL_DIRECTIONS: [Hex; 6] = [
    Hex::new(1, 0),
    Hex::new(1, -1),
    Hex::new(0, -1),
    Hex::new(-1, 0),
    Hex::new(-1, 1),
    Hex::new(0, 1),
];

/// Identity of a tile within one grid build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileId {
    generation: u32,
    index: u32,
}

impl TileId {
    pub fn generation(self) -> u32 {
        self.generation
    }

    pub fn index(self) -> usize {
        self.index as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub i: u32,
    pub j: u32,
    pub hex: Hex,
    pub position: Vec3,
}

impl Tile {
    pub fn q(&self) -> i32 {
        self.hex.x
    }

    pub fn r(&self) -> i32 {
        self.hex.y
    }
}

/// Footprint the generated lattice is scaled to fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    pub center: Vec3,
    pub width: f32,
    pub depth: f32,
}

impl Default for GridBounds {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            width: 1.0,
            depth: 1.0,
        }
    }
}

/// Snaps a tile anchor onto whatever ground the caller simulates.
pub trait SurfaceProjector {
    fn project(&self, point: Vec3) -> Vec3;
}

/// Leaves anchors on the layout plane.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatSurface;

impl SurfaceProjector for FlatSurface {
    fn project(&self, point: Vec3) -> Vec3 {
        point
    }
}

impl<F> SurfaceProjector for F
where
    F: Fn(Vec3) -> Vec3,
{
    fn project(&self, point: Vec3) -> Vec3 {
        self(point)
    }
}

#[derive(Debug)]
pub struct HexGrid {
    generation: u32,
    rows: u32,
    cols: u32,
    tiles: Vec<Tile>,
    axial_lookup: HashMap<Hex, TileId>,
    center: Option<TileId>,
    hex_scale: f32,
}

impl Default for HexGrid {
    fn default() -> Self {
        Self::new()
    }
}

impl HexGrid {
    pub fn new() -> Self {
        Self {
            generation: 0,
            rows: 0,
            cols: 0,
            tiles: Vec::new(),
            axial_lookup: HashMap::new(),
            center: None,
            hex_scale: 1.0,
        }
    }

    /// Lays out a fresh lattice, invalidating every id from the previous build.
    pub fn build(
        &mut self,
        rows: u32,
        cols: u32,
        bounds: GridBounds,
        projector: &dyn SurfaceProjector,
    ) -> &[Tile] {
        self.generation = self.generation.wrapping_add(1);
        self.rows = rows;
        self.cols = cols;
        self.tiles.clear();
        self.axial_lookup.clear();
        self.center = None;
        self.hex_scale = 1.0;

        if rows == 0 || cols == 0 {
            debug!(generation = self.generation, "grid.build.empty");
            return &self.tiles;
        }

        let unit_layout = HexLayout::new(HexOrientation::Pointy);
        let q0 = axial_origin(cols);
        let r0 = axial_origin(rows);

        let mut layout = Vec::with_capacity(rows as usize * cols as usize);
        let (mut min_x, mut max_x) = (f32::INFINITY, f32::NEG_INFINITY);
        let (mut min_z, mut max_z) = (f32::INFINITY, f32::NEG_INFINITY);
        for i in 0..rows {
            for j in 0..cols {
                let hex = Hex::new(j as i32 - q0, i as i32 - r0);
                let plane = unit_layout.hex_to_world_pos(hex);
                let (x, z) = (plane.x, plane.y);
                min_x = min_x.min(x);
                max_x = max_x.max(x);
                min_z = min_z.min(z);
                max_z = max_z.max(z);
                layout.push((i, j, hex, x, z));
            }
        }

        let span_x = (max_x - min_x).max(MIN_SPAN);
        let span_z = (max_z - min_z).max(MIN_SPAN);
        self.hex_scale = (bounds.width / span_x).min(bounds.depth / span_z);
        let mid_x = (min_x + max_x) * 0.5;
        let mid_z = (min_z + max_z) * 0.5;

        let mut best = f32::INFINITY;
        for (index, (i, j, hex, x, z)) in layout.into_iter().enumerate() {
            let anchor = bounds.center
                + Vec3::new((x - mid_x) * self.hex_scale, 0.0, (z - mid_z) * self.hex_scale);
            let position = projector.project(anchor);
            let id = TileId {
                generation: self.generation,
                index: index as u32,
            };
            self.tiles.push(Tile {
                id,
                i,
                j,
                hex,
                position,
            });
            self.axial_lookup.insert(hex, id);

            let distance = position.distance_squared(bounds.center);
            if distance < best {
                best = distance;
                self.center = Some(id);
            }
        }

        debug!(
            generation = self.generation,
            rows,
            cols,
            scale = self.hex_scale,
            "grid.build"
        );
        &self.tiles
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn hex_scale(&self) -> f32 {
        self.hex_scale
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, id: TileId) -> bool {
        id.generation == self.generation && id.index() < self.tiles.len()
    }

    /// Resolves an id from the current build. Ids from an earlier build return `None`.
    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        if id.generation != self.generation {
            return None;
        }
        self.tiles.get(id.index())
    }

    pub fn tile_at(&self, i: u32, j: u32) -> Option<&Tile> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        self.tiles.get((i * self.cols + j) as usize)
    }

    pub fn tile_at_axial(&self, q: i32, r: i32) -> Option<&Tile> {
        self.axial_lookup
            .get(&Hex::new(q, r))
            .and_then(|id| self.tiles.get(id.index()))
    }

    pub fn center_tile(&self) -> Option<&Tile> {
        self.center.and_then(|id| self.tiles.get(id.index()))
    }

    /// Existing neighbors of `id`, in [`AXIAL_DIRECTIONS`] order.
    ///
    /// # Panics
    ///
    /// Panics when `id` belongs to an earlier grid build.
    pub fn neighbors(&self, id: TileId) -> impl Iterator<Item = TileId> + '_ {
        assert_eq!(
            id.generation, self.generation,
            "tile {id:?} belongs to a rebuilt grid"
        );
        let origin = self.tile(id).map(|tile| tile.hex);
        AXIAL_DIRECTIONS.iter().filter_map(move |dir| {
            let hex = origin? + *dir;
            self.axial_lookup.get(&hex).copied()
        })
    }
}

fn axial_origin(count: u32) -> i32 {
    ((count as f32 - 1.0) * 0.5).round_ties_even() as i32
}
