//! Dynamic per-tile state, kept apart from the grid's static geometry.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::composition::TileComposition;
use crate::deck::{TileDraw, TileType};
use crate::events::{Outbox, SimEvent};
use crate::grid::{HexGrid, TileId};

/// Opaque handle to whatever the visual layer spawned on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccupantHandle(pub u64);

/// Opaque handle to the template a tile was (or will be) built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateHandle(pub u32);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TileRuntime {
    pub occupied: bool,
    pub available: bool,
    pub occupant: Option<OccupantHandle>,
    pub template: Option<TemplateHandle>,
    pub drawn: Option<TileDraw>,
    pub tile_type: TileType,
    pub composition: TileComposition,
}

#[derive(Debug, Default)]
pub struct TileRuntimeStore {
    generation: u32,
    map: HashMap<TileId, TileRuntime>,
    occupied_count: usize,
    outbox: Outbox<SimEvent>,
}

impl TileRuntimeStore {
    pub fn for_grid(grid: &HexGrid) -> Self {
        let mut store = Self::default();
        store.reset_for(grid);
        store
    }

    /// Drops every entry and re-keys the store to the grid's current build.
    pub fn reset_for(&mut self, grid: &HexGrid) {
        self.generation = grid.generation();
        self.map.clear();
        self.occupied_count = 0;
        self.outbox.clear();
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Runtime for `tile`, created on first access.
    ///
    /// # Panics
    ///
    /// Panics when `tile` belongs to an earlier grid build.
    pub fn get(&mut self, tile: TileId) -> &mut TileRuntime {
        self.assert_current(tile);
        self.map.entry(tile).or_default()
    }

    pub fn lookup(&self, tile: TileId) -> Option<&TileRuntime> {
        self.assert_current(tile);
        self.map.get(&tile)
    }

    pub fn is_occupied(&self, tile: TileId) -> bool {
        self.lookup(tile).is_some_and(|r| r.occupied)
    }

    pub fn is_available(&self, tile: TileId) -> bool {
        self.lookup(tile).is_some_and(|r| r.available && !r.occupied)
    }

    pub fn composition(&self, tile: TileId) -> TileComposition {
        self.lookup(tile)
            .map(|r| r.composition)
            .unwrap_or_default()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupied_count
    }

    pub fn mark_occupied(
        &mut self,
        tile: TileId,
        occupant: Option<OccupantHandle>,
        template: Option<TemplateHandle>,
        drawn: Option<TileDraw>,
    ) {
        let runtime = self.get(tile);
        let transition = !runtime.occupied;
        runtime.occupied = true;
        runtime.available = false;
        runtime.occupant = occupant;
        if template.is_some() {
            runtime.template = template;
        }
        if let Some(draw) = drawn {
            runtime.tile_type = draw.tile_type;
            if template.is_none() {
                runtime.template = Some(draw.template);
            }
            runtime.drawn = Some(draw);
        }
        let template = runtime.template;

        if transition {
            self.occupied_count += 1;
            self.outbox.push(SimEvent::TileOccupied {
                tile,
                occupant,
                template,
            });
        }
    }

    pub fn free(&mut self, tile: TileId) {
        let runtime = self.get(tile);
        let transition = runtime.occupied;
        runtime.occupied = false;
        runtime.available = transition;
        runtime.occupant = None;
        runtime.drawn = None;

        if transition {
            self.occupied_count -= 1;
            self.outbox.push(SimEvent::TileFreed { tile });
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TileId, &TileRuntime)> {
        self.map.iter().map(|(id, runtime)| (*id, runtime))
    }

    pub fn outbox(&mut self) -> &mut Outbox<SimEvent> {
        &mut self.outbox
    }

    fn assert_current(&self, tile: TileId) {
        assert_eq!(
            tile.generation(),
            self.generation,
            "tile {tile:?} belongs to a rebuilt grid"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{FlatSurface, GridBounds};

    fn setup() -> (HexGrid, TileRuntimeStore) {
        let mut grid = HexGrid::new();
        grid.build(3, 3, GridBounds::default(), &FlatSurface);
        let store = TileRuntimeStore::for_grid(&grid);
        (grid, store)
    }

    #[test]
    fn get_creates_default_runtime() {
        let (grid, mut store) = setup();
        let tile = grid.tiles()[4].id;
        assert!(store.lookup(tile).is_none());
        assert_eq!(*store.get(tile), TileRuntime::default());
        assert!(store.lookup(tile).is_some());
    }

    #[test]
    fn occupied_count_only_moves_on_transitions() {
        let (grid, mut store) = setup();
        let a = grid.tiles()[0].id;
        let b = grid.tiles()[1].id;

        store.mark_occupied(a, Some(OccupantHandle(1)), None, None);
        store.mark_occupied(a, Some(OccupantHandle(2)), None, None);
        store.mark_occupied(b, None, None, None);
        assert_eq!(store.occupied_count(), 2);

        store.free(a);
        store.free(a);
        assert_eq!(store.occupied_count(), 1);
        store.free(grid.tiles()[2].id);
        assert_eq!(store.occupied_count(), 1);

        let events: Vec<_> = store.outbox().drain().collect();
        assert_eq!(events.len(), 3);
    }

    #[test]
    fn occupied_and_available_never_both_set() {
        let (grid, mut store) = setup();
        let tile = grid.tiles()[0].id;
        store.get(tile).available = true;
        store.mark_occupied(tile, None, None, None);
        let runtime = store.lookup(tile).unwrap();
        assert!(runtime.occupied && !runtime.available);

        store.free(tile);
        let runtime = store.lookup(tile).unwrap();
        assert!(!runtime.occupied && runtime.available);
    }

    #[test]
    fn drawn_tile_supplies_type_and_template() {
        let (grid, mut store) = setup();
        let tile = grid.tiles()[0].id;
        let draw = TileDraw {
            tile_type: TileType::Forest,
            template: TemplateHandle(9),
            label: "Forest".into(),
        };
        store.mark_occupied(tile, None, None, Some(draw.clone()));
        let runtime = store.lookup(tile).unwrap();
        assert_eq!(runtime.tile_type, TileType::Forest);
        assert_eq!(runtime.template, Some(TemplateHandle(9)));
        assert_eq!(runtime.drawn, Some(draw));

        store.free(tile);
        let runtime = store.lookup(tile).unwrap();
        assert!(runtime.drawn.is_none());
        assert!(runtime.occupant.is_none());
    }

    #[test]
    #[should_panic(expected = "rebuilt grid")]
    fn stale_tile_panics() {
        let (mut grid, mut store) = setup();
        let stale = grid.tiles()[0].id;
        grid.build(3, 3, GridBounds::default(), &FlatSurface);
        store.reset_for(&grid);
        store.get(stale);
    }
}
