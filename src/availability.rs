//! The buildable frontier: unoccupied tiles touching at least one occupied one.
//!
//! The frontier is recomputed from scratch on every query instead of being
//! maintained incrementally. Grids are small enough that a full pass is cheap.

use crate::grid::{HexGrid, TileId};
use crate::runtime::TileRuntimeStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct AvailabilityService;

impl AvailabilityService {
    pub fn new() -> Self {
        Self
    }

    /// Refreshes every `available` flag, then yields frontier tiles in grid order.
    pub fn available<'a>(
        &self,
        grid: &'a HexGrid,
        store: &'a mut TileRuntimeStore,
    ) -> impl Iterator<Item = TileId> + 'a {
        self.refresh(grid, store);
        let store: &'a TileRuntimeStore = store;
        grid.tiles()
            .iter()
            .map(|tile| tile.id)
            .filter(move |id| store.is_available(*id))
    }

    pub fn refresh(&self, grid: &HexGrid, store: &mut TileRuntimeStore) {
        for tile in grid.tiles() {
            store.get(tile.id).available = false;
        }

        for tile in grid.tiles() {
            let (occupied, template) = {
                let runtime = store.get(tile.id);
                (runtime.occupied, runtime.template)
            };
            if !occupied {
                continue;
            }
            for neighbor in grid.neighbors(tile.id) {
                let runtime = store.get(neighbor);
                if runtime.occupied {
                    continue;
                }
                runtime.available = true;
                if runtime.template.is_none() {
                    runtime.template = template;
                }
            }
        }
    }

    pub fn is_available(&self, grid: &HexGrid, store: &mut TileRuntimeStore, tile: TileId) -> bool {
        self.refresh(grid, store);
        store.is_available(tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{FlatSurface, GridBounds};
    use crate::runtime::TemplateHandle;

    fn setup(rows: u32, cols: u32) -> (HexGrid, TileRuntimeStore) {
        let mut grid = HexGrid::new();
        grid.build(rows, cols, GridBounds::default(), &FlatSurface);
        let store = TileRuntimeStore::for_grid(&grid);
        (grid, store)
    }

    #[test]
    fn nothing_available_without_occupied_tiles() {
        let (grid, mut store) = setup(4, 4);
        let service = AvailabilityService::new();
        assert_eq!(service.available(&grid, &mut store).count(), 0);

        let (empty, mut empty_store) = setup(0, 0);
        assert_eq!(service.available(&empty, &mut empty_store).count(), 0);
    }

    #[test]
    fn center_of_three_by_three_exposes_six_neighbors() {
        let (grid, mut store) = setup(3, 3);
        let center = grid.center_tile().unwrap().id;
        store.mark_occupied(center, None, None, None);

        let service = AvailabilityService::new();
        let frontier: Vec<_> = service.available(&grid, &mut store).collect();
        let mut expected: Vec<_> = grid.neighbors(center).collect();
        expected.sort();
        assert_eq!(frontier, expected);
        assert_eq!(frontier.len(), 6);
    }

    #[test]
    fn frontier_inherits_template_without_overwriting() {
        let (grid, mut store) = setup(3, 3);
        let center = grid.center_tile().unwrap().id;
        let neighbors: Vec<_> = grid.neighbors(center).collect();
        store.get(neighbors[0]).template = Some(TemplateHandle(5));
        store.mark_occupied(center, None, Some(TemplateHandle(1)), None);

        AvailabilityService::new().refresh(&grid, &mut store);
        assert_eq!(store.lookup(neighbors[0]).unwrap().template, Some(TemplateHandle(5)));
        assert_eq!(store.lookup(neighbors[1]).unwrap().template, Some(TemplateHandle(1)));
    }

    #[test]
    fn freed_tile_is_dropped_from_frontier_when_isolated() {
        let (grid, mut store) = setup(3, 3);
        let corner = grid.tile_at(0, 0).unwrap().id;
        store.mark_occupied(corner, None, None, None);
        let service = AvailabilityService::new();
        assert!(service.available(&grid, &mut store).count() > 0);

        store.free(corner);
        assert_eq!(service.available(&grid, &mut store).count(), 0);
        assert!(!service.is_available(&grid, &mut store, corner));
    }
}
