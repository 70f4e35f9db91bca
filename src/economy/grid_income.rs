use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::IncomeSource;
use crate::composition::TileComposition;
use crate::grid::{HexGrid, TileId};
use crate::runtime::TileRuntimeStore;

/// Income of every tile's composition, kept as a running total that is patched
/// per tile when a composition changes.
#[derive(Debug, Default)]
pub struct GridIncome {
    total: Cell<f64>,
    per_tile: RefCell<HashMap<TileId, f64>>,
}

impl GridIncome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recomputes the total from scratch, e.g. after a grid rebuild.
    pub fn rebuild(&self, grid: &HexGrid, store: &TileRuntimeStore) {
        let mut per_tile = self.per_tile.borrow_mut();
        per_tile.clear();
        let mut total = 0.0;
        for tile in grid.tiles() {
            let income = store.composition(tile.id).income();
            if income > 0.0 {
                per_tile.insert(tile.id, income);
            }
            total += income;
        }
        self.total.set(total);
    }

    pub fn on_composition_changed(&self, tile: TileId, composition: &TileComposition) {
        let income = composition.income();
        let previous = self
            .per_tile
            .borrow_mut()
            .insert(tile, income)
            .unwrap_or(0.0);
        self.total.set(self.total.get() + income - previous);
    }

    pub fn tile_income(&self, tile: TileId) -> f64 {
        self.per_tile.borrow().get(&tile).copied().unwrap_or(0.0)
    }
}

impl IncomeSource for GridIncome {
    fn income_per_tick(&self) -> f64 {
        self.total.get()
    }
}
