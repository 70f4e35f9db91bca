//! Per-tile upgrades and their progressive prices.
//!
//! Each action keeps one global built counter (levels applied anywhere on the
//! grid), and the price of the next application follows that action's
//! [`CostCurve`].

use serde::Serialize;
use tracing::debug;

pub use crate::composition::Element as BuildAction;

use crate::composition::{TileComposition, MAX_LEVEL};
use crate::config::BuildCosts;
use crate::economy::{CostCurve, EconomyLedger};
use crate::error::{Outcome, Rejection};
use crate::events::{Outbox, SimEvent};
use crate::grid::{HexGrid, TileId};
use crate::runtime::TileRuntimeStore;

/// Result of evaluating one action on one tile, for context panels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildOption {
    pub action: BuildAction,
    pub can_build: bool,
    pub cost: f64,
    pub reason: Option<String>,
}

/// A committed build.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BuildReceipt {
    pub tile: TileId,
    pub action: BuildAction,
    pub level: i32,
    pub cost: f64,
}

#[derive(Debug, Default)]
pub struct BuildController {
    costs: [CostCurve; 3],
    built: [u32; 3],
    outbox: Outbox<SimEvent>,
}

impl BuildController {
    pub fn new(costs: &BuildCosts) -> Self {
        let mut controller = Self::default();
        controller.configure(costs);
        controller
    }

    pub fn configure(&mut self, costs: &BuildCosts) {
        self.costs = [costs.grass, costs.bush, costs.tree];
    }

    pub fn curve(&self, action: BuildAction) -> CostCurve {
        self.costs[slot(action)]
    }

    pub fn built_count(&self, action: BuildAction) -> u32 {
        self.built[slot(action)]
    }

    pub fn next_cost(&self, action: BuildAction) -> f64 {
        self.curve(action).cost_for_next(self.built_count(action))
    }

    /// Recounts applied levels from every composition on the grid.
    pub fn recalculate_built_counts(&mut self, grid: &HexGrid, store: &TileRuntimeStore) {
        self.built = [0; 3];
        for tile in grid.tiles() {
            let composition = store.composition(tile.id);
            for action in BuildAction::ALL {
                self.built[slot(action)] += composition.level(action).clamp(0, MAX_LEVEL) as u32;
            }
        }
    }

    /// Price of the next `action` if every precondition holds.
    pub fn evaluate(
        &self,
        store: &TileRuntimeStore,
        ledger: &EconomyLedger,
        tile: Option<TileId>,
        action: BuildAction,
    ) -> Outcome<f64> {
        let tile = tile.ok_or(Rejection::NoTile)?;
        let runtime = store.lookup(tile);
        let composition = runtime.map(|r| r.composition).unwrap_or_default();

        if action == BuildAction::Tree
            && runtime.is_some_and(|r| r.occupied)
            && composition.tree_level == 0
        {
            return Err(Rejection::TileOccupied);
        }

        check_composition(&composition, action)?;

        let cost = self.next_cost(action);
        if !ledger.can_afford(cost) {
            return Err(Rejection::InsufficientFunds {
                cost,
                balance: ledger.currency(),
            });
        }
        Ok(cost)
    }

    pub fn option(
        &self,
        store: &TileRuntimeStore,
        ledger: &EconomyLedger,
        tile: Option<TileId>,
        action: BuildAction,
    ) -> BuildOption {
        match self.evaluate(store, ledger, tile, action) {
            Ok(cost) => BuildOption {
                action,
                can_build: true,
                cost,
                reason: None,
            },
            Err(rejection) => BuildOption {
                action,
                can_build: false,
                cost: self.next_cost(action),
                reason: Some(rejection.to_string()),
            },
        }
    }

    pub fn options(
        &self,
        store: &TileRuntimeStore,
        ledger: &EconomyLedger,
        tile: Option<TileId>,
    ) -> [BuildOption; 3] {
        BuildAction::ALL.map(|action| self.option(store, ledger, tile, action))
    }

    /// Validates, pays and applies `action` on `tile`. Nothing changes on rejection.
    pub fn try_build(
        &mut self,
        action: BuildAction,
        tile: Option<TileId>,
        store: &mut TileRuntimeStore,
        ledger: &mut EconomyLedger,
    ) -> Outcome<BuildReceipt> {
        let cost = match self.evaluate(store, ledger, tile, action) {
            Ok(cost) => cost,
            Err(rejection) => {
                debug!(?action, ?tile, %rejection, "build.rejected");
                return Err(rejection);
            }
        };
        let tile = tile.ok_or(Rejection::NoTile)?;
        ledger.try_spend(cost)?;

        let runtime = store.get(tile);
        let level = runtime.composition.raise(action);
        let claim = action == BuildAction::Tree && !runtime.occupied;
        self.built[slot(action)] += 1;
        if claim {
            store.mark_occupied(tile, None, None, None);
        }

        debug!(?action, ?tile, level, cost, "build.applied");
        self.outbox.push(SimEvent::CompositionChanged {
            tile,
            action,
            level,
        });
        Ok(BuildReceipt {
            tile,
            action,
            level,
            cost,
        })
    }

    pub fn outbox(&mut self) -> &mut Outbox<SimEvent> {
        &mut self.outbox
    }
}

fn slot(action: BuildAction) -> usize {
    match action {
        BuildAction::Grass => 0,
        BuildAction::Bush => 1,
        BuildAction::Tree => 2,
    }
}

fn check_composition(composition: &TileComposition, action: BuildAction) -> Outcome<()> {
    match action {
        BuildAction::Grass if composition.grass_level >= MAX_LEVEL => Err(Rejection::GrassMaxed),
        BuildAction::Bush if composition.grass_level <= 0 => Err(Rejection::NeedsGrass),
        BuildAction::Bush if composition.bush_level >= MAX_LEVEL => Err(Rejection::BushMaxed),
        BuildAction::Tree if composition.grass_level < 2 => Err(Rejection::NeedsDenseGrass),
        BuildAction::Tree if composition.tree_level >= MAX_LEVEL => Err(Rejection::TreeMaxed),
        _ => Ok(()),
    }
}
