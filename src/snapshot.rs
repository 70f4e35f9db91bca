//! Serializable views of a running simulation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::build::BuildAction;
use crate::composition::TileComposition;
use crate::deck::{TileDraw, TileType};
use crate::engine::Simulation;
use crate::runtime::TemplateHandle;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub scenario: String,
    pub elapsed: f64,
    pub economy: EconomySnapshot,
    pub built: BuiltCounts,
    pub deck: DeckSnapshot,
    /// Axial address of the selected tile.
    pub selected: Option<(i32, i32)>,
    pub occupied_count: usize,
    pub tiles: Vec<TileSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    pub currency: f64,
    pub income_per_tick: f64,
    pub tick_interval: f64,
    pub carried_time: f64,
    pub next_expansion_cost: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltCounts {
    pub grass: u32,
    pub bush: u32,
    pub tree: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckSnapshot {
    pub remaining: usize,
    pub target_size: usize,
    pub current: Option<TileDraw>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub q: i32,
    pub r: i32,
    pub occupied: bool,
    pub available: bool,
    pub tile_type: TileType,
    pub template: Option<TemplateHandle>,
    pub composition: TileComposition,
}

impl SimulationSnapshot {
    /// Captures the simulation as of its last committed command. Tiles that were
    /// never touched are left out.
    pub fn capture(scenario: &str, simulation: &Simulation) -> Self {
        let ledger = simulation.ledger();
        let builds = simulation.builds();
        let deck = simulation.deck();
        let grid = simulation.grid();
        let store = simulation.store();

        let tiles = grid
            .tiles()
            .iter()
            .filter_map(|tile| {
                let runtime = store.lookup(tile.id)?;
                let touched = runtime.occupied
                    || runtime.available
                    || !runtime.composition.is_bare();
                touched.then(|| TileSnapshot {
                    q: tile.q(),
                    r: tile.r(),
                    occupied: runtime.occupied,
                    available: runtime.available && !runtime.occupied,
                    tile_type: runtime.tile_type,
                    template: runtime.template,
                    composition: runtime.composition,
                })
            })
            .collect();

        Self {
            scenario: scenario.to_string(),
            elapsed: simulation.elapsed(),
            economy: EconomySnapshot {
                currency: ledger.currency(),
                income_per_tick: ledger.income_per_tick(),
                tick_interval: ledger.tick_interval(),
                carried_time: ledger.carried_time(),
                next_expansion_cost: ledger.next_expansion_cost(),
            },
            built: BuiltCounts {
                grass: builds.built_count(BuildAction::Grass),
                bush: builds.built_count(BuildAction::Bush),
                tree: builds.built_count(BuildAction::Tree),
            },
            deck: DeckSnapshot {
                remaining: deck.len(),
                target_size: deck.target_size(),
                current: deck.current().cloned(),
            },
            selected: simulation
                .selection()
                .and_then(|id| grid.tile(id))
                .map(|tile| (tile.q(), tile.r())),
            occupied_count: store.occupied_count(),
            tiles,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Writes `<dir>/<scenario>.json`, creating `dir` as needed.
    pub fn write_json(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.json", self.scenario));
        fs::write(&path, self.to_json()?)?;
        Ok(path)
    }

    pub fn read_json(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::engine::SimulationBuilder;

    fn seeded() -> Simulation {
        let mut config = Config::meadow();
        config.grid.rows = 3;
        config.grid.cols = 3;
        let mut sim = SimulationBuilder::new(config).with_seed(11).build();
        sim.seed_center().unwrap();
        sim
    }

    #[test]
    fn captures_frontier_and_economy() {
        let sim = seeded();
        let snapshot = SimulationSnapshot::capture("meadow", &sim);
        assert_eq!(snapshot.occupied_count, 1);
        assert_eq!(snapshot.tiles.iter().filter(|t| t.occupied).count(), 1);
        assert_eq!(snapshot.tiles.iter().filter(|t| t.available).count(), 6);
        assert_eq!(snapshot.economy.currency, 25.0);
        assert_eq!(snapshot.economy.next_expansion_cost, 5.0);
        assert_eq!(snapshot.deck.remaining, 12);
    }

    #[test]
    fn json_file_round_trip() {
        let sim = seeded();
        let snapshot = SimulationSnapshot::capture("meadow", &sim);
        let dir = tempfile::tempdir().unwrap();
        let path = snapshot.write_json(dir.path()).unwrap();
        assert!(path.ends_with("meadow.json"));
        assert_eq!(SimulationSnapshot::read_json(&path).unwrap(), snapshot);
    }
}
