//! Simulation root.
//!
//! Owns every component, initializes them in dependency order (grid, runtime
//! store, then the services that read them) and runs one command at a time.
//! After each committed command the component outboxes are drained, derived
//! state (grid income, expansion price, frontier flags) is brought up to date
//! and the events go out to subscribers.

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::animals::{self, AnimalType};
use crate::availability::AvailabilityService;
use crate::build::{BuildAction, BuildController, BuildOption, BuildReceipt};
use crate::config::Config;
use crate::deck::{TileDeck, TileDraw};
use crate::economy::{EconomyLedger, GridIncome, IncomeSource, IncomeTick};
use crate::error::{Outcome, Rejection};
use crate::events::{Outbox, SimEvent, Subscriber};
use crate::grid::{query, FlatSurface, HexGrid, SurfaceProjector, TileId};
use crate::rng::{RngManager, DECK_STREAM};
use crate::runtime::{OccupantHandle, TileRuntimeStore};
use crate::selection::SelectionModel;

/// Axial address used by scripted commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axial {
    pub q: i32,
    pub r: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Advance {
        seconds: f64,
    },
    SeedCenter,
    Select {
        q: i32,
        r: i32,
    },
    ClearSelection,
    Build {
        action: BuildAction,
        #[serde(default)]
        at: Option<Axial>,
    },
    Claim {
        q: i32,
        r: i32,
    },
    /// Claims the first frontier tile in grid order.
    ClaimNext,
    Free {
        q: i32,
        r: i32,
    },
    Draw,
    RebuildDeck {
        #[serde(default)]
        size: Option<usize>,
    },
    RebuildGrid {
        rows: u32,
        cols: u32,
    },
    Grant {
        amount: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Claim {
    pub tile: TileId,
    pub cost: f64,
    pub occupant: OccupantHandle,
    pub draw: TileDraw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Advanced(Option<IncomeTick>),
    Seeded(TileId),
    Selected(Option<TileId>),
    Built(BuildReceipt),
    Claimed(Claim),
    Freed(TileId),
    Drawn(Option<TileDraw>),
    DeckRebuilt { size: usize },
    GridRebuilt { tiles: usize },
    Granted { balance: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommandReport {
    pub index: usize,
    pub command: Command,
    pub result: Outcome<Applied>,
    pub events: Vec<SimEvent>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub applied: usize,
    pub rejected: usize,
}

pub struct SimulationBuilder {
    config: Config,
    seed: u64,
    projector: Box<dyn SurfaceProjector>,
    sources: Vec<Rc<dyn IncomeSource>>,
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl SimulationBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            seed: 0,
            projector: Box::new(FlatSurface),
            sources: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_projector(mut self, projector: impl SurfaceProjector + 'static) -> Self {
        self.projector = Box::new(projector);
        self
    }

    pub fn with_income_source(mut self, source: Rc<dyn IncomeSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_subscriber(mut self, subscriber: impl Subscriber + 'static) -> Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    pub fn build(self) -> Simulation {
        let mut simulation = Simulation {
            ledger: EconomyLedger::new(&self.config.economy),
            builds: BuildController::new(&self.config.build),
            deck: TileDeck::new(self.config.deck.groups.clone()),
            config: self.config.clone(),
            rng: RngManager::new(self.seed),
            projector: self.projector,
            grid: HexGrid::new(),
            store: TileRuntimeStore::default(),
            availability: AvailabilityService::new(),
            grid_income: Rc::new(GridIncome::new()),
            selection: SelectionModel::new(),
            subscribers: self.subscribers,
            outbox: Outbox::default(),
            pending: Vec::new(),
            next_occupant: 0,
            elapsed: 0.0,
        };
        simulation.init(self.config);
        for source in self.sources {
            simulation.ledger.register(source);
        }
        simulation
    }
}

pub struct Simulation {
    config: Config,
    rng: RngManager,
    projector: Box<dyn SurfaceProjector>,
    grid: HexGrid,
    store: TileRuntimeStore,
    availability: AvailabilityService,
    builds: BuildController,
    ledger: EconomyLedger,
    grid_income: Rc<GridIncome>,
    deck: TileDeck,
    selection: SelectionModel,
    subscribers: Vec<Box<dyn Subscriber>>,
    outbox: Outbox<SimEvent>,
    pending: Vec<SimEvent>,
    next_occupant: u64,
    elapsed: f64,
}

impl Simulation {
    /// Brings every component to its starting state for `config`. Anything
    /// keyed by tiles of a previous grid is discarded.
    pub fn init(&mut self, config: Config) {
        self.config = config;
        self.rng.reset();
        self.elapsed = 0.0;
        self.next_occupant = 0;

        self.rebuild_grid_state();

        self.builds.configure(&self.config.build);
        self.builds.recalculate_built_counts(&self.grid, &self.store);

        self.ledger.reinitialize(&self.config.economy);
        let grid_income: Rc<dyn IncomeSource> = self.grid_income.clone();
        self.ledger.register(grid_income);
        self.ledger.refresh_expansion_cost(self.store.occupied_count());

        self.deck.set_groups(self.config.deck.groups.clone());
        if self.config.deck.rebuild_on_start {
            self.deck
                .rebuild(self.config.deck.size, self.rng.stream(DECK_STREAM));
        }

        info!(
            rows = self.grid.rows(),
            cols = self.grid.cols(),
            deck = self.deck.len(),
            currency = self.ledger.currency(),
            "simulation.init"
        );
        self.commit();
    }

    /// Detaches income sources and subscribers. Undelivered events stay
    /// available through [`Simulation::drain_events`].
    pub fn shutdown(&mut self) {
        self.commit();
        self.ledger.clear_sources();
        self.subscribers.clear();
        info!(elapsed = self.elapsed, "simulation.shutdown");
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn grid(&self) -> &HexGrid {
        &self.grid
    }

    pub fn store(&self) -> &TileRuntimeStore {
        &self.store
    }

    pub fn ledger(&self) -> &EconomyLedger {
        &self.ledger
    }

    pub fn builds(&self) -> &BuildController {
        &self.builds
    }

    pub fn deck(&self) -> &TileDeck {
        &self.deck
    }

    pub fn selection(&self) -> Option<TileId> {
        self.selection.selected()
    }

    pub fn grid_income(&self) -> &GridIncome {
        &self.grid_income
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn subscribe(&mut self, subscriber: impl Subscriber + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn register_income(&mut self, source: Rc<dyn IncomeSource>) -> bool {
        self.ledger.register(source)
    }

    pub fn unregister_income(&mut self, source: &Rc<dyn IncomeSource>) -> bool {
        self.ledger.unregister(source)
    }

    /// Events committed since the last call, oldest first.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn resolve(&self, q: i32, r: i32) -> Outcome<TileId> {
        self.grid
            .tile_at_axial(q, r)
            .map(|tile| tile.id)
            .ok_or(Rejection::UnknownTile { q, r })
    }

    /// Current frontier in grid order.
    pub fn available(&mut self) -> Vec<TileId> {
        self.availability
            .available(&self.grid, &mut self.store)
            .collect()
    }

    pub fn nearest_tile(&self, point: glam::Vec3, max_distance: Option<f32>) -> Outcome<TileId> {
        query::nearest_tile(&self.grid, point, max_distance)
    }

    pub fn nearest_free_tile(
        &self,
        point: glam::Vec3,
        max_distance: Option<f32>,
    ) -> Outcome<TileId> {
        query::nearest_free_tile(&self.grid, &self.store, point, max_distance)
    }

    /// First run of adjacent tiles whose biomes match `animal`'s habitat.
    pub fn animal_path(&self, animal: AnimalType) -> Option<Vec<TileId>> {
        animals::find_path(&self.grid, &self.store, animal)
    }

    pub fn build_options(&self, tile: Option<TileId>) -> [BuildOption; 3] {
        self.builds.options(&self.store, &self.ledger, tile)
    }

    pub fn advance(&mut self, seconds: f64) -> Option<IncomeTick> {
        if seconds.is_finite() && seconds > 0.0 {
            self.elapsed += seconds;
        }
        let tick = self.ledger.advance(seconds);
        self.commit();
        tick
    }

    pub fn select(&mut self, tile: TileId) {
        assert!(
            self.grid.contains(tile),
            "selected tile {tile:?} belongs to a rebuilt grid"
        );
        self.selection.set(tile);
        self.commit();
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
        self.commit();
    }

    /// Applies `action` to `tile`, or to the selected tile when `tile` is `None`.
    pub fn build(&mut self, action: BuildAction, tile: Option<TileId>) -> Outcome<BuildReceipt> {
        let tile = tile.or(self.selection.selected());
        let result = self
            .builds
            .try_build(action, tile, &mut self.store, &mut self.ledger);
        self.commit();
        result
    }

    /// Occupies the center tile with the starting template, free of charge.
    pub fn seed_center(&mut self) -> Outcome<TileId> {
        let center = self.grid.center_tile().map(|t| t.id).ok_or(Rejection::NoTile)?;
        if self.store.is_occupied(center) {
            return Err(Rejection::TileOccupied);
        }
        let occupant = self.allocate_occupant();
        self.store
            .mark_occupied(center, Some(occupant), self.config.starting_template, None);
        self.commit();
        Ok(center)
    }

    /// Expands onto a frontier tile: pays the expansion price and places the
    /// next deck draw there. Either everything happens or nothing does.
    pub fn claim(&mut self, tile: TileId) -> Outcome<Claim> {
        let result = self.try_claim(tile);
        if let Err(rejection) = &result {
            debug!(?tile, %rejection, "claim.rejected");
        }
        self.commit();
        result
    }

    pub fn claim_next(&mut self) -> Outcome<Claim> {
        let tile = self
            .available()
            .first()
            .copied()
            .ok_or(Rejection::NotAvailable)?;
        self.claim(tile)
    }

    pub fn free(&mut self, tile: TileId) {
        self.store.free(tile);
        self.commit();
    }

    pub fn draw_tile(&mut self) -> Option<TileDraw> {
        let draw = self.deck.draw_tile();
        if let Some(draw) = &draw {
            self.outbox.push(SimEvent::TileDrawn { draw: draw.clone() });
        }
        self.commit();
        draw
    }

    pub fn rebuild_deck(&mut self, size: Option<usize>) -> usize {
        let size = size.unwrap_or(self.config.deck.size);
        self.deck.rebuild(size, self.rng.stream(DECK_STREAM));
        self.commit();
        self.deck.len()
    }

    /// Lays out a new grid. Every previously issued [`TileId`] is invalid
    /// afterwards, and all tile state is discarded; the ledger balance and the
    /// deck are kept.
    pub fn rebuild_grid(&mut self, rows: u32, cols: u32) -> usize {
        self.config.grid.rows = rows;
        self.config.grid.cols = cols;
        self.rebuild_grid_state();
        self.builds.recalculate_built_counts(&self.grid, &self.store);
        self.ledger.refresh_expansion_cost(self.store.occupied_count());
        self.commit();
        self.grid.len()
    }

    pub fn grant(&mut self, amount: f64) -> f64 {
        self.ledger.add_income(amount);
        self.commit();
        self.ledger.currency()
    }

    pub fn apply(&mut self, command: &Command) -> Outcome<Applied> {
        match *command {
            Command::Advance { seconds } => Ok(Applied::Advanced(self.advance(seconds))),
            Command::SeedCenter => self.seed_center().map(Applied::Seeded),
            Command::Select { q, r } => {
                let tile = self.resolve(q, r)?;
                self.select(tile);
                Ok(Applied::Selected(Some(tile)))
            }
            Command::ClearSelection => {
                self.clear_selection();
                Ok(Applied::Selected(None))
            }
            Command::Build { action, at } => {
                let tile = at.map(|a| self.resolve(a.q, a.r)).transpose()?;
                self.build(action, tile).map(Applied::Built)
            }
            Command::Claim { q, r } => {
                let tile = self.resolve(q, r)?;
                self.claim(tile).map(Applied::Claimed)
            }
            Command::ClaimNext => self.claim_next().map(Applied::Claimed),
            Command::Free { q, r } => {
                let tile = self.resolve(q, r)?;
                self.free(tile);
                Ok(Applied::Freed(tile))
            }
            Command::Draw => Ok(Applied::Drawn(self.draw_tile())),
            Command::RebuildDeck { size } => Ok(Applied::DeckRebuilt {
                size: self.rebuild_deck(size),
            }),
            Command::RebuildGrid { rows, cols } => Ok(Applied::GridRebuilt {
                tiles: self.rebuild_grid(rows, cols),
            }),
            Command::Grant { amount } => Ok(Applied::Granted {
                balance: self.grant(amount),
            }),
        }
    }

    pub fn run(&mut self, commands: &[Command]) -> RunSummary {
        self.run_with_hook(commands, |_| {})
    }

    /// Replays `commands` in order, handing each report to `hook`.
    pub fn run_with_hook<F>(&mut self, commands: &[Command], mut hook: F) -> RunSummary
    where
        F: FnMut(&CommandReport),
    {
        let mut summary = RunSummary::default();
        for (index, command) in commands.iter().enumerate() {
            let result = self.apply(command);
            match &result {
                Ok(_) => summary.applied += 1,
                Err(_) => summary.rejected += 1,
            }
            let report = CommandReport {
                index,
                command: command.clone(),
                result,
                events: self.drain_events(),
            };
            hook(&report);
        }
        summary
    }

    fn try_claim(&mut self, tile: TileId) -> Outcome<Claim> {
        if self.store.is_occupied(tile) {
            return Err(Rejection::TileOccupied);
        }
        if !self
            .availability
            .is_available(&self.grid, &mut self.store, tile)
        {
            return Err(Rejection::NotAvailable);
        }
        if self.deck.is_empty() {
            return Err(Rejection::DeckEmpty);
        }
        self.ledger.expansion_option()?;

        let draw = self.deck.draw_tile().ok_or(Rejection::DeckEmpty)?;
        let cost = self.ledger.try_spend_for_expansion()?;
        let occupant = self.allocate_occupant();
        self.store
            .mark_occupied(tile, Some(occupant), None, Some(draw.clone()));
        self.outbox.push(SimEvent::TileDrawn { draw: draw.clone() });
        Ok(Claim {
            tile,
            cost,
            occupant,
            draw,
        })
    }

    fn rebuild_grid_state(&mut self) {
        let grid = &self.config.grid;
        self.grid
            .build(grid.rows, grid.cols, grid.bounds(), self.projector.as_ref());
        self.store.reset_for(&self.grid);
        self.selection.clear();
        self.grid_income.rebuild(&self.grid, &self.store);
        self.outbox.push(SimEvent::GridRebuilt {
            generation: self.grid.generation(),
            tiles: self.grid.len(),
        });
    }

    fn allocate_occupant(&mut self) -> OccupantHandle {
        let handle = OccupantHandle(self.next_occupant);
        self.next_occupant += 1;
        handle
    }

    fn commit(&mut self) {
        let mut events: Vec<SimEvent> = self.outbox.drain().collect();
        events.extend(self.selection.outbox().drain());
        events.extend(self.builds.outbox().drain());
        events.extend(self.store.outbox().drain());
        events.extend(self.ledger.outbox().drain());
        events.extend(self.deck.outbox().drain());

        let mut occupancy_changed = false;
        for event in &events {
            match event {
                SimEvent::CompositionChanged { tile, .. } => {
                    let composition = self.store.composition(*tile);
                    self.grid_income.on_composition_changed(*tile, &composition);
                }
                SimEvent::TileOccupied { .. } | SimEvent::TileFreed { .. } => {
                    occupancy_changed = true;
                }
                _ => {}
            }
        }
        if occupancy_changed {
            self.ledger.refresh_expansion_cost(self.store.occupied_count());
        }
        self.availability.refresh(&self.grid, &mut self.store);

        for event in &events {
            for subscriber in &mut self.subscribers {
                subscriber.on_event(event);
            }
        }
        self.pending.extend(events);
    }
}
