pub mod animals;
pub mod availability;
pub mod build;
pub mod composition;
pub mod config;
pub mod deck;
pub mod economy;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod rng;
pub mod runtime;
pub mod scenario;
pub mod selection;
pub mod snapshot;

pub use config::Config;
pub use engine::{Command, Simulation, SimulationBuilder};
pub use error::{Outcome, Rejection};
pub use events::SimEvent;
pub use grid::{HexGrid, TileId};
pub use scenario::{Scenario, ScenarioLoader};
