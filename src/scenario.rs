use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::Config;
use crate::engine::{Command, Simulation, SimulationBuilder};

fn default_seed() -> u64 {
    42
}

/// A config plus a command log. Replaying the same scenario with the same seed
/// always ends in the same state.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub config: Config,
    #[serde(default)]
    pub commands: Vec<Command>,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario: Scenario = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        scenario
            .config
            .validate()
            .with_context(|| format!("Invalid config in {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn seed(&self, override_seed: Option<u64>) -> u64 {
        override_seed.unwrap_or(self.seed)
    }

    pub fn build_simulation(&self, seed: u64) -> Simulation {
        SimulationBuilder::new(self.config.clone())
            .with_seed(seed)
            .build()
    }
}
