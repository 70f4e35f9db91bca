use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hexgrove::{scenario::ScenarioLoader, snapshot::SimulationSnapshot};

#[derive(Debug, Parser)]
#[command(author, version, about = "Hex grove scenario runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/meadow.yaml")]
    scenario: PathBuf,

    /// Override the scenario seed
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final snapshot as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// Also write the final snapshot to this directory
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&scenario.config.logging.level))
        .context("Invalid logging.level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let seed = scenario.seed(cli.seed);
    let mut simulation = scenario.build_simulation(seed);
    let summary = simulation.run_with_hook(&scenario.commands, |report| {
        if let Err(rejection) = &report.result {
            info!(index = report.index, command = ?report.command, %rejection, "command.rejected");
        }
    });
    simulation.shutdown();

    let snapshot = SimulationSnapshot::capture(&scenario.name, &simulation);
    if let Some(dir) = &cli.snapshot_dir {
        let path = snapshot
            .write_json(dir)
            .with_context(|| format!("Failed to write snapshot to {}", dir.display()))?;
        info!(path = %path.display(), "snapshot.written");
    }

    if cli.json {
        println!("{}", snapshot.to_json()?);
    } else {
        println!(
            "Scenario '{}' (seed {}) applied {} commands, {} rejected. Currency: {:.2}, occupied tiles: {}, deck remaining: {}",
            scenario.name,
            seed,
            summary.applied,
            summary.rejected,
            snapshot.economy.currency,
            snapshot.occupied_count,
            snapshot.deck.remaining
        );
    }
    Ok(())
}
