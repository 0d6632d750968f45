use std::path::PathBuf;

use anyhow::Context;
use aurus_navigation::StrategyRegistry;
use aurus_sim::config::{DEFAULT_CONFIG_PATH, SimConfig};
use aurus_sim::simulation::Simulation;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Aurus: an autonomous ground-vehicle navigation simulator.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Planning strategy to use, overriding the configuration.
    #[arg(short, long)]
    strategy: Option<String>,

    /// Stop after this many perceive/plan cycles.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Print the registered planning strategies and exit.
    #[arg(long, default_value_t = false)]
    list_strategies: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    let registry = StrategyRegistry::with_defaults();

    if cli.list_strategies {
        for name in registry.names() {
            println!("{name}");
        }
        return Ok(());
    }

    let mut config = SimConfig::load_from(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(strategy) = cli.strategy {
        config.vehicle.strategy = strategy;
    }
    if cli.max_cycles.is_some() {
        config.simulation.max_cycles = cli.max_cycles;
    }

    let simulation = Simulation::new(config, &registry).context("failed to set up the simulation")?;
    let shutdown = simulation.shutdown_handle();

    info!("Aurus simulator started. Press Ctrl-C to stop.");
    let mut task = tokio::task::spawn_blocking(move || simulation.run());
    let outcome = tokio::select! {
        joined = &mut task => joined.context("simulation task panicked")??,
        _ = tokio::signal::ctrl_c() => {
            warn!("Ctrl-C received, stopping the simulation");
            shutdown.trigger();
            task.await.context("simulation task panicked")??
        }
    };

    if outcome.reached_goal {
        info!(cycles = outcome.cycles, elapsed = ?outcome.elapsed, "Goal reached");
    } else {
        warn!(cycles = outcome.cycles, final_pose = %outcome.final_pose, "Stopped before reaching the goal");
    }
    Ok(())
}
