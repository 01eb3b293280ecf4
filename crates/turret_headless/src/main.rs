//! Modular Turrets - Headless Scenario Runner

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use turret_headless::batch::{run_batch, BatchConfig};
use turret_headless::runner::run_scenario;
use turret_headless::scenario::Scenario;

#[derive(Parser)]
#[command(name = "turret-headless")]
#[command(about = "Headless scenario runner for the turret decision core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single scenario and print its metrics as JSON
    Run {
        /// Path to a RON scenario file (built-in skirmish if omitted)
        #[arg(long)]
        scenario: Option<PathBuf>,
    },
    /// Run a scenario repeatedly in parallel and check determinism
    Batch {
        /// Path to a RON scenario file (built-in skirmish if omitted)
        #[arg(long)]
        scenario: Option<PathBuf>,
        /// Number of runs
        #[arg(long, default_value_t = 16)]
        runs: u32,
        /// Write results to this JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scenario } => {
            let scenario = match scenario {
                Some(path) => match Scenario::load_from_path(&path) {
                    Ok(s) => s,
                    Err(e) => {
                        tracing::error!("Failed to load scenario: {e}");
                        std::process::exit(1);
                    }
                },
                None => Scenario::skirmish(),
            };

            match run_scenario(&scenario) {
                Ok(metrics) => match serde_json::to_string_pretty(&metrics) {
                    Ok(json) => println!("{json}"),
                    Err(e) => {
                        tracing::error!("Failed to encode metrics: {e}");
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    tracing::error!("Scenario failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Batch {
            scenario,
            runs,
            output,
        } => {
            let config = BatchConfig { scenario, runs };
            match run_batch(&config) {
                Ok(results) => {
                    tracing::info!(
                        scenario = %results.scenario,
                        runs = results.runs,
                        deterministic = results.deterministic,
                        seconds = results.duration_seconds,
                        "batch complete"
                    );
                    if let Some(path) = output {
                        if let Err(e) = results.save(&path) {
                            tracing::error!("Failed to write results: {e}");
                            std::process::exit(1);
                        }
                    }
                    if !results.deterministic {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    tracing::error!("Batch failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
