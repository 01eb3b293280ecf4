//! Batch scenario runner.
//!
//! Runs the same scenario many times in parallel using rayon. Every
//! run must land on the same final state hash; a divergence means the
//! core leaked non-determinism and fails the batch.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use turret_core::error::{Result, TurretError};

use crate::runner::{run_scenario, ScenarioMetrics};
use crate::scenario::Scenario;

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario file to run; `None` uses the built-in skirmish.
    pub scenario: Option<PathBuf>,
    /// Number of runs.
    pub runs: u32,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: None,
            runs: 16,
        }
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Scenario name.
    pub scenario: String,
    /// Number of runs completed.
    pub runs: u32,
    /// Whether every run produced the same final hash.
    pub deterministic: bool,
    /// Distinct final hashes observed (length 1 when deterministic).
    pub unique_hashes: Vec<u64>,
    /// Metrics of the first run, representative when deterministic.
    pub metrics: ScenarioMetrics,
    /// Total wall-clock runtime in seconds.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error when the file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Run a scenario `config.runs` times in parallel.
///
/// # Errors
///
/// Returns an error when the scenario fails to load or every run
/// fails to build its registry.
pub fn run_batch(config: &BatchConfig) -> Result<BatchResults> {
    let scenario = match &config.scenario {
        Some(path) => Scenario::load_from_path(path)?,
        None => Scenario::skirmish(),
    };

    info!(scenario = %scenario.name, runs = config.runs, "starting batch");
    let start = Instant::now();

    let all: Vec<ScenarioMetrics> = (0..config.runs)
        .into_par_iter()
        .map(|_| run_scenario(&scenario))
        .collect::<Result<_>>()?;

    let first = all
        .first()
        .cloned()
        .ok_or_else(|| TurretError::InvalidState("batch of zero runs".to_string()))?;

    let mut unique_hashes: Vec<u64> = all.iter().map(|m| m.final_hash).collect();
    unique_hashes.sort_unstable();
    unique_hashes.dedup();
    let deterministic = unique_hashes.len() == 1;

    if !deterministic {
        warn!(
            hashes = unique_hashes.len(),
            "batch runs diverged - non-determinism detected"
        );
    }

    Ok(BatchResults {
        scenario: scenario.name,
        runs: config.runs,
        deterministic,
        unique_hashes,
        metrics: first,
        duration_seconds: start.elapsed().as_secs_f64(),
    })
}
