use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use std::time::Instant;

use percolation_common::{
    ensemble_file_stem, CsvTrajectoryWriter, DensityTrajectory, EnsembleSummary, MeanAccumulator,
    session_time, SimulationConfig, TrajectorySink,
};
use percolation_engine::output::{save_summary, SummaryFormat};
use percolation_engine::progress::ProgressReporter;
use percolation_engine::PercolationSimulation;

/// Keeps only the most recent trajectory so the summary can carry the last run.
#[derive(Default)]
struct LastRun(Option<DensityTrajectory>);

impl TrajectorySink for LastRun {
    fn accept(&mut self, _run_index: usize, trajectory: &DensityTrajectory) -> Result<()> {
        self.0 = Some(trajectory.clone());
        Ok(())
    }
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Percolation Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    info!("Loaded configuration from {}", config_path);

    let params = config.get_sim_params()?;
    info!(
        "p = {}, N = {}, T = {}, M = {}",
        params.bond_probability, params.lattice_size, params.iterations, params.runs
    );
    debug!("Simulation Parameters: {:#?}", params);

    let mut sim = PercolationSimulation::new(params, config.ensemble.seed)?;
    match sim.seed() {
        Some(seed) => info!("Random stream seeded with {}", seed),
        None => info!("Random stream seeded from the operating system"),
    }

    // --- Prepare Outputs ---
    let output_dir = &config.output.directory;
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory '{}'", output_dir.display()))?;
    let stem = ensemble_file_stem(&config.output.base_filename, &params, session_time());

    let mut csv_writer = if config.output.save_runs {
        let csv_path = output_dir.join(format!("{}.csv", stem));
        let writer = CsvTrajectoryWriter::create(&csv_path)?;
        info!("Streaming run densities to {}", csv_path.display());
        Some(writer)
    } else {
        info!("Skipping per-run CSV output as per config (save_runs is false).");
        None
    };

    let mut mean = MeanAccumulator::new(params.trajectory_len());
    let mut last = LastRun::default();
    let mut progress = ProgressReporter::new(params.runs);

    // --- Run Ensemble ---
    let start_time = Instant::now();
    let sinks = (&mut csv_writer, (&mut mean, (&mut last, &mut progress)));
    let result = if config.ensemble.parallel {
        sim.run_ensemble_parallel(config.ensemble.chunk_size, sinks)
    } else {
        sim.run_ensemble(sinks)
    };
    let total_duration = start_time.elapsed();

    if let Err(e) = &result {
        error!(
            "Ensemble aborted after {} of {} runs: {:#}",
            mean.runs(),
            params.runs,
            e
        );
        if let Some(writer) = &csv_writer {
            warn!(
                "{} completed runs remain in {}",
                writer.rows_written(),
                writer.path().display()
            );
        }
    }
    result?;

    info!(
        "End of simulation! {} runs in {:.3} seconds ({:.3} minutes).",
        sim.runs_completed(),
        total_duration.as_secs_f64(),
        total_duration.as_secs_f64() / 60.0
    );

    // --- Save Summary ---
    if config.output.save_summary {
        let summary = EnsembleSummary {
            params,
            seed: sim.seed(),
            runs_completed: mean.runs(),
            mean_density: mean.mean()?,
            last_run: last.0,
        };
        let format = SummaryFormat::from_config(config.output.format.as_deref());
        save_summary(&summary, output_dir, &stem, format)?;
    } else {
        info!("Skipping ensemble summary as per config (save_summary is false).");
    }

    info!("Simulation Complete.");
    Ok(())
}
