use crate::sim_params::SimParams;
use crate::trajectory::DensityTrajectory;
use serde::{Deserialize, Serialize};

/// Aggregate outcome of an ensemble, written next to the per-run CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnsembleSummary {
    pub params: SimParams,
    /// Seed the session was started from; absent when seeded from the OS.
    pub seed: Option<u64>,
    pub runs_completed: usize,
    /// Mean density per time step over all completed runs.
    pub mean_density: DensityTrajectory,
    /// Trajectory of the final run, kept for single-run plots.
    pub last_run: Option<DensityTrajectory>,
}
