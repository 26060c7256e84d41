use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Density of wet sites at every time step of one run, initial step included.
/// Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityTrajectory(Vec<f64>);

impl DensityTrajectory {
    pub fn from_values(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.0
    }
}

/// Consumer of finished trajectories, fed in run-completion order.
///
/// Sinks only ever see complete trajectories, so a failing sink cannot leave
/// a run half-written in the simulation state.
pub trait TrajectorySink {
    fn accept(&mut self, run_index: usize, trajectory: &DensityTrajectory) -> anyhow::Result<()>;
}

impl<S: TrajectorySink + ?Sized> TrajectorySink for &mut S {
    fn accept(&mut self, run_index: usize, trajectory: &DensityTrajectory) -> anyhow::Result<()> {
        (**self).accept(run_index, trajectory)
    }
}

// Fan-out: both sinks see every trajectory, left first.
impl<A: TrajectorySink, B: TrajectorySink> TrajectorySink for (A, B) {
    fn accept(&mut self, run_index: usize, trajectory: &DensityTrajectory) -> anyhow::Result<()> {
        self.0.accept(run_index, trajectory)?;
        self.1.accept(run_index, trajectory)
    }
}

// A disabled sink (`None`) drops every run.
impl<S: TrajectorySink> TrajectorySink for Option<S> {
    fn accept(&mut self, run_index: usize, trajectory: &DensityTrajectory) -> anyhow::Result<()> {
        match self {
            Some(sink) => sink.accept(run_index, trajectory),
            None => Ok(()),
        }
    }
}

/// Collection of trajectories that all share the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ensemble {
    trajectories: Vec<DensityTrajectory>,
}

impl Ensemble {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(runs: usize) -> Self {
        Self {
            trajectories: Vec::with_capacity(runs),
        }
    }

    /// Appends a trajectory, rejecting it if its length differs from the first one.
    pub fn push(&mut self, trajectory: DensityTrajectory) -> Result<(), SimError> {
        if let Some(expected) = self.trajectory_len() {
            if trajectory.len() != expected {
                return Err(SimError::ShapeMismatch {
                    expected,
                    found: trajectory.len(),
                });
            }
        }
        self.trajectories.push(trajectory);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    /// Length shared by every trajectory, `None` while empty.
    pub fn trajectory_len(&self) -> Option<usize> {
        self.trajectories.first().map(DensityTrajectory::len)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DensityTrajectory> {
        self.trajectories.iter()
    }

    pub fn last(&self) -> Option<&DensityTrajectory> {
        self.trajectories.last()
    }

    /// Mean density per time step across all runs.
    pub fn column_means(&self) -> Result<DensityTrajectory, SimError> {
        let mut acc = MeanAccumulator::new(self.trajectory_len().ok_or(SimError::EmptyEnsemble)?);
        for trajectory in &self.trajectories {
            acc.add(trajectory)?;
        }
        acc.mean()
    }
}

impl TrajectorySink for Ensemble {
    fn accept(&mut self, _run_index: usize, trajectory: &DensityTrajectory) -> anyhow::Result<()> {
        self.push(trajectory.clone())?;
        Ok(())
    }
}

/// Streaming per-step mean: keeps a running sum instead of the full ensemble.
#[derive(Debug, Clone)]
pub struct MeanAccumulator {
    sums: Vec<f64>,
    runs: usize,
}

impl MeanAccumulator {
    pub fn new(trajectory_len: usize) -> Self {
        Self {
            sums: vec![0.0; trajectory_len],
            runs: 0,
        }
    }

    pub fn add(&mut self, trajectory: &DensityTrajectory) -> Result<(), SimError> {
        if trajectory.len() != self.sums.len() {
            return Err(SimError::ShapeMismatch {
                expected: self.sums.len(),
                found: trajectory.len(),
            });
        }
        for (sum, value) in self.sums.iter_mut().zip(trajectory.iter()) {
            *sum += value;
        }
        self.runs += 1;
        Ok(())
    }

    pub fn runs(&self) -> usize {
        self.runs
    }

    pub fn mean(&self) -> Result<DensityTrajectory, SimError> {
        if self.runs == 0 {
            return Err(SimError::EmptyEnsemble);
        }
        let inv_runs = 1.0 / self.runs as f64;
        Ok(DensityTrajectory::from_values(
            self.sums.iter().map(|sum| sum * inv_runs).collect(),
        ))
    }
}

impl TrajectorySink for MeanAccumulator {
    fn accept(&mut self, _run_index: usize, trajectory: &DensityTrajectory) -> anyhow::Result<()> {
        self.add(trajectory)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traj(values: &[f64]) -> DensityTrajectory {
        DensityTrajectory::from_values(values.to_vec())
    }

    #[test]
    fn ensemble_rejects_ragged_trajectories() {
        let mut ensemble = Ensemble::new();
        ensemble.push(traj(&[1.0, 0.5, 0.25])).unwrap();
        let err = ensemble.push(traj(&[1.0, 0.5])).unwrap_err();
        assert_eq!(err, SimError::ShapeMismatch { expected: 3, found: 2 });
        assert_eq!(ensemble.len(), 1);
    }

    #[test]
    fn column_means_average_each_time_step() {
        let mut ensemble = Ensemble::new();
        ensemble.push(traj(&[1.0, 0.5, 0.0])).unwrap();
        ensemble.push(traj(&[1.0, 0.0, 0.0])).unwrap();
        ensemble.push(traj(&[1.0, 1.0, 0.6])).unwrap();
        let mean = ensemble.column_means().unwrap();
        let expected = [1.0, 0.5, 0.2];
        for (m, e) in mean.iter().zip(expected) {
            assert!((m - e).abs() < 1e-12, "{m} vs {e}");
        }
    }

    #[test]
    fn column_means_of_empty_ensemble_fails() {
        assert_eq!(Ensemble::new().column_means().unwrap_err(), SimError::EmptyEnsemble);
    }

    #[test]
    fn accumulator_matches_materialised_mean() {
        let rows = [[1.0, 0.3, 0.1], [1.0, 0.7, 0.2], [1.0, 0.2, 0.0], [1.0, 0.8, 0.5]];
        let mut ensemble = Ensemble::new();
        let mut acc = MeanAccumulator::new(3);
        for (i, row) in rows.iter().enumerate() {
            let t = traj(row);
            ensemble.accept(i, &t).unwrap();
            acc.accept(i, &t).unwrap();
        }
        assert_eq!(acc.runs(), 4);
        assert_eq!(acc.mean().unwrap(), ensemble.column_means().unwrap());
    }

    #[test]
    fn accumulator_rejects_wrong_length() {
        let mut acc = MeanAccumulator::new(4);
        assert!(acc.add(&traj(&[1.0, 0.0])).is_err());
        assert_eq!(acc.mean().unwrap_err(), SimError::EmptyEnsemble);
    }

    #[test]
    fn paired_sinks_both_receive_every_run() {
        let mut ensemble = Ensemble::new();
        let mut acc = MeanAccumulator::new(2);
        {
            let mut both = (&mut ensemble, &mut acc);
            both.accept(0, &traj(&[1.0, 0.4])).unwrap();
            both.accept(1, &traj(&[1.0, 0.6])).unwrap();
        }
        assert_eq!(ensemble.len(), 2);
        assert_eq!(acc.runs(), 2);
    }
}
