use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Validated parameters of a simulation session. Fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimParams {
    /// Number of sites N on the ring.
    pub lattice_size: usize,
    /// Number of update steps T per run.
    pub iterations: usize,
    /// Number of independent runs M in the ensemble.
    pub runs: usize,
    /// Probability p that a causal link transmits infection.
    pub bond_probability: f64,
}

impl SimParams {
    /// Validates and builds a parameter set. Nothing is simulated with unchecked values.
    pub fn new(
        lattice_size: usize,
        iterations: usize,
        runs: usize,
        bond_probability: f64,
    ) -> Result<Self, SimError> {
        validate_lattice_size(lattice_size)?;
        if runs == 0 {
            return Err(SimError::invalid("runs", "must be at least 1"));
        }
        validate_probability(bond_probability)?;
        Ok(Self {
            lattice_size,
            iterations,
            runs,
            bond_probability,
        })
    }

    /// Length of every trajectory produced under these parameters (initial step included).
    pub fn trajectory_len(&self) -> usize {
        self.iterations + 1
    }
}

pub fn validate_lattice_size(lattice_size: usize) -> Result<(), SimError> {
    if lattice_size == 0 {
        return Err(SimError::invalid("lattice_size", "lattice must have at least one site"));
    }
    Ok(())
}

/// Rejects NaN and anything outside `[0, 1]`.
pub fn validate_probability(p: f64) -> Result<(), SimError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(SimError::invalid(
            "bond_probability",
            format!("must lie in [0, 1], got {p}"),
        ));
    }
    Ok(())
}
