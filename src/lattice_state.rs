use crate::lattice::{density, step_into, WET};
use percolation_common::{validate_lattice_size, validate_probability, SimError};
use rand::Rng;

/// Lattice storage for one run, reused across runs.
#[derive(Debug)]
pub struct LatticeState {
    bond_probability: f64,

    // --- Ping-Pong Buffers ---
    // Sites at step t (current step's input)
    sites_in: Vec<u8>,
    // Sites at step t + 1 (current step's output)
    sites_out: Vec<u8>,
}

impl LatticeState {
    /// Allocates both buffers with every site wet.
    pub fn new(lattice_size: usize, bond_probability: f64) -> Result<Self, SimError> {
        validate_lattice_size(lattice_size)?;
        validate_probability(bond_probability)?;
        Ok(Self {
            bond_probability,
            sites_in: vec![WET; lattice_size],
            sites_out: vec![WET; lattice_size],
        })
    }

    /// Restores the fully wet initial condition.
    pub fn reset_wet(&mut self) {
        self.sites_in.fill(WET);
    }

    /// Advances one time step: all of step t+1 is computed from step t, then the buffers swap.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) {
        step_into(&self.sites_in, &mut self.sites_out, self.bond_probability, rng);
        self.swap_buffers();
    }

    /// Swaps the input and output buffers.
    fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.sites_in, &mut self.sites_out);
    }

    pub fn sites(&self) -> &[u8] {
        &self.sites_in
    }

    pub fn density(&self) -> f64 {
        // Size was validated at construction.
        density(&self.sites_in).unwrap_or(0.0)
    }
}
