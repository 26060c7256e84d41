//! One-dimensional directed percolation on a ring lattice.
//!
//! [`lattice`] holds the stochastic update rule, [`simulation`] drives single runs
//! and ensembles of runs, handing finished trajectories to
//! [`TrajectorySink`](percolation_common::TrajectorySink)s.

pub mod lattice;
pub mod lattice_state;
pub mod output;
pub mod progress;
pub mod simulation;

pub use lattice::{density, step, step_into, EMPTY, WET};
pub use simulation::{derive_run_seed, single_run, PercolationSimulation};
