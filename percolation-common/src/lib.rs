pub mod config;
pub mod error;
pub mod persistence;
pub mod sim_params;
pub mod summary;
pub mod trajectory;

// Re-export key types for easier use by dependent crates
pub use config::{EnsembleConfig, LatticeConfig, OutputConfig, SimulationConfig, TimingConfig};
pub use error::SimError;
pub use persistence::{ensemble_file_stem, read_ensemble, session_time, CsvTrajectoryWriter};
pub use sim_params::{validate_lattice_size, validate_probability, SimParams};
pub use summary::EnsembleSummary;
pub use trajectory::{DensityTrajectory, Ensemble, MeanAccumulator, TrajectorySink};
