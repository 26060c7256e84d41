use crate::sim_params::SimParams;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Ring lattice dimensions
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LatticeConfig {
    pub size: usize,
}

// Number of update steps per run
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub iterations: usize,
}

// Ensemble size, bond probability and how runs are executed
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EnsembleConfig {
    pub runs: usize,
    pub bond_probability: f64,
    #[serde(default)]
    pub seed: Option<u64>, // None seeds from the OS
    #[serde(default)]
    pub parallel: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize, // Runs per parallel batch
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_base_filename")]
    pub base_filename: String,
    #[serde(default = "default_true")]
    pub save_runs: bool, // Stream one CSV row per run
    #[serde(default = "default_true")]
    pub save_summary: bool,
    pub format: Option<String>, // Summary format: "json", "bincode", "messagepack"
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: default_directory(),
            base_filename: default_base_filename(),
            save_runs: true,
            save_summary: true,
            format: None,
        }
    }
}

fn default_chunk_size() -> usize {
    64
}

fn default_directory() -> PathBuf {
    PathBuf::from(".")
}

fn default_base_filename() -> String {
    "perco".to_string()
}

fn default_true() -> bool {
    true
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub lattice: LatticeConfig,
    pub timing: TimingConfig,
    pub ensemble: EnsembleConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        Self::from_toml_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Invalid config '{}': {}", path_ref.display(), e))
    }

    /// Parses and validates a configuration held in memory.
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;

        // --- Validation ---
        config.get_sim_params()?;
        if config.ensemble.chunk_size == 0 {
            anyhow::bail!("chunk_size must be greater than 0.");
        }
        if config.output.base_filename.trim().is_empty() {
            anyhow::bail!("base_filename must not be empty.");
        }

        Ok(config)
    }

    /// Converts the configuration into the validated parameters used at runtime.
    pub fn get_sim_params(&self) -> Result<SimParams> {
        Ok(SimParams::new(
            self.lattice.size,
            self.timing.iterations,
            self.ensemble.runs,
            self.ensemble.bond_probability,
        )?)
    }
}
