use crate::lattice_state::LatticeState;
use log::{debug, info};
use percolation_common::{DensityTrajectory, Ensemble, SimError, SimParams, TrajectorySink};
use rand::prelude::*;
use rayon::prelude::*;

/// Runs one trajectory from the fully wet lattice: density at t = 0, then after each of
/// `params.iterations` steps.
pub fn single_run<R: Rng>(params: &SimParams, rng: &mut R) -> Result<DensityTrajectory, SimError> {
    let mut state = LatticeState::new(params.lattice_size, params.bond_probability)?;
    Ok(record_run(&mut state, params.iterations, rng))
}

fn record_run<R: Rng>(state: &mut LatticeState, iterations: usize, rng: &mut R) -> DensityTrajectory {
    state.reset_wet();
    let mut densities = Vec::with_capacity(iterations + 1);
    densities.push(state.density());
    for _ in 0..iterations {
        state.advance(rng);
        densities.push(state.density());
    }
    DensityTrajectory::from_values(densities)
}

/// Seed for run `run_index` when runs are executed on independent streams.
pub fn derive_run_seed(master_seed: u64, run_index: usize) -> u64 {
    master_seed.wrapping_add(run_index as u64)
}

/// Manages execution of a directed-percolation ensemble.
pub struct PercolationSimulation {
    params: SimParams,
    /// Stream shared by all runs of a sequential ensemble.
    rng: StdRng,
    /// Seed the session was configured with, if any.
    seed: Option<u64>,
    /// Base from which parallel runs derive their own streams.
    master_seed: u64,
    /// Buffers reused across sequential runs.
    state: LatticeState,
    runs_completed: usize,
}

impl PercolationSimulation {
    /// Creates a simulation. A fixed `seed` makes every ensemble reproducible; without one
    /// the stream is seeded from the operating system.
    pub fn new(params: SimParams, seed: Option<u64>) -> Result<Self, SimError> {
        let state = LatticeState::new(params.lattice_size, params.bond_probability)?;
        let (rng, master_seed) = match seed {
            Some(seed) => (StdRng::seed_from_u64(seed), seed),
            None => {
                let mut rng = StdRng::try_from_os_rng()
                    .map_err(|e| SimError::RandomSource(e.to_string()))?;
                let master_seed: u64 = rng.random();
                (rng, master_seed)
            }
        };
        Ok(Self {
            params,
            rng,
            seed,
            master_seed,
            state,
            runs_completed: 0,
        })
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn runs_completed(&self) -> usize {
        self.runs_completed
    }

    /// Runs one trajectory on the simulation's own stream.
    pub fn single_run(&mut self) -> DensityTrajectory {
        let trajectory = record_run(&mut self.state, self.params.iterations, &mut self.rng);
        self.runs_completed += 1;
        trajectory
    }

    /// Runs the ensemble one run after another, handing each trajectory to `sink` as it
    /// finishes. Only the random stream carries over between runs.
    ///
    /// A sink error stops the ensemble; trajectories already handed over stay valid.
    pub fn run_ensemble<S: TrajectorySink>(&mut self, mut sink: S) -> anyhow::Result<usize> {
        let runs = self.params.runs;
        info!("Running {} runs sequentially...", runs);
        for run_index in 0..runs {
            let trajectory = self.single_run();
            sink.accept(run_index, &trajectory)?;
        }
        Ok(runs)
    }

    /// Runs the ensemble on the rayon pool. Run `k` uses a stream seeded from
    /// `derive_run_seed(master_seed, k)`, so results do not depend on thread count or
    /// `chunk_size`. Each chunk is delivered to `sink` in run order before the next starts.
    pub fn run_ensemble_parallel<S: TrajectorySink>(
        &mut self,
        chunk_size: usize,
        mut sink: S,
    ) -> anyhow::Result<usize> {
        if chunk_size == 0 {
            return Err(SimError::invalid("chunk_size", "must be at least 1").into());
        }
        let runs = self.params.runs;
        let params = self.params;
        let master_seed = self.master_seed;
        info!(
            "Running {} runs on {} Rayon threads in chunks of {}...",
            runs,
            rayon::current_num_threads(),
            chunk_size
        );

        let mut chunk_start = 0;
        while chunk_start < runs {
            let chunk_end = (chunk_start + chunk_size).min(runs);
            let chunk: Vec<DensityTrajectory> = (chunk_start..chunk_end)
                .into_par_iter()
                .map(|run_index| {
                    let mut rng = StdRng::seed_from_u64(derive_run_seed(master_seed, run_index));
                    single_run(&params, &mut rng)
                })
                .collect::<Result<_, SimError>>()?;
            debug!("Chunk {}..{} finished", chunk_start, chunk_end);

            for (offset, trajectory) in chunk.iter().enumerate() {
                self.runs_completed += 1;
                sink.accept(chunk_start + offset, trajectory)?;
            }
            chunk_start = chunk_end;
        }
        Ok(runs)
    }

    /// Runs the whole ensemble sequentially and keeps it in memory.
    pub fn collect_ensemble(&mut self) -> anyhow::Result<Ensemble> {
        let mut ensemble = Ensemble::with_capacity(self.params.runs);
        self.run_ensemble(&mut ensemble)?;
        Ok(ensemble)
    }
}
