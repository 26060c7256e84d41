use log::{info, trace};
use percolation_common::{DensityTrajectory, TrajectorySink};
use std::time::{Duration, Instant};

const PRINT_INTERVAL: Duration = Duration::from_secs(5);

/// Logs ensemble progress: every run at trace level, a status line at most every
/// few seconds and always for the final run.
pub struct ProgressReporter {
    total_runs: usize,
    start_time: Instant,
    previous_print_time: Instant,
    print_interval: Duration,
}

impl ProgressReporter {
    pub fn new(total_runs: usize) -> Self {
        let now = Instant::now();
        Self {
            total_runs,
            start_time: now,
            previous_print_time: now,
            print_interval: PRINT_INTERVAL,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Whether run `run_index` (zero-based) deserves an info-level status line.
    fn should_print_status(&self, run_index: usize, now: Instant) -> bool {
        let is_last_run = run_index + 1 == self.total_runs;
        is_last_run || now.duration_since(self.previous_print_time) >= self.print_interval
    }
}

impl TrajectorySink for ProgressReporter {
    fn accept(&mut self, run_index: usize, trajectory: &DensityTrajectory) -> anyhow::Result<()> {
        trace!("Finished run {} / {}", run_index + 1, self.total_runs);
        let now = Instant::now();
        if self.should_print_status(run_index, now) {
            info!(
                "Run [{}/{}] | Final density: {:.4} | Elapsed: {:.2} s",
                run_index + 1,
                self.total_runs,
                trajectory.values().last().copied().unwrap_or(0.0),
                self.elapsed().as_secs_f64()
            );
            self.previous_print_time = now;
        }
        Ok(())
    }
}
